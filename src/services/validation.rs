//! Validation and conflict analysis for clone configurations.
//!
//! Every rule is evaluated; nothing short-circuits. `is_valid` is true iff there
//! are no error-severity issues and no conflicts.
//!
//! # Rules without the source role ([`CloneValidator::validate`])
//!
//! | Rule | Outcome |
//! |------|---------|
//! | blank name | error on `name` |
//! | name shorter than the minimum | error on `name` |
//! | name already in `existing_names` | naming conflict |
//! | blank description | suggestion |
//! | level below / above constraints | error on `level` per bound |
//! | partial clone with no selection | error on `permissions` |
//!
//! # Additional rules with the source role ([`CloneValidator::analyze`])
//!
//! | Rule | Outcome |
//! |------|---------|
//! | scope adjustment wider than the source scope | permission conflict |
//! | level above the source role's level | hierarchy conflict |
//! | empty result for a non-partial clone | warning on `permissions` |
//! | scope adjustment for a permission not in the result | warning on `scope_adjustments` |
//! | custom selection not on the source | warning on `custom_selections` |
//! | user assignments copied from a populated role | warning on `inheritance_rules` |
//! | level far from the estimate | warning on `level` + suggestion |

use crate::models::{
    CloneConfiguration, CloneConflict, CloneSuggestion, CloneType, CloneValidationResult,
    ConflictType, Permission, Role, RoleDuplicationContext, SuggestionKind, ValidationIssue,
};

/// Default minimum role name length, in characters.
pub const DEFAULT_MIN_NAME_LENGTH: usize = 3;

/// Distance from the estimate at which the level draws a warning.
pub const LEVEL_DRIFT_WARNING: u32 = 20;

/// Validates clone configurations.
#[derive(Debug, Clone, Copy)]
pub struct CloneValidator {
    min_name_length: usize,
}

impl Default for CloneValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_NAME_LENGTH)
    }
}

impl CloneValidator {
    /// Creates a validator.
    #[must_use]
    pub const fn new(min_name_length: usize) -> Self {
        Self { min_name_length }
    }

    /// Validates a configuration against the caller's context only.
    #[must_use]
    pub fn validate(
        &self,
        config: &CloneConfiguration,
        context: &RoleDuplicationContext,
    ) -> CloneValidationResult {
        let mut findings = Findings::default();
        self.check_configuration(config, context, &mut findings);
        findings.finish()
    }

    /// Validates a configuration with knowledge of the source role and the
    /// computed result.
    #[must_use]
    pub fn analyze(
        &self,
        source: &Role,
        config: &CloneConfiguration,
        resulting: &[Permission],
        estimated_level: u32,
        context: &RoleDuplicationContext,
    ) -> CloneValidationResult {
        let mut findings = Findings::default();
        self.check_configuration(config, context, &mut findings);
        check_permissions_against_source(source, config, resulting, &mut findings);
        check_hierarchy_against_source(source, config, estimated_level, &mut findings);
        findings.finish()
    }

    fn check_configuration(
        &self,
        config: &CloneConfiguration,
        context: &RoleDuplicationContext,
        findings: &mut Findings,
    ) {
        let name = config.new_metadata.name.trim();
        if name.is_empty() {
            findings.issue(ValidationIssue::error("name", "Role name is required"));
        } else if name.chars().count() < self.min_name_length {
            findings.issue(ValidationIssue::error(
                "name",
                format!(
                    "Role name must be at least {} characters",
                    self.min_name_length
                ),
            ));
        }

        if !name.is_empty() && context.name_taken(name) {
            findings.conflict(CloneConflict::new(
                ConflictType::Naming,
                format!("A role named '{name}' already exists"),
                "Choose a different name for the cloned role",
            ));
        }

        if config.new_metadata.description.trim().is_empty() {
            findings.suggest(CloneSuggestion {
                kind: SuggestionKind::Description,
                message: "Add a description so other administrators know what this role is for"
                    .to_string(),
                auto_applicable: false,
            });
        }

        let level = config.new_metadata.level;
        let bounds = context.hierarchy_constraints;
        if level < bounds.min_level {
            findings.issue(ValidationIssue::error(
                "level",
                format!("Level {level} is below the minimum of {}", bounds.min_level),
            ));
        }
        if level > bounds.max_level {
            findings.issue(ValidationIssue::error(
                "level",
                format!("Level {level} is above the maximum of {}", bounds.max_level),
            ));
        }

        if config.clone_type == CloneType::Partial
            && config.permission_filters.custom_selections.is_empty()
        {
            findings.issue(ValidationIssue::error(
                "permissions",
                "Select at least one permission for a partial clone",
            ));
        }
    }
}

fn check_permissions_against_source(
    source: &Role,
    config: &CloneConfiguration,
    resulting: &[Permission],
    findings: &mut Findings,
) {
    for (permission_id, new_scope) in &config.scope_adjustments {
        let Some(original) = source.permission(permission_id) else {
            findings.issue(ValidationIssue::warning(
                "scope_adjustments",
                format!("Scope adjustment for '{permission_id}' has no matching source permission"),
            ));
            continue;
        };
        if new_scope.is_wider_than(&original.scope) {
            findings.conflict(CloneConflict::new(
                ConflictType::Permission,
                format!(
                    "Adjustment widens {} from {} to {new_scope}",
                    original.key(),
                    original.scope
                ),
                format!("Keep {} at {} scope or narrower", original.key(), original.scope),
            ));
        }
        if !resulting.iter().any(|p| &p.id == permission_id) {
            findings.issue(ValidationIssue::warning(
                "scope_adjustments",
                format!(
                    "Scope adjustment for {} has no effect; the permission is filtered out",
                    original.key()
                ),
            ));
        }
    }

    if config.clone_type == CloneType::Partial {
        for selected in &config.permission_filters.custom_selections {
            if !source.has_permission(selected) {
                findings.issue(ValidationIssue::warning(
                    "custom_selections",
                    format!("Selected permission '{selected}' is not on the source role"),
                ));
            }
        }
    } else if resulting.is_empty() {
        findings.issue(ValidationIssue::warning(
            "permissions",
            "The cloned role will have no permissions",
        ));
    }

    if config.inheritance_rules.copy_user_assignments && source.user_count > 0 {
        findings.issue(ValidationIssue::warning(
            "inheritance_rules",
            format!(
                "{} user(s) assigned to '{}' will also be assigned to the clone",
                source.user_count, source.name
            ),
        ));
    }
}

fn check_hierarchy_against_source(
    source: &Role,
    config: &CloneConfiguration,
    estimated_level: u32,
    findings: &mut Findings,
) {
    let level = config.new_metadata.level;
    if level > source.level {
        findings.conflict(CloneConflict::new(
            ConflictType::Hierarchy,
            format!(
                "Level {level} would outrank the source role '{}' (level {})",
                source.name, source.level
            ),
            format!("Set the level to {} or lower", source.level),
        ));
    }

    if level.abs_diff(estimated_level) >= LEVEL_DRIFT_WARNING {
        findings.issue(ValidationIssue::warning(
            "level",
            format!("Level {level} is far from the estimated level {estimated_level}"),
        ));
        findings.suggest(CloneSuggestion {
            kind: SuggestionKind::Level,
            message: format!("Consider level {estimated_level} based on the resulting permissions"),
            auto_applicable: true,
        });
    }
}

#[derive(Default)]
struct Findings {
    issues: Vec<ValidationIssue>,
    suggestions: Vec<CloneSuggestion>,
    conflicts: Vec<CloneConflict>,
}

impl Findings {
    fn issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    fn suggest(&mut self, suggestion: CloneSuggestion) {
        self.suggestions.push(suggestion);
    }

    fn conflict(&mut self, conflict: CloneConflict) {
        self.conflicts.push(conflict);
    }

    fn finish(self) -> CloneValidationResult {
        CloneValidationResult::new(self.issues, self.suggestions, self.conflicts)
    }
}
