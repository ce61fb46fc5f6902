//! Clone configuration: the mutable working state of one clone session.
//!
//! A [`CloneConfiguration`] is created when a session starts, mutated through
//! [`CloneConfigurationPatch`] deep merges, and read when a preview is built.

use super::permission::{PermissionId, PermissionScope};
use super::role::{Role, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which structural filter the permission algebra applies.
///
/// Parsing is lenient: unrecognised strings become [`CloneType::Full`], so a
/// configuration coming from an older client never fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CloneType {
    /// Copy every permission.
    #[default]
    Full,
    /// Copy the permission set only (no structural filter).
    Permissions,
    /// Start from a template filter.
    Template,
    /// Copy exactly the custom-selected permissions.
    Partial,
    /// Drop scopes the target level does not justify.
    Hierarchy,
}

impl CloneType {
    /// Returns all clone types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Full,
            Self::Permissions,
            Self::Template,
            Self::Partial,
            Self::Hierarchy,
        ]
    }

    /// Returns the clone type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Permissions => "permissions",
            Self::Template => "template",
            Self::Partial => "partial",
            Self::Hierarchy => "hierarchy",
        }
    }

    /// Parses a clone type; unknown values fall back to `Full`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "permissions" => Self::Permissions,
            "template" => Self::Template,
            "partial" => Self::Partial,
            "hierarchy" => Self::Hierarchy,
            _ => Self::Full,
        }
    }
}

impl fmt::Display for CloneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for CloneType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<CloneType> for String {
    fn from(t: CloneType) -> Self {
        t.as_str().to_string()
    }
}

impl std::str::FromStr for CloneType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Name, description and level of the role being created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleMetadata {
    /// Proposed role name.
    pub name: String,
    /// Proposed description.
    #[serde(default)]
    pub description: String,
    /// Proposed privilege level.
    pub level: u32,
    /// Optional category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Category, scope and explicit-selection filters.
///
/// Categories are matched against [`Permission::resource`](super::Permission).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionFilters {
    /// Keep only these resources when non-empty.
    pub include_categories: Vec<String>,
    /// Drop these resources.
    pub exclude_categories: Vec<String>,
    /// Keep only these scopes when non-empty.
    pub include_scopes: Vec<PermissionScope>,
    /// Drop these scopes.
    pub exclude_scopes: Vec<PermissionScope>,
    /// Explicit permission IDs for partial clones.
    pub custom_selections: Vec<PermissionId>,
}

/// What the new role inherits besides permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InheritanceRules {
    /// Copy the source role's user assignments.
    pub copy_user_assignments: bool,
    /// Let the directory lower a level above the source role's to the source
    /// level on commit.
    pub adjust_level: bool,
    /// Emit level recommendations from the estimator.
    pub auto_suggest_level: bool,
}

impl Default for InheritanceRules {
    fn default() -> Self {
        Self {
            copy_user_assignments: false,
            adjust_level: true,
            auto_suggest_level: true,
        }
    }
}

/// Full configuration of one clone operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneConfiguration {
    /// Role being cloned.
    pub source_role_id: RoleId,
    /// Structural filter selector.
    #[serde(default)]
    pub clone_type: CloneType,
    /// Metadata of the role being created.
    pub new_metadata: RoleMetadata,
    /// Filters applied after the structural filter.
    #[serde(default)]
    pub permission_filters: PermissionFilters,
    /// Per-permission scope overrides.
    #[serde(default)]
    pub scope_adjustments: BTreeMap<PermissionId, PermissionScope>,
    /// Record a lineage edge from the source to the new role.
    #[serde(default = "default_preserve_lineage")]
    pub preserve_lineage: bool,
    /// Inheritance switches.
    #[serde(default)]
    pub inheritance_rules: InheritanceRules,
}

const fn default_preserve_lineage() -> bool {
    true
}

impl CloneConfiguration {
    /// Creates the default configuration for cloning `source`.
    ///
    /// The name starts empty so that a name recommendation is produced, and the
    /// level starts at the source's level.
    #[must_use]
    pub fn for_source(source: &Role) -> Self {
        Self {
            source_role_id: source.id.clone(),
            clone_type: CloneType::Full,
            new_metadata: RoleMetadata {
                name: String::new(),
                description: source.description.clone(),
                level: source.level,
                category: None,
                tags: Vec::new(),
            },
            permission_filters: PermissionFilters::default(),
            scope_adjustments: BTreeMap::new(),
            preserve_lineage: true,
            inheritance_rules: InheritanceRules::default(),
        }
    }

    /// Deep-merges a patch into this configuration.
    ///
    /// Nested `new_metadata`, `permission_filters` and `inheritance_rules` are
    /// merged field by field; `scope_adjustments` is replaced when present.
    pub fn apply(&mut self, patch: CloneConfigurationPatch) {
        if let Some(clone_type) = patch.clone_type {
            self.clone_type = clone_type;
        }
        if let Some(metadata) = patch.new_metadata {
            metadata.merge_into(&mut self.new_metadata);
        }
        if let Some(filters) = patch.permission_filters {
            filters.merge_into(&mut self.permission_filters);
        }
        if let Some(adjustments) = patch.scope_adjustments {
            self.scope_adjustments = adjustments;
        }
        if let Some(preserve) = patch.preserve_lineage {
            self.preserve_lineage = preserve;
        }
        if let Some(rules) = patch.inheritance_rules {
            rules.merge_into(&mut self.inheritance_rules);
        }
    }

    /// Returns a copy with `patch` applied.
    #[must_use]
    pub fn merged(&self, patch: CloneConfigurationPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// Partial update of [`RoleMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMetadataPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New level.
    pub level: Option<u32>,
    /// New category.
    pub category: Option<String>,
    /// New tags.
    pub tags: Option<Vec<String>>,
}

impl RoleMetadataPatch {
    fn merge_into(self, target: &mut RoleMetadata) {
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(description) = self.description {
            target.description = description;
        }
        if let Some(level) = self.level {
            target.level = level;
        }
        if let Some(category) = self.category {
            target.category = Some(category);
        }
        if let Some(tags) = self.tags {
            target.tags = tags;
        }
    }
}

/// Partial update of [`PermissionFilters`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionFiltersPatch {
    /// New include list.
    pub include_categories: Option<Vec<String>>,
    /// New exclude list.
    pub exclude_categories: Option<Vec<String>>,
    /// New scope include list.
    pub include_scopes: Option<Vec<PermissionScope>>,
    /// New scope exclude list.
    pub exclude_scopes: Option<Vec<PermissionScope>>,
    /// New explicit selection.
    pub custom_selections: Option<Vec<PermissionId>>,
}

impl PermissionFiltersPatch {
    fn merge_into(self, target: &mut PermissionFilters) {
        if let Some(v) = self.include_categories {
            target.include_categories = v;
        }
        if let Some(v) = self.exclude_categories {
            target.exclude_categories = v;
        }
        if let Some(v) = self.include_scopes {
            target.include_scopes = v;
        }
        if let Some(v) = self.exclude_scopes {
            target.exclude_scopes = v;
        }
        if let Some(v) = self.custom_selections {
            target.custom_selections = v;
        }
    }
}

/// Partial update of [`InheritanceRules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InheritanceRulesPatch {
    /// New `copy_user_assignments`.
    pub copy_user_assignments: Option<bool>,
    /// New `adjust_level`.
    pub adjust_level: Option<bool>,
    /// New `auto_suggest_level`.
    pub auto_suggest_level: Option<bool>,
}

impl InheritanceRulesPatch {
    fn merge_into(self, target: &mut InheritanceRules) {
        if let Some(v) = self.copy_user_assignments {
            target.copy_user_assignments = v;
        }
        if let Some(v) = self.adjust_level {
            target.adjust_level = v;
        }
        if let Some(v) = self.auto_suggest_level {
            target.auto_suggest_level = v;
        }
    }
}

/// Partial update of a [`CloneConfiguration`].
///
/// `source_role_id` is deliberately absent: a session never retargets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfigurationPatch {
    /// New clone type.
    pub clone_type: Option<CloneType>,
    /// Metadata changes.
    pub new_metadata: Option<RoleMetadataPatch>,
    /// Filter changes.
    pub permission_filters: Option<PermissionFiltersPatch>,
    /// Replacement scope adjustments.
    pub scope_adjustments: Option<BTreeMap<PermissionId, PermissionScope>>,
    /// New lineage flag.
    pub preserve_lineage: Option<bool>,
    /// Inheritance changes.
    pub inheritance_rules: Option<InheritanceRulesPatch>,
}

impl CloneConfigurationPatch {
    /// Patch that only sets the clone type.
    #[must_use]
    pub fn clone_type(clone_type: CloneType) -> Self {
        Self {
            clone_type: Some(clone_type),
            ..Self::default()
        }
    }

    /// Patch that only sets the name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            new_metadata: Some(RoleMetadataPatch {
                name: Some(name.into()),
                ..RoleMetadataPatch::default()
            }),
            ..Self::default()
        }
    }

    /// Patch that only sets the level.
    #[must_use]
    pub fn level(level: u32) -> Self {
        Self {
            new_metadata: Some(RoleMetadataPatch {
                level: Some(level),
                ..RoleMetadataPatch::default()
            }),
            ..Self::default()
        }
    }

    /// Patch that only sets the custom selection list.
    #[must_use]
    pub fn custom_selections(ids: Vec<PermissionId>) -> Self {
        Self {
            permission_filters: Some(PermissionFiltersPatch {
                custom_selections: Some(ids),
                ..PermissionFiltersPatch::default()
            }),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn source() -> Role {
        Role::new("r1", "Night Auditor", 40).with_description("Runs the night audit")
    }

    #[test_case("full", CloneType::Full)]
    #[test_case("PERMISSIONS", CloneType::Permissions)]
    #[test_case("template", CloneType::Template)]
    #[test_case("partial", CloneType::Partial)]
    #[test_case("hierarchy", CloneType::Hierarchy)]
    #[test_case("mirror", CloneType::Full ; "unknown falls back to full")]
    #[test_case("", CloneType::Full ; "empty falls back to full")]
    fn test_clone_type_parse(input: &str, expected: CloneType) {
        assert_eq!(CloneType::parse(input), expected);
    }

    #[test]
    fn test_unknown_clone_type_deserializes_as_full() {
        let parsed: CloneType = serde_json::from_str("\"mirror\"").expect("should parse");
        assert_eq!(parsed, CloneType::Full);
        let encoded = serde_json::to_string(&CloneType::Hierarchy).expect("should encode");
        assert_eq!(encoded, "\"hierarchy\"");
    }

    #[test]
    fn test_defaults_from_source() {
        let config = CloneConfiguration::for_source(&source());
        assert_eq!(config.source_role_id, RoleId::new("r1"));
        assert!(config.new_metadata.name.is_empty());
        assert_eq!(config.new_metadata.level, 40);
        assert_eq!(config.new_metadata.description, "Runs the night audit");
        assert!(config.preserve_lineage);
        assert!(config.inheritance_rules.auto_suggest_level);
    }

    #[test]
    fn test_nested_patch_merges_field_by_field() {
        let mut config = CloneConfiguration::for_source(&source());
        config.apply(CloneConfigurationPatch {
            new_metadata: Some(RoleMetadataPatch {
                category: Some("finance".to_string()),
                ..RoleMetadataPatch::default()
            }),
            permission_filters: Some(PermissionFiltersPatch {
                exclude_categories: Some(vec!["billing".to_string()]),
                ..PermissionFiltersPatch::default()
            }),
            ..CloneConfigurationPatch::default()
        });
        config.apply(CloneConfigurationPatch::name("Night Auditor II"));

        assert_eq!(config.new_metadata.name, "Night Auditor II");
        assert_eq!(config.new_metadata.category.as_deref(), Some("finance"));
        assert_eq!(config.new_metadata.level, 40);
        assert_eq!(config.permission_filters.exclude_categories, vec!["billing"]);
    }

    #[test]
    fn test_inheritance_patch_keeps_untouched_flags() {
        let mut config = CloneConfiguration::for_source(&source());
        config.apply(CloneConfigurationPatch {
            inheritance_rules: Some(InheritanceRulesPatch {
                copy_user_assignments: Some(true),
                ..InheritanceRulesPatch::default()
            }),
            ..CloneConfigurationPatch::default()
        });
        assert!(config.inheritance_rules.copy_user_assignments);
        assert!(config.inheritance_rules.adjust_level);
        assert!(config.inheritance_rules.auto_suggest_level);
    }

    #[test]
    fn test_scope_adjustments_replaced_wholesale() {
        let mut config = CloneConfiguration::for_source(&source());
        let mut first = BTreeMap::new();
        first.insert(PermissionId::new("p1"), PermissionScope::Own);
        first.insert(PermissionId::new("p2"), PermissionScope::Own);
        config.apply(CloneConfigurationPatch {
            scope_adjustments: Some(first),
            ..CloneConfigurationPatch::default()
        });

        let mut second = BTreeMap::new();
        second.insert(PermissionId::new("p3"), PermissionScope::Department);
        let merged = config.merged(CloneConfigurationPatch {
            scope_adjustments: Some(second),
            ..CloneConfigurationPatch::default()
        });

        assert_eq!(merged.scope_adjustments.len(), 1);
        assert_eq!(config.scope_adjustments.len(), 2);
    }
}
