//! Permission set algebra.
//!
//! Turns a source role's permissions plus a [`CloneConfiguration`] into the
//! permission list of the role being created. Pure and deterministic.
//!
//! # Pipeline
//!
//! 1. Start from every source permission.
//! 2. Structural filter chosen by [`CloneType`]:
//!    - `full` / `permissions`: none
//!    - `template`: the configured [`TemplateFilter`] (identity by default)
//!    - `partial`: exactly the `custom_selections`
//!    - `hierarchy`: drop `platform` scope below level 70 and `organization`
//!      scope below level 50
//! 3. Category filters on `resource` (exclude first, then include), then scope
//!    filters (exclude first, then include).
//! 4. Scope adjustments replace the scope of matching permissions.
//!
//! The result never contains a permission ID that is not on the source.

use crate::models::{CloneConfiguration, CloneType, Permission, PermissionScope};
use std::collections::HashSet;
use std::sync::Arc;

/// Minimum target level that keeps `platform`-scope permissions in a hierarchy clone.
pub const PLATFORM_SCOPE_MIN_LEVEL: u32 = 70;

/// Minimum target level that keeps `organization`-scope permissions in a hierarchy clone.
pub const ORGANIZATION_SCOPE_MIN_LEVEL: u32 = 50;

/// Structural filter used by template clones.
///
/// Implementations may only drop permissions; anything they return that is not
/// on the source is discarded by [`PermissionSetCalculator`].
pub trait TemplateFilter: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Filters the source permissions for a template clone.
    fn apply(&self, permissions: Vec<Permission>, config: &CloneConfiguration) -> Vec<Permission>;
}

/// Template filter that keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTemplate;

impl TemplateFilter for IdentityTemplate {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&self, permissions: Vec<Permission>, _config: &CloneConfiguration) -> Vec<Permission> {
        permissions
    }
}

/// Computes resulting permission lists.
#[derive(Clone)]
pub struct PermissionSetCalculator {
    template: Arc<dyn TemplateFilter>,
}

impl Default for PermissionSetCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PermissionSetCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionSetCalculator")
            .field("template", &self.template.name())
            .finish()
    }
}

impl PermissionSetCalculator {
    /// Creates a calculator with the identity template filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            template: Arc::new(IdentityTemplate),
        }
    }

    /// Replaces the template filter.
    #[must_use]
    pub fn with_template(mut self, template: Arc<dyn TemplateFilter>) -> Self {
        self.template = template;
        self
    }

    /// Runs the full pipeline.
    #[must_use]
    pub fn resulting_permissions(
        &self,
        source: &[Permission],
        config: &CloneConfiguration,
    ) -> Vec<Permission> {
        let structural = self.structural_filter(source, config);
        let filtered = apply_category_and_scope_filters(structural, config);
        apply_scope_adjustments(filtered, config)
    }

    /// Applies only the clone-type filter (step 2).
    #[must_use]
    pub fn structural_filter(
        &self,
        source: &[Permission],
        config: &CloneConfiguration,
    ) -> Vec<Permission> {
        let all = source.to_vec();
        match config.clone_type {
            CloneType::Full | CloneType::Permissions => all,
            CloneType::Template => {
                let source_ids: HashSet<_> = source.iter().map(|p| &p.id).collect();
                let filtered = self.template.apply(all, config);
                let before = filtered.len();
                let kept: Vec<Permission> = filtered
                    .into_iter()
                    .filter(|p| source_ids.contains(&p.id))
                    .collect();
                if kept.len() != before {
                    tracing::warn!(
                        template = self.template.name(),
                        dropped = before - kept.len(),
                        "Template filter returned permissions not on the source"
                    );
                }
                kept
            },
            CloneType::Partial => {
                let selected: HashSet<_> =
                    config.permission_filters.custom_selections.iter().collect();
                all.into_iter().filter(|p| selected.contains(&p.id)).collect()
            },
            CloneType::Hierarchy => {
                let level = config.new_metadata.level;
                all.into_iter()
                    .filter(|p| scope_allowed_at_level(p.scope, level))
                    .collect()
            },
        }
    }
}

/// Returns `true` if a permission of `scope` may be kept by a hierarchy clone at `level`.
#[must_use]
pub const fn scope_allowed_at_level(scope: PermissionScope, level: u32) -> bool {
    match scope {
        PermissionScope::Platform => level >= PLATFORM_SCOPE_MIN_LEVEL,
        PermissionScope::Organization => level >= ORGANIZATION_SCOPE_MIN_LEVEL,
        _ => true,
    }
}

fn apply_category_and_scope_filters(
    permissions: Vec<Permission>,
    config: &CloneConfiguration,
) -> Vec<Permission> {
    let filters = &config.permission_filters;
    permissions
        .into_iter()
        .filter(|p| !filters.exclude_categories.contains(&p.resource))
        .filter(|p| {
            filters.include_categories.is_empty()
                || filters.include_categories.contains(&p.resource)
        })
        .filter(|p| !filters.exclude_scopes.contains(&p.scope))
        .filter(|p| filters.include_scopes.is_empty() || filters.include_scopes.contains(&p.scope))
        .collect()
}

fn apply_scope_adjustments(
    permissions: Vec<Permission>,
    config: &CloneConfiguration,
) -> Vec<Permission> {
    permissions
        .into_iter()
        .map(|p| match config.scope_adjustments.get(&p.id) {
            Some(scope) => p.with_scope(*scope),
            None => p,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CloneConfigurationPatch, PermissionId, Role};
    use std::collections::BTreeMap;

    fn source_role() -> Role {
        Role::new("gm", "General Manager", 80).with_permissions(vec![
            Permission::new("p1", "user", "read", PermissionScope::Property),
            Permission::new("p2", "user", "write", PermissionScope::Platform),
            Permission::new("p3", "billing", "refund", PermissionScope::Organization),
            Permission::new("p4", "housekeeping", "assign", PermissionScope::Department),
            Permission::new("p5", "profile", "edit", PermissionScope::Own),
        ])
    }

    fn config(patch: CloneConfigurationPatch) -> CloneConfiguration {
        CloneConfiguration::for_source(&source_role()).merged(patch)
    }

    fn ids(permissions: &[Permission]) -> Vec<&str> {
        permissions.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_full_clone_keeps_everything() {
        let role = source_role();
        let result = PermissionSetCalculator::new().resulting_permissions(
            &role.permissions,
            &config(CloneConfigurationPatch::default()),
        );
        assert_eq!(result, role.permissions);
    }

    #[test]
    fn test_permissions_clone_behaves_like_full() {
        let role = source_role();
        let result = PermissionSetCalculator::new().resulting_permissions(
            &role.permissions,
            &config(CloneConfigurationPatch::clone_type(CloneType::Permissions)),
        );
        assert_eq!(result, role.permissions);
    }

    #[test]
    fn test_unrecognised_clone_type_uses_full_behavior() {
        let role = source_role();
        let patch = CloneConfigurationPatch::clone_type(CloneType::parse("mirror"));
        let result =
            PermissionSetCalculator::new().resulting_permissions(&role.permissions, &config(patch));
        assert_eq!(result.len(), role.permissions.len());
    }

    #[test]
    fn test_partial_keeps_only_selected() {
        let role = source_role();
        let patch = CloneConfigurationPatch {
            clone_type: Some(CloneType::Partial),
            ..CloneConfigurationPatch::custom_selections(vec![
                PermissionId::new("p4"),
                PermissionId::new("p1"),
                PermissionId::new("not-on-source"),
            ])
        };
        let result =
            PermissionSetCalculator::new().resulting_permissions(&role.permissions, &config(patch));
        assert_eq!(ids(&result), vec!["p1", "p4"]);
    }

    #[test]
    fn test_partial_with_no_selection_is_empty() {
        let role = source_role();
        let result = PermissionSetCalculator::new().resulting_permissions(
            &role.permissions,
            &config(CloneConfigurationPatch::clone_type(CloneType::Partial)),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_hierarchy_thresholds() {
        let role = source_role();
        let calc = PermissionSetCalculator::new();
        let at = |level: u32| {
            let patch = CloneConfigurationPatch {
                clone_type: Some(CloneType::Hierarchy),
                ..CloneConfigurationPatch::level(level)
            };
            calc.resulting_permissions(&role.permissions, &config(patch))
        };

        assert_eq!(ids(&at(40)), vec!["p1", "p4", "p5"]);
        assert_eq!(ids(&at(50)), vec!["p1", "p3", "p4", "p5"]);
        assert_eq!(ids(&at(69)), vec!["p1", "p3", "p4", "p5"]);
        assert_eq!(ids(&at(70)).len(), 5);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let role = source_role();
        let patch = CloneConfigurationPatch {
            permission_filters: Some(crate::models::PermissionFiltersPatch {
                include_categories: Some(vec!["user".to_string(), "billing".to_string()]),
                exclude_categories: Some(vec!["billing".to_string()]),
                ..Default::default()
            }),
            ..CloneConfigurationPatch::default()
        };
        let result =
            PermissionSetCalculator::new().resulting_permissions(&role.permissions, &config(patch));
        assert_eq!(ids(&result), vec!["p1", "p2"]);
    }

    #[test]
    fn test_scope_filters() {
        let role = source_role();
        let patch = CloneConfigurationPatch {
            permission_filters: Some(crate::models::PermissionFiltersPatch {
                exclude_scopes: Some(vec![PermissionScope::Platform]),
                include_scopes: Some(vec![PermissionScope::Platform, PermissionScope::Own]),
                ..Default::default()
            }),
            ..CloneConfigurationPatch::default()
        };
        let result =
            PermissionSetCalculator::new().resulting_permissions(&role.permissions, &config(patch));
        assert_eq!(ids(&result), vec!["p5"]);
    }

    #[test]
    fn test_scope_adjustments_change_scope_not_identity() {
        let role = source_role();
        let mut adjustments = BTreeMap::new();
        adjustments.insert(PermissionId::new("p2"), PermissionScope::Property);
        adjustments.insert(PermissionId::new("missing"), PermissionScope::Own);
        let patch = CloneConfigurationPatch {
            scope_adjustments: Some(adjustments),
            ..CloneConfigurationPatch::default()
        };
        let result =
            PermissionSetCalculator::new().resulting_permissions(&role.permissions, &config(patch));
        assert_eq!(result.len(), 5);
        assert_eq!(result[1].id, PermissionId::new("p2"));
        assert_eq!(result[1].scope, PermissionScope::Property);
        assert_eq!(result[0].scope, PermissionScope::Property);
    }

    struct InventingTemplate;

    impl TemplateFilter for InventingTemplate {
        fn name(&self) -> &'static str {
            "inventing"
        }

        fn apply(
            &self,
            mut permissions: Vec<Permission>,
            _config: &CloneConfiguration,
        ) -> Vec<Permission> {
            permissions.retain(|p| p.scope != PermissionScope::Platform);
            permissions.push(Permission::new("bogus", "spa", "book", PermissionScope::Own));
            permissions
        }
    }

    #[test]
    fn test_template_filter_cannot_invent_permissions() {
        let role = source_role();
        let calc = PermissionSetCalculator::new().with_template(Arc::new(InventingTemplate));
        let result = calc.resulting_permissions(
            &role.permissions,
            &config(CloneConfigurationPatch::clone_type(CloneType::Template)),
        );
        assert_eq!(ids(&result), vec!["p1", "p3", "p4", "p5"]);
    }

    #[test]
    fn test_default_template_is_identity() {
        let role = source_role();
        let result = PermissionSetCalculator::default().resulting_permissions(
            &role.permissions,
            &config(CloneConfigurationPatch::clone_type(CloneType::Template)),
        );
        assert_eq!(result, role.permissions);
    }
}
