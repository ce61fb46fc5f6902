//! Operator access control.
//!
//! Gates the engine's actions by the role of the administrator driving a
//! session. These operator roles are distinct from the hotel roles being
//! cloned.
//!
//! # Operator roles
//!
//! | Role | Key Permissions |
//! |------|-----------------|
//! | `Administrator` | All permissions |
//! | `RoleManager` | Clone, batch clone, preview, lineage |
//! | `PropertyManager` | Clone, preview, lineage |
//! | `Auditor` | Lineage, view roles |
//! | `ReadOnly` | View roles |
//!
//! # Example
//!
//! ```rust
//! use roleforge::security::rbac::{AccessControl, EnginePermission, OperatorRole};
//!
//! let ac = AccessControl::new();
//! assert!(ac.has_permission(OperatorRole::RoleManager, EnginePermission::BatchCloneRole));
//! assert!(!ac.has_permission(OperatorRole::Auditor, EnginePermission::CloneRole));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Role of the administrator operating the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    /// Platform administrator.
    Administrator,
    /// Maintains the role catalogue.
    RoleManager,
    /// Manages roles for one property.
    PropertyManager,
    /// Reviews role history.
    Auditor,
    /// Browses roles only.
    ReadOnly,
}

impl OperatorRole {
    /// Returns all operator roles.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Administrator,
            Self::RoleManager,
            Self::PropertyManager,
            Self::Auditor,
            Self::ReadOnly,
        ]
    }

    /// Returns the display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::RoleManager => "Role Manager",
            Self::PropertyManager => "Property Manager",
            Self::Auditor => "Auditor",
            Self::ReadOnly => "Read-Only",
        }
    }

    /// Parses a role from a snake-case string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "administrator" | "admin" => Some(Self::Administrator),
            "role_manager" => Some(Self::RoleManager),
            "property_manager" => Some(Self::PropertyManager),
            "auditor" => Some(Self::Auditor),
            "read_only" | "readonly" => Some(Self::ReadOnly),
            _ => None,
        }
    }
}

/// Actions the engine gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePermission {
    /// Start and execute a single clone.
    CloneRole,
    /// Start and execute a batch clone.
    BatchCloneRole,
    /// Generate previews.
    PreviewClone,
    /// Read lineage trees.
    ViewLineage,
    /// Read role records.
    ViewRoles,
}

impl EnginePermission {
    /// Returns all permissions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CloneRole,
            Self::BatchCloneRole,
            Self::PreviewClone,
            Self::ViewLineage,
            Self::ViewRoles,
        ]
    }

    /// Returns the display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::CloneRole => "Clone Role",
            Self::BatchCloneRole => "Batch Clone Roles",
            Self::PreviewClone => "Preview Clone",
            Self::ViewLineage => "View Lineage",
            Self::ViewRoles => "View Roles",
        }
    }
}

/// Result of an access control check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    /// Access granted.
    Granted,
    /// Access denied with reason.
    Denied(String),
}

impl AccessResult {
    /// Returns true if access was granted.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Operator role to permission mapping.
#[derive(Debug, Clone)]
pub struct AccessControl {
    role_permissions: HashMap<OperatorRole, HashSet<EnginePermission>>,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessControl {
    /// Creates the default mapping.
    #[must_use]
    pub fn new() -> Self {
        use EnginePermission::{BatchCloneRole, CloneRole, PreviewClone, ViewLineage, ViewRoles};

        let mut role_permissions = HashMap::new();
        role_permissions.insert(
            OperatorRole::Administrator,
            EnginePermission::all().iter().copied().collect(),
        );
        role_permissions.insert(
            OperatorRole::RoleManager,
            [CloneRole, BatchCloneRole, PreviewClone, ViewLineage, ViewRoles]
                .into_iter()
                .collect(),
        );
        role_permissions.insert(
            OperatorRole::PropertyManager,
            [CloneRole, PreviewClone, ViewLineage, ViewRoles]
                .into_iter()
                .collect(),
        );
        role_permissions.insert(
            OperatorRole::Auditor,
            [ViewLineage, ViewRoles].into_iter().collect(),
        );
        role_permissions.insert(OperatorRole::ReadOnly, [ViewRoles].into_iter().collect());

        Self { role_permissions }
    }

    /// Checks if a role has a permission.
    #[must_use]
    pub fn has_permission(&self, role: OperatorRole, permission: EnginePermission) -> bool {
        self.role_permissions
            .get(&role)
            .is_some_and(|perms| perms.contains(&permission))
    }

    /// Checks access and returns a detailed result.
    #[must_use]
    pub fn check_access(&self, role: OperatorRole, permission: EnginePermission) -> AccessResult {
        if self.has_permission(role, permission) {
            AccessResult::Granted
        } else {
            AccessResult::Denied(format!(
                "Role '{}' does not have permission '{}'",
                role.display_name(),
                permission.display_name()
            ))
        }
    }

    /// Requires a permission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when access is denied.
    pub fn require(&self, role: OperatorRole, permission: EnginePermission) -> Result<()> {
        match self.check_access(role, permission) {
            AccessResult::Granted => Ok(()),
            AccessResult::Denied(reason) => {
                tracing::warn!(
                    operator_role = role.display_name(),
                    permission = permission.display_name(),
                    "Access denied"
                );
                Err(Error::Unauthorized(reason))
            },
        }
    }

    /// Grants a permission to a role.
    pub fn grant_permission(&mut self, role: OperatorRole, permission: EnginePermission) {
        self.role_permissions.entry(role).or_default().insert(permission);
    }

    /// Revokes a permission from a role.
    pub fn revoke_permission(&mut self, role: OperatorRole, permission: EnginePermission) {
        if let Some(perms) = self.role_permissions.get_mut(&role) {
            perms.remove(&permission);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_administrator_has_everything() {
        let ac = AccessControl::new();
        for permission in EnginePermission::all() {
            assert!(ac.has_permission(OperatorRole::Administrator, *permission));
        }
    }

    #[test_case(OperatorRole::RoleManager, true, true)]
    #[test_case(OperatorRole::PropertyManager, true, false)]
    #[test_case(OperatorRole::Auditor, false, false)]
    #[test_case(OperatorRole::ReadOnly, false, false)]
    fn test_clone_permissions(role: OperatorRole, clone: bool, batch: bool) {
        let ac = AccessControl::new();
        assert_eq!(ac.has_permission(role, EnginePermission::CloneRole), clone);
        assert_eq!(ac.has_permission(role, EnginePermission::BatchCloneRole), batch);
    }

    #[test]
    fn test_require_denied_is_unauthorized() {
        let ac = AccessControl::new();
        let err = ac
            .require(OperatorRole::Auditor, EnginePermission::CloneRole)
            .expect_err("should be denied");
        assert!(matches!(err, Error::Unauthorized(msg) if msg.contains("Auditor")));
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut ac = AccessControl::new();
        ac.grant_permission(OperatorRole::Auditor, EnginePermission::PreviewClone);
        assert!(ac.has_permission(OperatorRole::Auditor, EnginePermission::PreviewClone));
        ac.revoke_permission(OperatorRole::Auditor, EnginePermission::PreviewClone);
        assert!(!ac.has_permission(OperatorRole::Auditor, EnginePermission::PreviewClone));
    }

    #[test_case("role-manager", Some(OperatorRole::RoleManager))]
    #[test_case("ADMIN", Some(OperatorRole::Administrator))]
    #[test_case("night_auditor", None)]
    fn test_parse(input: &str, expected: Option<OperatorRole>) {
        assert_eq!(OperatorRole::parse(input), expected);
    }
}
