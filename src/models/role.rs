//! Role records as read from the persistence service.

use super::permission::{Permission, PermissionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a new role ID from the given string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random role ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("role_{}", uuid::Uuid::now_v7().simple()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A role owned by the persistence service.
///
/// Higher `level` means more privilege throughout this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Privilege rank.
    pub level: u32,
    /// Granted permissions; order carries no meaning.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Number of users currently assigned to the role.
    #[serde(default)]
    pub user_count: u32,
}

impl Role {
    /// Creates a role with no permissions and no users.
    #[must_use]
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            level,
            permissions: Vec::new(),
            user_count: 0,
        }
    }

    /// Sets the permission list.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the assigned user count.
    #[must_use]
    pub const fn with_user_count(mut self, user_count: u32) -> Self {
        self.user_count = user_count;
        self
    }

    /// Looks up a permission on this role by ID.
    #[must_use]
    pub fn permission(&self, id: &PermissionId) -> Option<&Permission> {
        self.permissions.iter().find(|p| &p.id == id)
    }

    /// Returns `true` if the role carries the permission ID.
    #[must_use]
    pub fn has_permission(&self, id: &PermissionId) -> bool {
        self.permission(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PermissionScope;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RoleId::generate();
        let b = RoleId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("role_"));
    }

    #[test]
    fn test_permission_lookup() {
        let role = Role::new("r1", "Front Desk", 30).with_permissions(vec![Permission::new(
            "p1",
            "reservation",
            "read",
            PermissionScope::Property,
        )]);
        assert!(role.has_permission(&PermissionId::new("p1")));
        assert!(!role.has_permission(&PermissionId::new("p2")));
    }

    #[test]
    fn test_role_deserializes_with_defaults() {
        let json = r#"{"id":"r1","name":"Housekeeping","level":20}"#;
        let role: Role = serde_json::from_str(json).expect("role should parse");
        assert!(role.permissions.is_empty());
        assert_eq!(role.user_count, 0);
        assert!(role.description.is_empty());
    }
}
