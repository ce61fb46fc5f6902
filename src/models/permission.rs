//! Permission values and their scope vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a permission record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(String);

impl PermissionId {
    /// Creates a new permission ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PermissionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PermissionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Breadth at which a permission applies.
///
/// Ordered narrowest to widest: `Own < Department < Property < Organization < Platform`.
/// `Unknown` covers scope strings outside the vocabulary and has no rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    /// Whole platform (all organizations).
    Platform,
    /// One hotel group / organization.
    Organization,
    /// One property (hotel).
    Property,
    /// One department inside a property.
    Department,
    /// Only records owned by the user.
    Own,
    /// Scope value outside the known vocabulary.
    #[serde(other)]
    Unknown,
}

impl PermissionScope {
    /// Returns all known scopes, widest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Platform,
            Self::Organization,
            Self::Property,
            Self::Department,
            Self::Own,
        ]
    }

    /// Returns the scope as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Organization => "organization",
            Self::Property => "property",
            Self::Department => "department",
            Self::Own => "own",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a scope, mapping anything unrecognised to `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "platform" => Self::Platform,
            "organization" | "organisation" => Self::Organization,
            "property" => Self::Property,
            "department" => Self::Department,
            "own" => Self::Own,
            _ => Self::Unknown,
        }
    }

    /// Breadth rank, `None` for `Unknown`.
    #[must_use]
    pub const fn rank(&self) -> Option<u8> {
        match self {
            Self::Own => Some(0),
            Self::Department => Some(1),
            Self::Property => Some(2),
            Self::Organization => Some(3),
            Self::Platform => Some(4),
            Self::Unknown => None,
        }
    }

    /// Returns `true` if `self` is strictly wider than `other`.
    ///
    /// Comparisons involving `Unknown` are never considered wider.
    #[must_use]
    pub fn is_wider_than(&self, other: &Self) -> bool {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single grant of `action` on `resource` at a given scope.
///
/// Immutable from the engine's point of view; scope adjustments produce a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission identifier.
    pub id: PermissionId,
    /// Resource (also used as the permission category).
    pub resource: String,
    /// Action on the resource (`read`, `write`, ...).
    pub action: String,
    /// Breadth of the grant.
    pub scope: PermissionScope,
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Permission {
    /// Creates a permission without a description.
    #[must_use]
    pub fn new(
        id: impl Into<PermissionId>,
        resource: impl Into<String>,
        action: impl Into<String>,
        scope: PermissionScope,
    ) -> Self {
        Self {
            id: id.into(),
            resource: resource.into(),
            action: action.into(),
            scope,
            description: None,
        }
    }

    /// Returns a copy of this permission with a different scope.
    #[must_use]
    pub fn with_scope(&self, scope: PermissionScope) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    /// `resource:action` key used in messages.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }
}
