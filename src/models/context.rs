//! Caller-supplied context for duplication checks.

use serde::{Deserialize, Serialize};

/// Inclusive level bounds a new role must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConstraints {
    /// Lowest allowed level.
    pub min_level: u32,
    /// Highest allowed level.
    pub max_level: u32,
}

impl Default for HierarchyConstraints {
    fn default() -> Self {
        Self {
            min_level: 10,
            max_level: 100,
        }
    }
}

impl HierarchyConstraints {
    /// Creates constraints.
    #[must_use]
    pub const fn new(min_level: u32, max_level: u32) -> Self {
        Self {
            min_level,
            max_level,
        }
    }
}

/// Read-only context the caller provides for validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleDuplicationContext {
    /// Names already in use.
    #[serde(default)]
    pub existing_names: Vec<String>,
    /// Allowed level range.
    #[serde(default)]
    pub hierarchy_constraints: HierarchyConstraints,
}

impl RoleDuplicationContext {
    /// Creates a context with the given names and default constraints.
    #[must_use]
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            existing_names: names.into_iter().map(Into::into).collect(),
            hierarchy_constraints: HierarchyConstraints::default(),
        }
    }

    /// Returns `true` if `name` is already taken.
    #[must_use]
    pub fn name_taken(&self, name: &str) -> bool {
        let name = name.trim();
        self.existing_names.iter().any(|existing| existing.trim() == name)
    }
}
