//! Structured validation results.
//!
//! Validation failures are data, not errors: callers render field-level
//! feedback from a [`CloneValidationResult`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Blocks execution.
    Error,
    /// Informational; never blocks.
    Warning,
}

impl IssueSeverity {
    /// Returns the severity as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field-level validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Configuration field the issue refers to (`name`, `level`, `permissions`, ...).
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    /// Creates an error-severity issue.
    #[must_use]
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: IssueSeverity::Error,
        }
    }

    /// Creates a warning-severity issue.
    #[must_use]
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }

    /// Returns `true` for error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

/// Kind of non-blocking suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Add or improve the description.
    Description,
    /// Reconsider the level.
    Level,
    /// Reconsider the permission selection.
    Permissions,
}

/// A non-blocking improvement hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneSuggestion {
    /// Suggestion kind.
    pub kind: SuggestionKind,
    /// Message for the operator.
    pub message: String,
    /// Whether the engine could apply it without further input.
    pub auto_applicable: bool,
}

/// Kind of conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    /// Name collides with an existing role.
    Naming,
    /// Permission set contradicts the source.
    Permission,
    /// Level placement contradicts the role hierarchy.
    Hierarchy,
}

impl ConflictType {
    /// Returns the conflict type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Naming => "naming",
            Self::Permission => "permission",
            Self::Hierarchy => "hierarchy",
        }
    }
}

/// A conflict that blocks execution until resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneConflict {
    /// Conflict kind.
    pub kind: ConflictType,
    /// What is wrong.
    pub message: String,
    /// How to resolve it.
    pub resolution: String,
}

impl CloneConflict {
    /// Creates a conflict.
    #[must_use]
    pub fn new(
        kind: ConflictType,
        message: impl Into<String>,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            resolution: resolution.into(),
        }
    }
}

/// Conflicts grouped by kind, as shown in a preview.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    /// Naming conflicts.
    pub naming_conflicts: Vec<CloneConflict>,
    /// Permission conflicts.
    pub permission_conflicts: Vec<CloneConflict>,
    /// Hierarchy conflicts.
    pub hierarchy_conflicts: Vec<CloneConflict>,
}

impl ConflictAnalysis {
    /// Groups a flat conflict list by kind.
    #[must_use]
    pub fn from_conflicts(conflicts: &[CloneConflict]) -> Self {
        let mut analysis = Self::default();
        for conflict in conflicts {
            let bucket = match conflict.kind {
                ConflictType::Naming => &mut analysis.naming_conflicts,
                ConflictType::Permission => &mut analysis.permission_conflicts,
                ConflictType::Hierarchy => &mut analysis.hierarchy_conflicts,
            };
            bucket.push(conflict.clone());
        }
        analysis
    }

    /// Total number of conflicts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.naming_conflicts.len()
            + self.permission_conflicts.len()
            + self.hierarchy_conflicts.len()
    }

    /// Returns `true` when there are no conflicts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Outcome of validating a clone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloneValidationResult {
    /// `true` iff there are no error issues and no conflicts.
    pub is_valid: bool,
    /// Field-level errors and warnings.
    pub issues: Vec<ValidationIssue>,
    /// Non-blocking suggestions.
    pub suggestions: Vec<CloneSuggestion>,
    /// Blocking conflicts.
    pub conflicts: Vec<CloneConflict>,
}

impl CloneValidationResult {
    /// Builds a result, deriving `is_valid` from its parts.
    #[must_use]
    pub fn new(
        issues: Vec<ValidationIssue>,
        suggestions: Vec<CloneSuggestion>,
        conflicts: Vec<CloneConflict>,
    ) -> Self {
        let is_valid = conflicts.is_empty() && !issues.iter().any(ValidationIssue::is_error);
        Self {
            is_valid,
            issues,
            suggestions,
            conflicts,
        }
    }

    /// Error-severity issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Warning-severity issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Returns `true` if any error refers to `field`.
    #[must_use]
    pub fn has_error_on(&self, field: &str) -> bool {
        self.errors().any(|i| i.field == field)
    }

    /// Groups the conflicts by kind.
    #[must_use]
    pub fn conflict_analysis(&self) -> ConflictAnalysis {
        ConflictAnalysis::from_conflicts(&self.conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_block() {
        let result = CloneValidationResult::new(
            vec![ValidationIssue::warning("level", "far from estimate")],
            Vec::new(),
            Vec::new(),
        );
        assert!(result.is_valid);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_conflict_alone_blocks() {
        let result = CloneValidationResult::new(
            Vec::new(),
            Vec::new(),
            vec![CloneConflict::new(ConflictType::Naming, "taken", "rename")],
        );
        assert!(!result.is_valid);
        let analysis = result.conflict_analysis();
        assert_eq!(analysis.naming_conflicts.len(), 1);
        assert_eq!(analysis.total(), 1);
    }

    #[test]
    fn test_error_blocks_and_is_addressable_by_field() {
        let result = CloneValidationResult::new(
            vec![ValidationIssue::error("name", "required")],
            Vec::new(),
            Vec::new(),
        );
        assert!(!result.is_valid);
        assert!(result.has_error_on("name"));
        assert!(!result.has_error_on("level"));
    }
}
