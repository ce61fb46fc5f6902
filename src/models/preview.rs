//! Read-only preview of a proposed clone.

use super::clone_config::CloneConfiguration;
use super::permission::{Permission, PermissionId, PermissionScope};
use super::role::Role;
use super::validation::{CloneSuggestion, ConflictAnalysis, ValidationIssue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A permission whose scope was overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeChange {
    /// Permission ID.
    pub permission_id: PermissionId,
    /// Scope on the source role.
    pub original_scope: PermissionScope,
    /// Scope on the new role.
    pub new_scope: PermissionScope,
}

/// Snapshot combining the source, the configuration and everything derived from them.
///
/// Previews are replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClonePreview {
    /// Session that produced this preview.
    pub session_id: Uuid,
    /// Source role as fetched for this preview.
    pub source_role: Role,
    /// Configuration snapshot at request time.
    pub configuration: CloneConfiguration,
    /// Final permission list.
    pub resulting_permissions: Vec<Permission>,
    /// Permissions in the result that are not on the source.
    pub added_permissions: Vec<Permission>,
    /// Source permissions absent from the result.
    pub removed_permissions: Vec<Permission>,
    /// Scope overrides that took effect.
    pub modified_permissions: Vec<ScopeChange>,
    /// Blocking field errors.
    pub validation_errors: Vec<ValidationIssue>,
    /// Non-blocking field warnings.
    pub validation_warnings: Vec<ValidationIssue>,
    /// Improvement hints.
    pub suggested_improvements: Vec<CloneSuggestion>,
    /// Estimated level in `[10, 100]`.
    pub estimated_level: u32,
    /// Conflicts grouped by kind.
    pub conflict_analysis: ConflictAnalysis,
}

impl ClonePreview {
    /// Returns `true` when the preview shows nothing blocking.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.validation_errors.is_empty() && self.conflict_analysis.is_empty()
    }
}

/// Difference between a source permission list and a result list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionDiff {
    /// In result, not on source.
    pub added: Vec<Permission>,
    /// On source, not in result.
    pub removed: Vec<Permission>,
    /// In both, with a different scope.
    pub modified: Vec<ScopeChange>,
}

impl PermissionDiff {
    /// Compares `source` and `result` by permission identity.
    #[must_use]
    pub fn between(source: &[Permission], result: &[Permission]) -> Self {
        let added = result
            .iter()
            .filter(|r| !source.iter().any(|s| s.id == r.id))
            .cloned()
            .collect();
        let removed = source
            .iter()
            .filter(|s| !result.iter().any(|r| r.id == s.id))
            .cloned()
            .collect();
        let modified = result
            .iter()
            .filter_map(|r| {
                source
                    .iter()
                    .find(|s| s.id == r.id && s.scope != r.scope)
                    .map(|s| ScopeChange {
                        permission_id: r.id.clone(),
                        original_scope: s.scope,
                        new_scope: r.scope,
                    })
            })
            .collect();
        Self {
            added,
            removed,
            modified,
        }
    }
}
