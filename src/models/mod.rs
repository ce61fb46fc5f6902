//! Data models for roleforge.
//!
//! This module contains the value types shared by the cloning engine, the
//! lineage tracker and the persistence contract.

mod batch;
mod clone_config;
mod context;
pub mod lineage;
mod permission;
mod preview;
mod recommendation;
mod role;
mod validation;

pub use batch::{
    BatchAdjustments, BatchType, BatchVariation, CloneBatchConfig, DEFAULT_NAME_PATTERN,
    SOURCE_NAME_PLACEHOLDER, VARIATION_PLACEHOLDER,
};
pub use clone_config::{
    CloneConfiguration, CloneConfigurationPatch, CloneType, InheritanceRules,
    InheritanceRulesPatch, PermissionFilters, PermissionFiltersPatch, RoleMetadata,
    RoleMetadataPatch,
};
pub use context::{HierarchyConstraints, RoleDuplicationContext};
pub use lineage::{CloneHistoryEntry, LineageSnapshot, RoleLineage};
pub use permission::{Permission, PermissionId, PermissionScope};
pub use preview::{ClonePreview, PermissionDiff, ScopeChange};
pub use recommendation::{RecommendedChange, SmartCloneRecommendation};
pub use role::{Role, RoleId};
pub use validation::{
    CloneConflict, CloneSuggestion, CloneValidationResult, ConflictAnalysis, ConflictType,
    IssueSeverity, SuggestionKind, ValidationIssue,
};
