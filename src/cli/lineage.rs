//! Lineage CLI command.

use crate::config::EngineConfig;
use crate::models::{CloneHistoryEntry, RoleId, RoleLineage};
use crate::services::LineageTracker;
use crate::storage::InMemoryRoleDirectory;
use crate::Result;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Output of the `lineage` command.
#[derive(Debug, Serialize)]
pub struct LineageReport {
    /// Requested role.
    pub role_id: RoleId,
    /// Hops from the original role.
    pub generation: u32,
    /// Ancestors, root first.
    pub ancestors: Vec<RoleLineage>,
    /// Roles sharing the parent.
    pub siblings: Vec<RoleLineage>,
    /// Roles cloned directly from this one.
    pub clone_history: Vec<CloneHistoryEntry>,
    /// Whole tree, limited to the display depth.
    pub tree: RoleLineage,
}

/// Reports the lineage of `role_id` from a directory file.
///
/// `depth` overrides the configured display depth.
///
/// # Errors
///
/// Returns an error if the directory cannot be loaded or the role does not exist.
pub async fn cmd_lineage(
    directory: &Path,
    role_id: &RoleId,
    depth: Option<usize>,
    config: &EngineConfig,
) -> Result<LineageReport> {
    let directory = Arc::new(InMemoryRoleDirectory::load_from_file(directory)?);
    let tracker = LineageTracker::with_cache(directory, Arc::new(config.lineage_cache()))
        .with_display_depth(depth.unwrap_or(config.lineage_display_depth));

    let ancestors = tracker.ancestors(role_id).await?;
    let siblings = tracker.siblings(role_id).await?;
    let tree = tracker.display_tree(role_id).await?;
    Ok(LineageReport {
        role_id: role_id.clone(),
        generation: tracker.role_generation(role_id),
        ancestors,
        siblings,
        clone_history: tracker.clone_history(role_id),
        tree,
    })
}
