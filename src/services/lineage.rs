//! Lineage tracking.
//!
//! Read-through access to role lineage with an LRU cache in front of the
//! directory. Async views fetch on a miss; the sync queries only look at trees
//! that are already cached, as callers render them after a fetch.

use crate::Result;
use crate::models::{CloneHistoryEntry, LineageSnapshot, RoleId, RoleLineage};
use crate::storage::{LineageCache, RoleDirectory};
use std::sync::Arc;
use tracing::instrument;

/// Default depth used by presentation helpers.
pub const DEFAULT_DISPLAY_DEPTH: usize = 5;

/// Lineage queries over a role directory.
pub struct LineageTracker<D: RoleDirectory> {
    directory: Arc<D>,
    cache: Arc<LineageCache>,
    display_depth: usize,
}

impl<D: RoleDirectory> LineageTracker<D> {
    /// Creates a tracker with a default-sized cache.
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        Self::with_cache(directory, Arc::new(LineageCache::default()))
    }

    /// Creates a tracker sharing `cache`.
    #[must_use]
    pub const fn with_cache(directory: Arc<D>, cache: Arc<LineageCache>) -> Self {
        Self {
            directory,
            cache,
            display_depth: DEFAULT_DISPLAY_DEPTH,
        }
    }

    /// Sets the depth used by [`Self::display_tree`].
    #[must_use]
    pub const fn with_display_depth(mut self, depth: usize) -> Self {
        self.display_depth = depth;
        self
    }

    /// Presentation depth.
    #[must_use]
    pub const fn display_depth(&self) -> usize {
        self.display_depth
    }

    /// Underlying cache.
    #[must_use]
    pub fn cache(&self) -> &LineageCache {
        &self.cache
    }

    /// Returns the lineage snapshot for `id`, fetching it on a cache miss.
    ///
    /// # Errors
    ///
    /// Propagates directory errors.
    #[instrument(skip(self), fields(role_id = %id))]
    pub async fn fetch(&self, id: &RoleId) -> Result<Arc<LineageSnapshot>> {
        if let Some(snapshot) = self.cache.get(id) {
            return Ok(snapshot);
        }
        let snapshot = Arc::new(self.directory.get_role_lineage(id).await?);
        tracing::debug!(
            root_id = %snapshot.root_id(),
            tree_depth = snapshot.tree.depth(),
            "Fetched lineage"
        );
        self.cache.insert(id.clone(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Ancestor chain of `id`, root first.
    ///
    /// # Errors
    ///
    /// Propagates directory errors.
    pub async fn ancestors(&self, id: &RoleId) -> Result<Vec<RoleLineage>> {
        Ok(self.fetch(id).await?.ancestors.clone())
    }

    /// Direct children of `id`.
    ///
    /// # Errors
    ///
    /// Propagates directory errors.
    pub async fn descendants(&self, id: &RoleId) -> Result<Vec<RoleLineage>> {
        Ok(self.fetch(id).await?.descendants.clone())
    }

    /// Roles sharing `id`'s parent.
    ///
    /// # Errors
    ///
    /// Propagates directory errors.
    pub async fn siblings(&self, id: &RoleId) -> Result<Vec<RoleLineage>> {
        Ok(self.fetch(id).await?.siblings.clone())
    }

    /// Full subtree rooted at `id`.
    ///
    /// # Errors
    ///
    /// Propagates directory errors.
    pub async fn subtree(&self, id: &RoleId) -> Result<RoleLineage> {
        Ok(self.fetch(id).await?.lineage.clone())
    }

    /// Whole tree containing `id`, limited to the display depth.
    ///
    /// # Errors
    ///
    /// Propagates directory errors.
    pub async fn display_tree(&self, id: &RoleId) -> Result<RoleLineage> {
        Ok(self.fetch(id).await?.tree.pruned(self.display_depth))
    }

    /// Generation of `id` in a cached tree, 0 when unknown.
    #[must_use]
    pub fn role_generation(&self, id: &RoleId) -> u32 {
        self.cached_node(id, |node| node.generation_level)
            .unwrap_or(0)
    }

    /// Roles cloned directly from `id`, empty when unknown.
    #[must_use]
    pub fn clone_history(&self, id: &RoleId) -> Vec<CloneHistoryEntry> {
        self.cached_node(id, RoleLineage::clone_history)
            .unwrap_or_default()
    }

    /// Returns `true` if `ancestor` is on `role`'s lineage path.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: &RoleId, role: &RoleId) -> bool {
        self.cached_node(role, |node| node.has_ancestor(ancestor))
            .unwrap_or(false)
    }

    /// Returns `true` if `role` descends from `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, role: &RoleId, ancestor: &RoleId) -> bool {
        self.is_ancestor(ancestor, role)
    }

    /// Drops cached trees that contain `id`.
    pub fn invalidate_for(&self, id: &RoleId) {
        self.cache.invalidate_containing(id);
    }

    fn cached_node<T>(&self, id: &RoleId, f: impl FnOnce(&RoleLineage) -> T) -> Option<T> {
        let snapshot = self.cache.find_containing(id)?;
        snapshot.tree.find(id).map(f)
    }
}
