//! LRU cache of lineage snapshots.
//!
//! Keyed by the requested role ID. Several entries may hold the same tree when
//! different members of it were requested.
//!
//! # Lock Poisoning
//!
//! Poisoning fails open: lookups miss and inserts are skipped. The directory is
//! the source of truth, so a cache that cannot be used only costs a refetch.

use crate::models::{LineageSnapshot, RoleId};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Default number of cached snapshots.
pub const DEFAULT_LINEAGE_CACHE_CAPACITY: usize = 128;

/// Bounded cache of lineage snapshots.
pub struct LineageCache {
    entries: Mutex<LruCache<RoleId, Arc<LineageSnapshot>>>,
}

impl std::fmt::Debug for LineageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineageCache")
            .field("len", &self.len())
            .finish()
    }
}

impl Default for LineageCache {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(DEFAULT_LINEAGE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        )
    }
}

impl LineageCache {
    /// Creates a cache holding at most `capacity` snapshots.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the snapshot cached for `id`, marking it recently used.
    pub fn get(&self, id: &RoleId) -> Option<Arc<LineageSnapshot>> {
        let hit = self.entries.lock().ok()?.get(id).cloned();
        let result = if hit.is_some() { "hit" } else { "miss" };
        metrics::counter!("lineage_cache_lookups_total", "result" => result).increment(1);
        hit
    }

    /// Caches `snapshot` under `id`.
    pub fn insert(&self, id: RoleId, snapshot: Arc<LineageSnapshot>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(id, snapshot);
        }
    }

    /// Returns any cached tree containing `id`, without touching recency.
    pub fn find_containing(&self, id: &RoleId) -> Option<Arc<LineageSnapshot>> {
        let entries = self.entries.lock().ok()?;
        entries
            .iter()
            .find(|(_, snapshot)| snapshot.tree.contains(id))
            .map(|(_, snapshot)| Arc::clone(snapshot))
    }

    /// Drops every entry whose tree contains `id`. Returns the number dropped.
    pub fn invalidate_containing(&self, id: &RoleId) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let stale: Vec<RoleId> = entries
            .iter()
            .filter(|(_, snapshot)| snapshot.tree.contains(id))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        if !stale.is_empty() {
            tracing::debug!(
                role_id = %id,
                dropped = stale.len(),
                "Invalidated lineage cache entries"
            );
        }
        stale.len()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of cached snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
