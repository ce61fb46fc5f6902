//! Storage layer abstraction.
//!
//! - **Directory**: the persistence service that owns roles and lineage edges
//!   ([`RoleDirectory`], with an in-memory implementation)
//! - **Lineage cache**: bounded LRU of lineage snapshots in front of the directory

// Allow significant_drop_tightening - guards are held for a handful of map operations.
#![allow(clippy::significant_drop_tightening)]

pub mod lineage_cache;
pub mod memory;
pub mod traits;

pub use lineage_cache::{DEFAULT_LINEAGE_CACHE_CAPACITY, LineageCache};
pub use memory::{DirectoryFile, InMemoryRoleDirectory, LineageEdge};
pub use traits::RoleDirectory;
