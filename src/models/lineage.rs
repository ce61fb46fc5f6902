//! Role lineage trees.
//!
//! A lineage tree is rebuilt on every fetch; node identity is the [`RoleId`],
//! never the Rust object, so nothing here holds references across refreshes.

use super::clone_config::CloneType;
use super::role::RoleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One node of a lineage tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLineage {
    /// Role ID.
    pub id: RoleId,
    /// Role name.
    pub name: String,
    /// Hops from the original role (0 = original).
    pub generation_level: u32,
    /// Clone type of the edge that created this role, `None` for originals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_type: Option<CloneType>,
    /// Number of direct children.
    pub clone_count: u32,
    /// When this role was cloned, `None` for originals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloned_at: Option<DateTime<Utc>>,
    /// Ancestor IDs, root first, excluding this node.
    #[serde(default)]
    pub lineage_path: Vec<RoleId>,
    /// Direct children, ordered by clone time.
    #[serde(default)]
    pub child_roles: Vec<RoleLineage>,
}

/// A "who was cloned from me" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneHistoryEntry {
    /// Child role ID.
    pub role_id: RoleId,
    /// Child role name.
    pub name: String,
    /// Clone type of the edge.
    pub clone_type: Option<CloneType>,
    /// When the child was created.
    pub cloned_at: Option<DateTime<Utc>>,
}

impl RoleLineage {
    /// Creates an original (generation 0) node with no children.
    #[must_use]
    pub fn root(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            generation_level: 0,
            clone_type: None,
            clone_count: 0,
            cloned_at: None,
            lineage_path: Vec::new(),
            child_roles: Vec::new(),
        }
    }

    /// Attaches a child created by `clone_type` at `cloned_at`.
    ///
    /// Generation, path and clone count are derived from `self`.
    pub fn push_child(
        &mut self,
        id: impl Into<RoleId>,
        name: impl Into<String>,
        clone_type: CloneType,
        cloned_at: DateTime<Utc>,
    ) -> &mut Self {
        let mut lineage_path = self.lineage_path.clone();
        lineage_path.push(self.id.clone());
        self.child_roles.push(Self {
            id: id.into(),
            name: name.into(),
            generation_level: self.generation_level + 1,
            clone_type: Some(clone_type),
            clone_count: 0,
            cloned_at: Some(cloned_at),
            lineage_path,
            child_roles: Vec::new(),
        });
        self.clone_count = u32::try_from(self.child_roles.len()).unwrap_or(u32::MAX);
        let last = self.child_roles.len() - 1;
        &mut self.child_roles[last]
    }

    /// Pre-order iterator over this node and its subtree.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.child_roles.iter().rev());
            Some(node)
        })
    }

    /// Finds a node by ID with a pre-order search.
    #[must_use]
    pub fn find(&self, id: &RoleId) -> Option<&Self> {
        self.iter().find(|node| &node.id == id)
    }

    /// Returns `true` if `id` is in this subtree.
    #[must_use]
    pub fn contains(&self, id: &RoleId) -> bool {
        self.find(id).is_some()
    }

    /// Direct children as history entries.
    #[must_use]
    pub fn clone_history(&self) -> Vec<CloneHistoryEntry> {
        self.child_roles
            .iter()
            .map(|child| CloneHistoryEntry {
                role_id: child.id.clone(),
                name: child.name.clone(),
                clone_type: child.clone_type,
                cloned_at: child.cloned_at,
            })
            .collect()
    }

    /// Returns `true` if `candidate` is on this node's lineage path.
    #[must_use]
    pub fn has_ancestor(&self, candidate: &RoleId) -> bool {
        self.lineage_path.contains(candidate)
    }

    /// All nodes below this one, pre-order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Self> {
        self.iter().skip(1).collect()
    }

    /// This node without its children; `clone_count` is kept.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            child_roles: Vec::new(),
            ..self.clone()
        }
    }

    /// Copy limited to `max_depth` levels below this node.
    ///
    /// Depth limiting is a presentation concern; `clone_count` still reports the
    /// real number of children.
    #[must_use]
    pub fn pruned(&self, max_depth: usize) -> Self {
        let child_roles = if max_depth == 0 {
            Vec::new()
        } else {
            self.child_roles
                .iter()
                .map(|child| child.pruned(max_depth - 1))
                .collect()
        };
        Self {
            child_roles,
            ..self.detached()
        }
    }

    /// Depth of the deepest node below this one (0 for a leaf).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.child_roles
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Everything the persistence service reports about one role's lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageSnapshot {
    /// The requested node with its subtree.
    pub lineage: RoleLineage,
    /// Ancestors, root first, detached from their children.
    pub ancestors: Vec<RoleLineage>,
    /// Direct children, detached.
    pub descendants: Vec<RoleLineage>,
    /// Nodes sharing the requested node's parent, detached.
    pub siblings: Vec<RoleLineage>,
    /// The whole tree from its root.
    pub tree: RoleLineage,
}

impl LineageSnapshot {
    /// Builds the snapshot for `id` from a full tree.
    ///
    /// Returns `None` if `id` is not in `tree`.
    #[must_use]
    pub fn from_tree(tree: RoleLineage, id: &RoleId) -> Option<Self> {
        let node = tree.find(id)?.clone();
        let ancestors = node
            .lineage_path
            .iter()
            .filter_map(|ancestor_id| tree.find(ancestor_id).map(RoleLineage::detached))
            .collect();
        let descendants = node.child_roles.iter().map(RoleLineage::detached).collect();
        let siblings = node
            .lineage_path
            .last()
            .and_then(|parent_id| tree.find(parent_id))
            .map(|parent| {
                parent
                    .child_roles
                    .iter()
                    .filter(|child| child.id != node.id)
                    .map(RoleLineage::detached)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            lineage: node,
            ancestors,
            descendants,
            siblings,
            tree,
        })
    }

    /// Root role ID of the tree.
    #[must_use]
    pub const fn root_id(&self) -> &RoleId {
        &self.tree.id
    }
}
