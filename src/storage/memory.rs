//! In-memory role directory.
//!
//! Holds roles and lineage edges behind a `RwLock`. Used by the CLI (loaded
//! from a JSON directory file) and by tests.
//!
//! Commits honour `inheritance_rules.adjust_level` by lowering a level above
//! the source role's level to the source level.

use super::traits::RoleDirectory;
use crate::models::{
    CloneBatchConfig, CloneConfiguration, CloneType, LineageSnapshot, Role, RoleId, RoleLineage,
};
use crate::services::PermissionSetCalculator;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::RwLock;
use tracing::instrument;

/// A parent/child edge recorded when a clone preserves lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    /// Source role.
    pub parent: RoleId,
    /// Created role.
    pub child: RoleId,
    /// Clone type used.
    pub clone_type: CloneType,
    /// Creation time.
    pub cloned_at: DateTime<Utc>,
}

/// On-disk layout of a directory file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DirectoryFile {
    /// Roles.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Lineage edges.
    #[serde(default)]
    pub lineage: Vec<LineageEdge>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    roles: BTreeMap<RoleId, Role>,
    edges: Vec<LineageEdge>,
}

impl DirectoryState {
    fn name_taken(&self, name: &str) -> bool {
        let name = name.trim();
        self.roles.values().any(|role| role.name.trim() == name)
    }

    fn parent_of(&self, id: &RoleId) -> Option<&LineageEdge> {
        self.edges.iter().find(|edge| &edge.child == id)
    }

    fn children_of(&self, id: &RoleId) -> Vec<&LineageEdge> {
        let mut children: Vec<_> = self.edges.iter().filter(|edge| &edge.parent == id).collect();
        children.sort_by_key(|edge| edge.cloned_at);
        children
    }

    fn root_of(&self, id: &RoleId) -> RoleId {
        let mut current = id.clone();
        let mut seen = HashSet::new();
        while let Some(edge) = self.parent_of(&current) {
            if !seen.insert(current.clone()) {
                break;
            }
            current = edge.parent.clone();
        }
        current
    }

    fn display_name(&self, id: &RoleId) -> String {
        self.roles
            .get(id)
            .map_or_else(|| id.to_string(), |role| role.name.clone())
    }

    fn attach_children(&self, node: &mut RoleLineage, seen: &mut HashSet<RoleId>) {
        for edge in self.children_of(&node.id) {
            if !seen.insert(edge.child.clone()) {
                tracing::warn!(role_id = %edge.child, "Lineage cycle detected, skipping edge");
                continue;
            }
            let child = node.push_child(
                edge.child.clone(),
                self.display_name(&edge.child),
                edge.clone_type,
                edge.cloned_at,
            );
            self.attach_children(child, seen);
        }
    }

    fn lineage_tree(&self, id: &RoleId) -> RoleLineage {
        let root_id = self.root_of(id);
        let mut root = RoleLineage::root(root_id.clone(), self.display_name(&root_id));
        let mut seen = HashSet::from([root_id]);
        self.attach_children(&mut root, &mut seen);
        root
    }

    /// Builds the role for `config` without inserting it.
    fn materialize(
        &self,
        config: &CloneConfiguration,
        calculator: &PermissionSetCalculator,
    ) -> Result<(Role, Option<LineageEdge>)> {
        let source = self
            .roles
            .get(&config.source_role_id)
            .ok_or_else(|| Error::role_not_found(&config.source_role_id))?;

        let name = config.new_metadata.name.trim();
        if name.is_empty() {
            return Err(Error::ValidationFailed("role name is required".to_string()));
        }

        let permissions = calculator.resulting_permissions(&source.permissions, config);
        let user_count = if config.inheritance_rules.copy_user_assignments {
            source.user_count
        } else {
            0
        };
        let level = if config.inheritance_rules.adjust_level {
            config.new_metadata.level.min(source.level)
        } else {
            config.new_metadata.level
        };
        let role = Role::new(RoleId::generate(), name, level)
            .with_permissions(permissions)
            .with_description(config.new_metadata.description.clone())
            .with_user_count(user_count);

        let edge = config.preserve_lineage.then(|| LineageEdge {
            parent: source.id.clone(),
            child: role.id.clone(),
            clone_type: config.clone_type,
            cloned_at: Utc::now(),
        });
        Ok((role, edge))
    }

    fn insert(&mut self, role: Role, edge: Option<LineageEdge>) {
        if let Some(edge) = edge {
            self.edges.push(edge);
        }
        self.roles.insert(role.id.clone(), role);
    }
}

/// Role directory kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    state: RwLock<DirectoryState>,
    calculator: PermissionSetCalculator,
}

impl InMemoryRoleDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory from a parsed directory file.
    #[must_use]
    pub fn from_file_contents(file: DirectoryFile) -> Self {
        let state = DirectoryState {
            roles: file
                .roles
                .into_iter()
                .map(|role| (role.id.clone(), role))
                .collect(),
            edges: file.lineage,
        };
        Self {
            state: RwLock::new(state),
            calculator: PermissionSetCalculator::default(),
        }
    }

    /// Parses a directory from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the JSON does not match [`DirectoryFile`].
    pub fn from_json(json: &str) -> Result<Self> {
        let file: DirectoryFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("invalid directory file: {e}")))?;
        Ok(Self::from_file_contents(file))
    }

    /// Loads a directory from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the file cannot be read, or
    /// [`Error::InvalidInput`] if it cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_directory_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&contents)
    }

    /// Replaces the template filter used when committing template clones.
    #[must_use]
    pub fn with_calculator(mut self, calculator: PermissionSetCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Inserts or replaces a role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the lock is poisoned.
    pub fn insert_role(&self, role: Role) -> Result<()> {
        let mut state = self.write("insert_role")?;
        state.roles.insert(role.id.clone(), role);
        Ok(())
    }

    /// Names of every role, in ID order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the lock is poisoned.
    pub fn role_names(&self) -> Result<Vec<String>> {
        let state = self.read("role_names")?;
        Ok(state.roles.values().map(|role| role.name.clone()).collect())
    }

    /// Number of stored roles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the lock is poisoned.
    pub fn role_count(&self) -> Result<usize> {
        Ok(self.read("role_count")?.roles.len())
    }

    fn read(&self, operation: &str) -> Result<std::sync::RwLockReadGuard<'_, DirectoryState>> {
        self.state.read().map_err(|e| Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("lock poisoned: {e}"),
        })
    }

    fn write(&self, operation: &str) -> Result<std::sync::RwLockWriteGuard<'_, DirectoryState>> {
        self.state.write().map_err(|e| Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("lock poisoned: {e}"),
        })
    }
}

impl RoleDirectory for InMemoryRoleDirectory {
    async fn get_role(&self, id: &RoleId) -> Result<Role> {
        let state = self.read("get_role")?;
        state
            .roles
            .get(id)
            .cloned()
            .ok_or_else(|| Error::role_not_found(id))
    }

    #[instrument(skip(self, config), fields(source_role_id = %config.source_role_id))]
    async fn clone_role(&self, config: &CloneConfiguration) -> Result<Role> {
        let mut state = self.write("clone_role")?;
        if state.name_taken(&config.new_metadata.name) {
            return Err(Error::Conflict(format!(
                "a role named '{}' already exists",
                config.new_metadata.name.trim()
            )));
        }
        let (role, edge) = state.materialize(config, &self.calculator)?;
        tracing::debug!(role_id = %role.id, lineage = edge.is_some(), "Committed cloned role");
        state.insert(role.clone(), edge);
        Ok(role)
    }

    /// Commits the whole batch or nothing.
    #[instrument(skip(self, config), fields(operations = config.operation_count()))]
    async fn batch_clone_roles(&self, config: &CloneBatchConfig) -> Result<Vec<Role>> {
        let mut state = self.write("batch_clone_roles")?;
        let mut sources = Vec::with_capacity(config.source_roles.len());
        for id in &config.source_roles {
            let source = state.roles.get(id).ok_or_else(|| Error::role_not_found(id))?;
            sources.push(source.clone());
        }

        let mut pending = Vec::with_capacity(config.operation_count());
        let mut batch_names = HashSet::new();
        for plan in config.plan(&sources) {
            let name = plan.new_metadata.name.trim().to_string();
            if state.name_taken(&name) || !batch_names.insert(name.clone()) {
                return Err(Error::Conflict(format!("a role named '{name}' already exists")));
            }
            pending.push(state.materialize(&plan, &self.calculator)?);
        }

        let mut created = Vec::with_capacity(pending.len());
        for (role, edge) in pending {
            created.push(role.clone());
            state.insert(role, edge);
        }
        Ok(created)
    }

    async fn get_role_lineage(&self, id: &RoleId) -> Result<LineageSnapshot> {
        let state = self.read("get_role_lineage")?;
        if !state.roles.contains_key(id) {
            return Err(Error::NotFound {
                entity: "lineage",
                id: id.to_string(),
            });
        }
        let tree = state.lineage_tree(id);
        LineageSnapshot::from_tree(tree, id).ok_or_else(|| Error::NotFound {
            entity: "lineage",
            id: id.to_string(),
        })
    }
}
