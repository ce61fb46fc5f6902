//! Batch clone sessions.
//!
//! The caller assembles a [`CloneBatchConfig`] (sources, variations, name
//! pattern, global adjustments) and submits it as one directory call. There is
//! no per-variation preview.

use super::lineage::LineageTracker;
use crate::models::{BatchAdjustments, BatchType, BatchVariation, CloneBatchConfig, Role, RoleId};
use crate::security::{AccessControl, EnginePermission, OperatorRole};
use crate::storage::RoleDirectory;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Stateful batch clone workflow.
pub struct BatchCloneSession<D: RoleDirectory> {
    directory: Arc<D>,
    lineage: Option<Arc<LineageTracker<D>>>,
    access: AccessControl,
    operator: OperatorRole,
    config: Option<CloneBatchConfig>,
}

impl<D: RoleDirectory> BatchCloneSession<D> {
    /// Creates an idle batch session operated by an administrator.
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            lineage: None,
            access: AccessControl::new(),
            operator: OperatorRole::Administrator,
            config: None,
        }
    }

    /// Sets the operator whose permissions gate the session.
    #[must_use]
    pub const fn with_operator(mut self, operator: OperatorRole) -> Self {
        self.operator = operator;
        self
    }

    /// Replaces the access control mapping.
    #[must_use]
    pub fn with_access_control(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }

    /// Invalidates `tracker`'s cache after each successful batch.
    #[must_use]
    pub fn with_lineage(mut self, tracker: Arc<LineageTracker<D>>) -> Self {
        self.lineage = Some(tracker);
        self
    }

    /// Returns `true` while a batch is being assembled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.config.is_some()
    }

    /// Batch being assembled.
    #[must_use]
    pub const fn config(&self) -> Option<&CloneBatchConfig> {
        self.config.as_ref()
    }

    /// Starts a new batch over `source_roles`, discarding any batch in progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without the batch clone permission.
    pub fn start_batch_clone(
        &mut self,
        source_roles: Vec<RoleId>,
        batch_type: BatchType,
    ) -> Result<()> {
        self.access
            .require(self.operator, EnginePermission::BatchCloneRole)?;
        tracing::debug!(
            sources = source_roles.len(),
            batch_type = %batch_type,
            "Batch clone started"
        );
        self.config = Some(CloneBatchConfig::new(source_roles, batch_type));
        Ok(())
    }

    /// Adds a variation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] without an active batch, or
    /// [`Error::InvalidInput`] for a blank or duplicate variation name.
    pub fn add_variation(&mut self, variation: BatchVariation) -> Result<()> {
        let config = self.config_mut("add_variation")?;
        let name = variation.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("variation name is required".to_string()));
        }
        if config.variations.iter().any(|v| v.name.trim() == name) {
            return Err(Error::InvalidInput(format!("variation '{name}' already exists")));
        }
        config.variations.push(variation);
        Ok(())
    }

    /// Removes the variation named `name`. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] without an active batch.
    pub fn remove_variation(&mut self, name: &str) -> Result<bool> {
        let config = self.config_mut("remove_variation")?;
        let before = config.variations.len();
        config.variations.retain(|v| v.name.trim() != name.trim());
        Ok(config.variations.len() != before)
    }

    /// Sets the name pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] without an active batch.
    pub fn set_name_pattern(&mut self, pattern: impl Into<String>) -> Result<()> {
        self.config_mut("set_name_pattern")?.name_pattern = pattern.into();
        Ok(())
    }

    /// Sets adjustments applied to every variation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] without an active batch.
    pub fn set_global_adjustments(&mut self, adjustments: BatchAdjustments) -> Result<()> {
        self.config_mut("set_global_adjustments")?.global_adjustments = adjustments;
        Ok(())
    }

    /// Number of roles the batch would request, 0 when idle.
    #[must_use]
    pub fn planned_operation_count(&self) -> usize {
        self.config
            .as_ref()
            .map_or(0, CloneBatchConfig::operation_count)
    }

    /// Submits the batch as one directory call.
    ///
    /// On success the session returns to idle; on error the batch is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] without an active batch,
    /// [`Error::InvalidInput`] when there are no sources or no variations,
    /// [`Error::Unauthorized`] without the batch clone permission, or the
    /// directory's error.
    #[instrument(skip(self), fields(operations = self.planned_operation_count()))]
    pub async fn execute_batch_clone(&mut self) -> Result<Vec<Role>> {
        self.access
            .require(self.operator, EnginePermission::BatchCloneRole)?;
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| no_active_batch("execute_batch_clone"))?;
        if config.source_roles.is_empty() {
            return Err(Error::InvalidInput("batch has no source roles".to_string()));
        }
        if config.variations.is_empty() {
            return Err(Error::InvalidInput("batch has no variations".to_string()));
        }

        let roles = self.directory.batch_clone_roles(config).await.inspect_err(|e| {
            tracing::warn!(error = %e, recoverable = e.is_recoverable(), "Batch clone failed");
        })?;

        metrics::counter!("role_batch_clone_roles_total").increment(roles.len() as u64);
        tracing::info!(created = roles.len(), "Batch clone committed");
        if let Some(lineage) = &self.lineage {
            for source in &config.source_roles {
                lineage.invalidate_for(source);
            }
        }
        self.config = None;
        Ok(roles)
    }

    /// Discards the batch.
    pub fn cancel(&mut self) {
        if self.config.take().is_some() {
            tracing::debug!("Batch clone cancelled");
        }
    }

    fn config_mut(&mut self, operation: &str) -> Result<&mut CloneBatchConfig> {
        self.config
            .as_mut()
            .ok_or_else(|| no_active_batch(operation))
    }
}

fn no_active_batch(operation: &str) -> Error {
    Error::PreconditionFailed(format!("{operation} requires an active batch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRoleDirectory;

    fn directory() -> Arc<InMemoryRoleDirectory> {
        let directory = InMemoryRoleDirectory::new();
        directory
            .insert_role(Role::new("bar", "Bartender", 30))
            .expect("insert");
        Arc::new(directory)
    }

    #[test]
    fn test_variation_editing() {
        let mut session = BatchCloneSession::new(directory());
        assert!(matches!(
            session.add_variation(BatchVariation::new("Pool")),
            Err(Error::PreconditionFailed(_))
        ));

        session
            .start_batch_clone(vec![RoleId::new("bar")], BatchType::Properties)
            .expect("start");
        session.add_variation(BatchVariation::new("Pool")).expect("add");
        session.add_variation(BatchVariation::new("Lobby")).expect("add");
        assert!(matches!(
            session.add_variation(BatchVariation::new(" Pool ")),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(session.planned_operation_count(), 2);

        assert!(session.remove_variation("Pool").expect("remove"));
        assert!(!session.remove_variation("Rooftop").expect("remove"));
        assert_eq!(session.planned_operation_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_requires_variations() {
        let mut session = BatchCloneSession::new(directory());
        session
            .start_batch_clone(vec![RoleId::new("bar")], BatchType::Variations)
            .expect("start");
        let err = session.execute_batch_clone().await.expect_err("empty");
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_execute_resets_on_success() {
        let mut session = BatchCloneSession::new(directory());
        session
            .start_batch_clone(vec![RoleId::new("bar")], BatchType::Properties)
            .expect("start");
        session.set_name_pattern("{variation} {sourceName}").expect("pattern");
        session.add_variation(BatchVariation::new("Pool")).expect("add");
        let roles = session.execute_batch_clone().await.expect("execute");
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "Pool Bartender");
        assert!(!session.is_active());
        assert_eq!(session.planned_operation_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_keeps_batch() {
        let mut session = BatchCloneSession::new(directory());
        session
            .start_batch_clone(vec![RoleId::new("ghost")], BatchType::Variations)
            .expect("start");
        session.add_variation(BatchVariation::new("A")).expect("add");
        let err = session.execute_batch_clone().await.expect_err("missing");
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(session.is_active());
    }

    #[test]
    fn test_operator_without_batch_permission() {
        let mut session =
            BatchCloneSession::new(directory()).with_operator(OperatorRole::PropertyManager);
        assert!(matches!(
            session.start_batch_clone(vec![RoleId::new("bar")], BatchType::Variations),
            Err(Error::Unauthorized(_))
        ));
    }
}
