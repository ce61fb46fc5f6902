//! Role directory trait.
//!
//! The role directory is the persistence service that owns roles, permissions
//! and lineage edges. The engine only reads from it and submits clone requests;
//! it never writes role records itself.

use crate::Result;
use crate::models::{CloneBatchConfig, CloneConfiguration, LineageSnapshot, Role, RoleId};
use std::future::Future;

/// Persistence service contract consumed by the cloning engine.
///
/// Implementations must be thread-safe (`Send + Sync`). Idempotency of role
/// creation is the implementation's responsibility.
pub trait RoleDirectory: Send + Sync {
    /// Fetches a role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the role does not
    /// exist, or [`Error::OperationFailed`](crate::Error::OperationFailed) if the
    /// service cannot be reached.
    fn get_role(&self, id: &RoleId) -> impl Future<Output = Result<Role>> + Send;

    /// Commits one new role from a clone configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationFailed`](crate::Error::ValidationFailed),
    /// [`Error::Conflict`](crate::Error::Conflict) or
    /// [`Error::OperationFailed`](crate::Error::OperationFailed).
    fn clone_role(&self, config: &CloneConfiguration) -> impl Future<Output = Result<Role>> + Send;

    /// Commits `sources x variations` new roles in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if any source is missing or the service rejects the batch.
    fn batch_clone_roles(
        &self,
        config: &CloneBatchConfig,
    ) -> impl Future<Output = Result<Vec<Role>>> + Send;

    /// Fetches the lineage of a role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the role does not exist.
    fn get_role_lineage(&self, id: &RoleId) -> impl Future<Output = Result<LineageSnapshot>> + Send;
}
