//! # Roleforge
//!
//! Role cloning and lineage engine for hotel back-office role administration.
//!
//! Roleforge takes a source role's permission set, applies a clone
//! transformation, estimates a safe privilege level, detects conflicts, suggests
//! follow-up edits and tracks the parent/child lineage of roles over time.
//!
//! ## Features
//!
//! - Permission set algebra for full, permissions, template, partial and hierarchy clones
//! - Heuristic level estimation clamped to `[10, 100]`
//! - Structured validation with naming, permission and hierarchy conflicts
//! - Auto-applicable name and level recommendations
//! - Lineage trees with a read-through LRU cache
//! - Stateful single and batch clone sessions over a pluggable role directory
//!
//! ## Example
//!
//! ```rust,ignore
//! use roleforge::{CloneSession, CloneConfigurationPatch, InMemoryRoleDirectory, RoleId};
//! use std::sync::Arc;
//!
//! let directory = Arc::new(InMemoryRoleDirectory::new());
//! let mut session = CloneSession::new(directory);
//! session.start_clone(&RoleId::new("front-desk"), None).await?;
//! session.update_configuration(CloneConfigurationPatch::name("Front Desk Lead"))?;
//! let preview = session.generate_preview().await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::EngineConfig;
pub use models::{
    CloneBatchConfig, CloneConfiguration, CloneConfigurationPatch, ClonePreview, CloneType,
    CloneValidationResult, Permission, PermissionId, PermissionScope, Role, RoleDuplicationContext,
    RoleId, RoleLineage, SmartCloneRecommendation,
};
pub use services::{
    BatchCloneSession, CloneExecution, CloneSession, CloneValidator, LineageTracker,
    PermissionSetCalculator, RecommendationGenerator, SessionState, estimate_level,
};
pub use storage::{InMemoryRoleDirectory, LineageCache, RoleDirectory};

/// Error type for roleforge operations.
///
/// Local validation failures are not errors; they are reported as
/// [`CloneValidationResult`] data.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed configuration files, empty batch definitions |
/// | `NotFound` | Source role or lineage node does not exist |
/// | `PreconditionFailed` | No active session, action not allowed in the current state |
/// | `Unauthorized` | Operator lacks the clone / batch clone permission |
/// | `ValidationFailed` | Persistence service rejected the configuration |
/// | `Conflict` | Persistence service reported a conflicting role |
/// | `OperationFailed` | I/O errors, lock poisoning, service failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind (`role`, `lineage`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The call is not allowed in the current state.
    ///
    /// Fatal to the attempted call; retrying without fixing the precondition
    /// fails the same way.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The operator lacks a required permission.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The persistence service rejected the configuration.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The persistence service reported a conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Creates a `NotFound` error for a role.
    #[must_use]
    pub fn role_not_found(id: &RoleId) -> Self {
        Self::NotFound {
            entity: "role",
            id: id.to_string(),
        }
    }

    /// Returns `true` if retrying the same call can succeed.
    ///
    /// Service rejections and I/O failures are recoverable; precondition and
    /// authorization failures are not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::ValidationFailed(_)
                | Self::Conflict(_)
                | Self::OperationFailed { .. }
        )
    }
}

/// Result type alias for roleforge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "clone_role".to_string(),
            cause: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'clone_role' failed: timeout");

        let err = Error::role_not_found(&RoleId::new("spa-lead"));
        assert_eq!(err.to_string(), "role 'spa-lead' not found");
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::Conflict("name taken".to_string()).is_recoverable());
        assert!(
            Error::OperationFailed {
                operation: "get_role".to_string(),
                cause: "io".to_string()
            }
            .is_recoverable()
        );
        assert!(!Error::PreconditionFailed("no session".to_string()).is_recoverable());
        assert!(!Error::Unauthorized("no clone permission".to_string()).is_recoverable());
    }
}
