//! Business logic services.
//!
//! Pure computation (permission sets, level estimation, validation,
//! recommendations) plus the session orchestrators that drive it against a
//! [`RoleDirectory`](crate::storage::RoleDirectory).

mod batch;
pub mod level_estimator;
mod lineage;
pub mod permission_set;
mod recommendation;
mod session;
pub mod validation;

pub use batch::BatchCloneSession;
pub use level_estimator::{MAX_ESTIMATED_LEVEL, MIN_ESTIMATED_LEVEL, estimate_level, scope_weight};
pub use lineage::{DEFAULT_DISPLAY_DEPTH, LineageTracker};
pub use permission_set::{IdentityTemplate, PermissionSetCalculator, TemplateFilter};
pub use recommendation::{RecommendationGenerator, suggested_name};
pub use session::{CloneExecution, CloneSession, SessionState};
pub use validation::CloneValidator;
