//! Security features.
//!
//! Operator access control for clone sessions.

pub mod rbac;

pub use rbac::{AccessControl, AccessResult, EnginePermission, OperatorRole};
