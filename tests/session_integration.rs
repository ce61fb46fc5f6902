//! Integration tests for clone sessions against role directories.
//!
//! Covers the end-to-end scenarios:
//! - hierarchy clone at level 40 keeps property scope and drops platform scope
//! - partial clone with no selection is invalid
//! - a taken name yields exactly one naming conflict
//! - applying every recommendation keeps a clone valid
//! - a 3 x 2 batch requests exactly 6 roles
//! - directory failures keep session state for a retry

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use roleforge::models::{
    BatchAdjustments, BatchType, BatchVariation, CloneBatchConfig, CloneConfiguration,
    CloneConfigurationPatch, CloneType, LineageSnapshot, Permission, PermissionScope,
    RecommendedChange, Role, RoleDuplicationContext, RoleId,
};
use roleforge::storage::{InMemoryRoleDirectory, RoleDirectory};
use roleforge::{
    BatchCloneSession, CloneExecution, CloneSession, Error, LineageTracker, Result, SessionState,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn front_desk() -> Role {
    Role::new("front-desk", "Front Desk", 60)
        .with_description("Guest check-in and check-out")
        .with_permissions(vec![
            Permission::new("p1", "user", "read", PermissionScope::Property),
            Permission::new("p2", "user", "write", PermissionScope::Platform),
        ])
}

fn seeded_directory() -> Arc<InMemoryRoleDirectory> {
    let directory = InMemoryRoleDirectory::new();
    directory.insert_role(front_desk()).expect("insert");
    directory
        .insert_role(Role::new("concierge", "Concierge", 30))
        .expect("insert");
    directory
        .insert_role(Role::new("spa", "Spa Therapist", 20))
        .expect("insert");
    Arc::new(directory)
}

/// Wraps the in-memory directory, counting batch requests and failing on demand.
struct FlakyDirectory {
    inner: InMemoryRoleDirectory,
    fail_reads: AtomicBool,
    fail_submits: AtomicBool,
    batch_roles_requested: AtomicUsize,
}

impl FlakyDirectory {
    fn new() -> Self {
        let inner = InMemoryRoleDirectory::new();
        inner.insert_role(front_desk()).expect("insert");
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_submits: AtomicBool::new(false),
            batch_roles_requested: AtomicUsize::new(0),
        }
    }

    fn unavailable(operation: &str) -> Error {
        Error::OperationFailed {
            operation: operation.to_string(),
            cause: "directory unavailable".to_string(),
        }
    }
}

impl RoleDirectory for FlakyDirectory {
    async fn get_role(&self, id: &RoleId) -> Result<Role> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable("get_role"));
        }
        self.inner.get_role(id).await
    }

    async fn clone_role(&self, config: &CloneConfiguration) -> Result<Role> {
        if self.fail_submits.load(Ordering::SeqCst) {
            return Err(Self::unavailable("clone_role"));
        }
        self.inner.clone_role(config).await
    }

    async fn batch_clone_roles(&self, config: &CloneBatchConfig) -> Result<Vec<Role>> {
        self.batch_roles_requested
            .fetch_add(config.operation_count(), Ordering::SeqCst);
        if self.fail_submits.load(Ordering::SeqCst) {
            return Err(Self::unavailable("batch_clone_roles"));
        }
        self.inner.batch_clone_roles(config).await
    }

    async fn get_role_lineage(&self, id: &RoleId) -> Result<LineageSnapshot> {
        self.inner.get_role_lineage(id).await
    }
}

#[tokio::test]
async fn hierarchy_clone_at_level_40_drops_platform_scope() {
    let mut session = CloneSession::new(seeded_directory());
    session
        .start_clone(
            &RoleId::new("front-desk"),
            Some(CloneConfigurationPatch {
                clone_type: Some(CloneType::Hierarchy),
                ..CloneConfigurationPatch::level(40)
            }),
        )
        .await
        .expect("start");
    session
        .update_configuration(CloneConfigurationPatch::name("Desk Agent"))
        .expect("update");

    let preview = session.generate_preview().await.expect("preview");
    let kept: Vec<&str> = preview
        .resulting_permissions
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    let removed: Vec<&str> = preview
        .removed_permissions
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(kept, vec!["p1"]);
    assert_eq!(removed, vec!["p2"]);
    assert!(preview.added_permissions.is_empty());
    assert!((10..=100).contains(&preview.estimated_level));
}

#[tokio::test]
async fn applied_recommendations_keep_a_low_level_clone_valid() {
    let permissions = (0..30)
        .map(|i| Permission::new(format!("a{i}"), "audit", "view", PermissionScope::Property))
        .collect();
    let directory = InMemoryRoleDirectory::new();
    directory
        .insert_role(
            Role::new("night-audit", "Night Auditor", 20)
                .with_description("Closes the day overnight")
                .with_permissions(permissions),
        )
        .expect("insert");
    let mut session = CloneSession::new(Arc::new(directory));

    let mut pending = session
        .start_clone(
            &RoleId::new("night-audit"),
            Some(CloneConfigurationPatch::level(15)),
        )
        .await
        .expect("start");
    assert!(
        pending
            .iter()
            .any(|r| r.change == RecommendedChange::LevelAdjustment { level: 20 })
    );
    while let Some(recommendation) = pending.iter().find(|r| r.is_auto_applicable).cloned() {
        pending = session
            .apply_recommendation(&recommendation)
            .expect("apply");
    }

    let configuration = session.configuration().expect("active");
    assert!(!configuration.new_metadata.name.is_empty());
    assert_eq!(configuration.new_metadata.level, 20);

    let result = session.validate_configuration().expect("validate");
    assert!(result.is_valid, "conflicts: {:?}", result.conflicts);
    let outcome = session.execute_clone().await.expect("execute");
    assert!(matches!(outcome, CloneExecution::Created(_)));
}

#[tokio::test]
async fn partial_clone_without_selection_is_invalid() {
    let mut session = CloneSession::new(seeded_directory());
    session
        .start_clone(
            &RoleId::new("front-desk"),
            Some(CloneConfigurationPatch {
                clone_type: Some(CloneType::Partial),
                ..CloneConfigurationPatch::name("Desk Trainee")
            }),
        )
        .await
        .expect("start");

    let result = session.validate_configuration().expect("validate");
    assert!(!result.is_valid);
    assert!(result.has_error_on("permissions"));
}

#[tokio::test]
async fn taken_name_yields_exactly_one_naming_conflict() {
    let context = RoleDuplicationContext::with_names(["Front Desk", "Concierge", "Desk Lead"]);
    let mut session = CloneSession::new(seeded_directory()).with_context(context);
    session
        .start_clone(
            &RoleId::new("front-desk"),
            Some(CloneConfigurationPatch {
                clone_type: Some(CloneType::Permissions),
                ..CloneConfigurationPatch::name("Desk Lead")
            }),
        )
        .await
        .expect("start");

    let result = session.validate_configuration().expect("validate");
    assert!(!result.is_valid);
    assert_eq!(result.conflict_analysis().naming_conflicts.len(), 1);

    let preview = session.generate_preview().await.expect("preview");
    assert_eq!(preview.conflict_analysis.naming_conflicts.len(), 1);
    assert!(!preview.is_executable());
    assert!(session.request_confirmation().is_err());
}

#[tokio::test]
async fn batch_of_three_sources_and_two_variations_requests_six_roles() {
    let directory = Arc::new(FlakyDirectory::new());
    directory
        .inner
        .insert_role(Role::new("concierge", "Concierge", 30))
        .expect("insert");
    directory
        .inner
        .insert_role(Role::new("spa", "Spa Therapist", 20))
        .expect("insert");

    let mut batch = BatchCloneSession::new(Arc::clone(&directory));
    batch
        .start_batch_clone(
            vec![
                RoleId::new("front-desk"),
                RoleId::new("concierge"),
                RoleId::new("spa"),
            ],
            BatchType::Properties,
        )
        .expect("start");
    batch
        .set_global_adjustments(BatchAdjustments {
            clone_type: Some(CloneType::Permissions),
            ..BatchAdjustments::default()
        })
        .expect("adjust");
    batch
        .add_variation(BatchVariation::new("Seaside"))
        .expect("add");
    batch
        .add_variation(BatchVariation::new("Downtown"))
        .expect("add");
    assert_eq!(batch.planned_operation_count(), 6);

    let roles = batch.execute_batch_clone().await.expect("execute");
    assert_eq!(roles.len(), 6);
    assert_eq!(directory.batch_roles_requested.load(Ordering::SeqCst), 6);
    assert!(roles.iter().any(|r| r.name == "Spa Therapist - Downtown"));
    assert!(!batch.is_active());
}

#[tokio::test]
async fn preview_failure_keeps_configuring_state() {
    let directory = Arc::new(FlakyDirectory::new());
    let mut session = CloneSession::new(Arc::clone(&directory));
    session
        .start_clone(
            &RoleId::new("front-desk"),
            Some(CloneConfigurationPatch::name("Desk Lead")),
        )
        .await
        .expect("start");
    let session_id = session.session_id();
    session.generate_preview().await.expect("first preview");
    assert!(session.clone_preview().is_some());

    directory.fail_reads.store(true, Ordering::SeqCst);
    let err = session.generate_preview().await.expect_err("unavailable");
    assert!(err.is_recoverable());
    assert_eq!(session.state(), SessionState::Configuring);
    assert!(session.clone_preview().is_none());
    assert_eq!(session.session_id(), session_id);

    directory.fail_reads.store(false, Ordering::SeqCst);
    session.generate_preview().await.expect("retry");
    assert_eq!(session.state(), SessionState::Previewing);
}

#[tokio::test]
async fn submit_failure_preserves_session_for_retry() {
    let directory = Arc::new(FlakyDirectory::new());
    let mut session = CloneSession::new(Arc::clone(&directory));
    session
        .start_clone(
            &RoleId::new("front-desk"),
            Some(CloneConfigurationPatch::name("Desk Lead")),
        )
        .await
        .expect("start");
    session.generate_preview().await.expect("preview");
    session.request_confirmation().expect("confirm");

    directory.fail_submits.store(true, Ordering::SeqCst);
    let err = session.execute_clone().await.expect_err("unavailable");
    assert!(matches!(err, Error::OperationFailed { .. }));
    assert_eq!(session.state(), SessionState::Confirming);
    assert!(session.configuration().is_some());

    directory.fail_submits.store(false, Ordering::SeqCst);
    let outcome = session.execute_clone().await.expect("retry");
    assert!(matches!(outcome, CloneExecution::Created(ref role) if role.name == "Desk Lead"));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn successful_clone_invalidates_cached_lineage() {
    let directory = seeded_directory();
    let tracker = Arc::new(LineageTracker::new(Arc::clone(&directory)));
    let source = RoleId::new("front-desk");
    assert!(tracker.descendants(&source).await.expect("fetch").is_empty());

    let mut session = CloneSession::new(Arc::clone(&directory)).with_lineage(Arc::clone(&tracker));
    session
        .start_clone(&source, Some(CloneConfigurationPatch::name("Desk Lead")))
        .await
        .expect("start");
    let CloneExecution::Created(created) = session.execute_clone().await.expect("execute") else {
        panic!("expected a created role");
    };

    let descendants = tracker.descendants(&source).await.expect("refetch");
    assert_eq!(descendants.len(), 1);
    assert_eq!(descendants[0].id, created.id);
    assert!(tracker.is_ancestor(&source, &created.id));
    assert!(tracker.is_descendant(&created.id, &source));
    assert_eq!(tracker.role_generation(&created.id), 1);
}

#[tokio::test]
async fn cancelled_session_rejects_further_actions() {
    let mut session = CloneSession::new(seeded_directory());
    session
        .start_clone(&RoleId::new("concierge"), None)
        .await
        .expect("start");
    session.cancel_clone();

    assert!(!session.is_cloning());
    assert!(matches!(
        session.generate_preview().await,
        Err(Error::PreconditionFailed(_))
    ));
    assert!(matches!(
        session.execute_clone().await,
        Err(Error::PreconditionFailed(_))
    ));
}
