//! Clone session orchestration.
//!
//! A [`CloneSession`] walks one clone through
//! `idle -> configuring -> previewing -> confirming -> idle`. It owns its
//! configuration; nothing is shared between sessions.
//!
//! Async calls suspend only while talking to the role directory. A preview is
//! a snapshot of the configuration at call time and carries the session ID, so
//! callers can discard results that arrive after a cancel.

use super::lineage::LineageTracker;
use super::level_estimator::estimate_level;
use super::permission_set::PermissionSetCalculator;
use super::recommendation::RecommendationGenerator;
use super::validation::CloneValidator;
use crate::models::{
    CloneConfiguration, CloneConfigurationPatch, ClonePreview, CloneValidationResult,
    PermissionDiff, Role, RoleDuplicationContext, RoleId, SmartCloneRecommendation,
};
use crate::security::{AccessControl, EnginePermission, OperatorRole};
use crate::storage::RoleDirectory;
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Where a clone session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No clone in progress.
    Idle,
    /// Configuration is being edited.
    Configuring,
    /// A preview has been generated for the current configuration.
    Previewing,
    /// The operator is confirming the previewed clone.
    Confirming,
}

impl SessionState {
    /// Returns the state as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Previewing => "previewing",
            Self::Confirming => "confirming",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of [`CloneSession::execute_clone`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneExecution {
    /// The directory created the role; the session is back to idle.
    Created(Role),
    /// Local validation failed; the directory was not called.
    Rejected(CloneValidationResult),
}

#[derive(Debug, Clone)]
struct ActiveClone {
    session_id: Uuid,
    state: SessionState,
    source: Role,
    configuration: CloneConfiguration,
    preview: Option<ClonePreview>,
    validation_result: Option<CloneValidationResult>,
    recommendations: Vec<SmartCloneRecommendation>,
}

/// Stateful single-role clone workflow.
pub struct CloneSession<D: RoleDirectory> {
    directory: Arc<D>,
    lineage: Option<Arc<LineageTracker<D>>>,
    access: AccessControl,
    operator: OperatorRole,
    context: RoleDuplicationContext,
    calculator: PermissionSetCalculator,
    validator: CloneValidator,
    generator: RecommendationGenerator,
    active: Option<ActiveClone>,
}

impl<D: RoleDirectory> CloneSession<D> {
    /// Creates an idle session operated by an administrator.
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        let calculator = PermissionSetCalculator::default();
        Self {
            directory,
            lineage: None,
            access: AccessControl::new(),
            operator: OperatorRole::Administrator,
            context: RoleDuplicationContext::default(),
            generator: RecommendationGenerator::new(calculator.clone()),
            calculator,
            validator: CloneValidator::default(),
            active: None,
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

    /// Sets the duplication context used for validation.
    #[must_use]
    pub fn with_context(mut self, context: RoleDuplicationContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the validator.
    #[must_use]
    pub const fn with_validator(mut self, validator: CloneValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the permission calculator, used for previews and recommendations.
    #[must_use]
    pub fn with_calculator(mut self, calculator: PermissionSetCalculator) -> Self {
        self.generator = RecommendationGenerator::new(calculator.clone());
        self.calculator = calculator;
        self
    }

    /// Invalidates `tracker`'s cache after each successful clone.
    #[must_use]
    pub fn with_lineage(mut self, tracker: Arc<LineageTracker<D>>) -> Self {
        self.lineage = Some(tracker);
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.active
            .as_ref()
            .map_or(SessionState::Idle, |active| active.state)
    }

    /// Returns `true` while a clone is in progress.
    #[must_use]
    pub const fn is_cloning(&self) -> bool {
        self.active.is_some()
    }

    /// ID of the clone in progress.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|active| active.session_id)
    }

    /// Source role as last fetched.
    #[must_use]
    pub fn source_role(&self) -> Option<&Role> {
        self.active.as_ref().map(|active| &active.source)
    }

    /// Live configuration.
    #[must_use]
    pub fn configuration(&self) -> Option<&CloneConfiguration> {
        self.active.as_ref().map(|active| &active.configuration)
    }

    /// Latest preview.
    #[must_use]
    pub fn clone_preview(&self) -> Option<&ClonePreview> {
        self.active.as_ref().and_then(|active| active.preview.as_ref())
    }

    /// Latest validation result.
    #[must_use]
    pub fn validation_result(&self) -> Option<&CloneValidationResult> {
        self.active
            .as_ref()
            .and_then(|active| active.validation_result.as_ref())
    }

    /// Current recommendations, empty when idle.
    #[must_use]
    pub fn recommendations(&self) -> &[SmartCloneRecommendation] {
        self.active
            .as_ref()
            .map(|active| active.recommendations.as_slice())
            .unwrap_or_default()
    }

    /// Starts cloning `source_role_id`, discarding any clone in progress.
    ///
    /// The default configuration for the source is merged with `initial`.
    /// Returns the first recommendations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without the clone permission, or the
    /// directory's error if the source cannot be fetched. The session is left
    /// unchanged on error.
    #[instrument(skip(self, initial), fields(source_role_id = %source_role_id))]
    pub async fn start_clone(
        &mut self,
        source_role_id: &RoleId,
        initial: Option<CloneConfigurationPatch>,
    ) -> Result<Vec<SmartCloneRecommendation>> {
        self.access.require(self.operator, EnginePermission::CloneRole)?;
        let source = self.directory.get_role(source_role_id).await?;

        let mut configuration = CloneConfiguration::for_source(&source);
        if let Some(patch) = initial {
            configuration.apply(patch);
        }
        let recommendations = self.recommend(&source, &configuration);

        if let Some(previous) = self.active.take() {
            tracing::debug!(
                previous_session_id = %previous.session_id,
                "Discarding clone in progress"
            );
        }
        let session_id = Uuid::new_v4();
        tracing::info!(
            session_id = %session_id,
            clone_type = %configuration.clone_type,
            permission_count = source.permissions.len(),
            "Clone session started"
        );
        self.active = Some(ActiveClone {
            session_id,
            state: SessionState::Configuring,
            source,
            configuration,
            preview: None,
            validation_result: None,
            recommendations: recommendations.clone(),
        });
        Ok(recommendations)
    }

    /// Deep-merges `patch` into the configuration and regenerates recommendations.
    ///
    /// Any preview is dropped and the session returns to `configuring`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] when idle.
    pub fn update_configuration(
        &mut self,
        patch: CloneConfigurationPatch,
    ) -> Result<Vec<SmartCloneRecommendation>> {
        let generator = self.generator.clone();
        let active = self.active_mut("update_configuration")?;
        active.configuration.apply(patch);
        active.recommendations =
            generator.generate(&active.source, &active.configuration, Utc::now().date_naive());
        active.preview = None;
        active.state = SessionState::Configuring;
        Ok(active.recommendations.clone())
    }

    /// Applies an auto-applicable recommendation as a configuration update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a manual recommendation, or
    /// [`Error::PreconditionFailed`] when idle.
    pub fn apply_recommendation(
        &mut self,
        recommendation: &SmartCloneRecommendation,
    ) -> Result<Vec<SmartCloneRecommendation>> {
        if !recommendation.is_auto_applicable {
            return Err(Error::InvalidInput(format!(
                "{} recommendation must be applied manually",
                recommendation.change.kind()
            )));
        }
        self.update_configuration(recommendation.change.to_patch())
    }

    /// Fetches the source, runs the full analysis and stores a preview.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] when idle, [`Error::Unauthorized`]
    /// without the preview permission, or the directory's error. On a
    /// directory error the session returns to `configuring` without a preview.
    #[instrument(skip(self), fields(session_id = ?self.session_id()))]
    pub async fn generate_preview(&mut self) -> Result<ClonePreview> {
        self.access.require(self.operator, EnginePermission::PreviewClone)?;
        let (session_id, configuration) = {
            let active = self.active_ref("generate_preview")?;
            (active.session_id, active.configuration.clone())
        };

        let source = match self.directory.get_role(&configuration.source_role_id).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error = %e, "Preview source fetch failed");
                let active = self.active_mut("generate_preview")?;
                active.preview = None;
                active.state = SessionState::Configuring;
                return Err(e);
            },
        };

        let resulting = self
            .calculator
            .resulting_permissions(&source.permissions, &configuration);
        let estimated_level = estimate_level(&resulting, configuration.clone_type);
        let validation = self.validator.analyze(
            &source,
            &configuration,
            &resulting,
            estimated_level,
            &self.context,
        );
        let diff = PermissionDiff::between(&source.permissions, &resulting);

        let preview = ClonePreview {
            session_id,
            source_role: source.clone(),
            configuration,
            resulting_permissions: resulting,
            added_permissions: diff.added,
            removed_permissions: diff.removed,
            modified_permissions: diff.modified,
            validation_errors: validation.errors().cloned().collect(),
            validation_warnings: validation.warnings().cloned().collect(),
            suggested_improvements: validation.suggestions.clone(),
            estimated_level,
            conflict_analysis: validation.conflict_analysis(),
        };

        metrics::counter!("role_clone_previews_total").increment(1);
        tracing::debug!(
            resulting = preview.resulting_permissions.len(),
            removed = preview.removed_permissions.len(),
            estimated_level,
            executable = preview.is_executable(),
            "Generated clone preview"
        );

        let active = self.active_mut("generate_preview")?;
        active.source = source;
        active.preview = Some(preview.clone());
        active.validation_result = Some(validation);
        active.state = SessionState::Previewing;
        Ok(preview)
    }

    /// Validates the live configuration against the last fetched source.
    ///
    /// Does not change state. Repeated calls on an unchanged configuration
    /// return identical results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] when idle.
    pub fn validate_configuration(&mut self) -> Result<CloneValidationResult> {
        let calculator = self.calculator.clone();
        let validator = self.validator;
        let context = self.context.clone();
        let active = self.active_mut("validate_configuration")?;
        let result = analyze(
            &calculator,
            validator,
            &active.source,
            &active.configuration,
            &context,
        );
        active.validation_result = Some(result.clone());
        Ok(result)
    }

    /// Moves a previewed clone to `confirming`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] unless the session is
    /// `previewing` with an executable preview.
    pub fn request_confirmation(&mut self) -> Result<()> {
        let active = self.active_mut("request_confirmation")?;
        if active.state != SessionState::Previewing {
            return Err(Error::PreconditionFailed(format!(
                "cannot confirm a clone that is {}",
                active.state
            )));
        }
        if !active.preview.as_ref().is_some_and(ClonePreview::is_executable) {
            return Err(Error::PreconditionFailed(
                "preview has blocking errors or conflicts".to_string(),
            ));
        }
        active.state = SessionState::Confirming;
        Ok(())
    }

    /// Re-validates and submits the configuration.
    ///
    /// On success the session returns to idle. On rejection or error the
    /// session is kept so the caller can fix and retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] when idle, [`Error::Unauthorized`]
    /// without the clone permission, or the directory's error.
    #[instrument(skip(self), fields(session_id = ?self.session_id()))]
    pub async fn execute_clone(&mut self) -> Result<CloneExecution> {
        self.access.require(self.operator, EnginePermission::CloneRole)?;
        let configuration = self.active_ref("execute_clone")?.configuration.clone();

        let source = self.directory.get_role(&configuration.source_role_id).await?;
        let validation = analyze(
            &self.calculator,
            self.validator,
            &source,
            &configuration,
            &self.context,
        );
        if !validation.is_valid {
            metrics::counter!("role_clone_executions_total", "outcome" => "rejected").increment(1);
            tracing::info!(
                errors = validation.errors().count(),
                conflicts = validation.conflicts.len(),
                "Clone rejected by validation"
            );
            let active = self.active_mut("execute_clone")?;
            active.source = source;
            active.validation_result = Some(validation.clone());
            return Ok(CloneExecution::Rejected(validation));
        }

        let role = match self.directory.clone_role(&configuration).await {
            Ok(role) => role,
            Err(e) => {
                metrics::counter!("role_clone_executions_total", "outcome" => "failed")
                    .increment(1);
                tracing::warn!(
                    error = %e,
                    recoverable = e.is_recoverable(),
                    "Clone submission failed"
                );
                return Err(e);
            },
        };

        metrics::counter!("role_clone_executions_total", "outcome" => "created").increment(1);
        tracing::info!(role_id = %role.id, "Role cloned");
        if let Some(lineage) = &self.lineage {
            lineage.invalidate_for(&configuration.source_role_id);
        }
        self.active = None;
        Ok(CloneExecution::Created(role))
    }

    /// Clears all session state from any state.
    pub fn cancel_clone(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(
                session_id = %active.session_id,
                state = %active.state,
                "Clone cancelled"
            );
        }
    }

    fn recommend(
        &self,
        source: &Role,
        configuration: &CloneConfiguration,
    ) -> Vec<SmartCloneRecommendation> {
        self.generator
            .generate(source, configuration, Utc::now().date_naive())
    }

    fn active_ref(&self, operation: &str) -> Result<&ActiveClone> {
        self.active
            .as_ref()
            .ok_or_else(|| no_active_clone(operation))
    }

    fn active_mut(&mut self, operation: &str) -> Result<&mut ActiveClone> {
        self.active
            .as_mut()
            .ok_or_else(|| no_active_clone(operation))
    }
}

fn no_active_clone(operation: &str) -> Error {
    Error::PreconditionFailed(format!("{operation} requires an active clone session"))
}

fn analyze(
    calculator: &PermissionSetCalculator,
    validator: CloneValidator,
    source: &Role,
    configuration: &CloneConfiguration,
    context: &RoleDuplicationContext,
) -> CloneValidationResult {
    let resulting = calculator.resulting_permissions(&source.permissions, configuration);
    let estimated_level = estimate_level(&resulting, configuration.clone_type);
    validator.analyze(source, configuration, &resulting, estimated_level, context)
}
