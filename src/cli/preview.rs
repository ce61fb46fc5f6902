//! Preview and validate CLI commands.

use super::args::CloneArgs;
use crate::config::EngineConfig;
use crate::models::{ClonePreview, CloneValidationResult, SmartCloneRecommendation};
use crate::services::CloneSession;
use crate::storage::InMemoryRoleDirectory;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// Output of the `preview` command.
#[derive(Debug, Serialize)]
pub struct PreviewReport {
    /// The generated preview.
    pub preview: ClonePreview,
    /// Recommendations for the previewed configuration.
    pub recommendations: Vec<SmartCloneRecommendation>,
}

/// Output of the `validate` command.
#[derive(Debug, Serialize)]
pub struct ValidateReport {
    /// Validation outcome.
    pub validation: CloneValidationResult,
    /// Recommendations for the configuration.
    pub recommendations: Vec<SmartCloneRecommendation>,
}

/// Builds a session over the directory file named in `args`, started and configured.
async fn configured_session(
    args: &CloneArgs,
    config: &EngineConfig,
) -> Result<CloneSession<InMemoryRoleDirectory>> {
    let directory = Arc::new(InMemoryRoleDirectory::load_from_file(&args.directory)?);
    let context = config.duplication_context(directory.role_names()?);
    let mut session = CloneSession::new(directory)
        .with_operator(args.operator_role()?)
        .with_validator(config.validator())
        .with_context(context);
    session
        .start_clone(&args.source_id(), Some(args.to_patch()?))
        .await?;
    Ok(session)
}

/// Generates a preview for the described clone.
///
/// # Errors
///
/// Returns an error if the directory cannot be loaded, the operator is not
/// allowed to preview, or the source role does not exist.
pub async fn cmd_preview(args: &CloneArgs, config: &EngineConfig) -> Result<PreviewReport> {
    let mut session = configured_session(args, config).await?;
    let preview = session.generate_preview().await?;
    Ok(PreviewReport {
        preview,
        recommendations: session.recommendations().to_vec(),
    })
}

/// Validates the described clone.
///
/// # Errors
///
/// Returns an error if the directory cannot be loaded, the operator is not
/// allowed to clone, or the source role does not exist.
pub async fn cmd_validate(args: &CloneArgs, config: &EngineConfig) -> Result<ValidateReport> {
    let mut session = configured_session(args, config).await?;
    let validation = session.validate_configuration()?;
    Ok(ValidateReport {
        validation,
        recommendations: session.recommendations().to_vec(),
    })
}
