//! Shared clone arguments.

use crate::models::{
    CloneConfigurationPatch, CloneType, InheritanceRulesPatch, PermissionFiltersPatch,
    PermissionId, PermissionScope, RoleId, RoleMetadataPatch,
};
use crate::security::OperatorRole;
use crate::{Error, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments describing one clone configuration.
#[derive(Debug, Clone, Args)]
pub struct CloneArgs {
    /// JSON role directory file.
    #[arg(short, long, env = "ROLEFORGE_DIRECTORY")]
    pub directory: PathBuf,

    /// Source role ID.
    #[arg(short, long)]
    pub source: String,

    /// Clone type: full, permissions, template, partial, hierarchy.
    #[arg(short = 't', long, default_value = "full")]
    pub clone_type: String,

    /// Name of the new role.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Target level.
    #[arg(short, long)]
    pub level: Option<u32>,

    /// Description of the new role.
    #[arg(long)]
    pub description: Option<String>,

    /// Permission IDs to keep (partial clones, repeatable).
    #[arg(long = "select")]
    pub selections: Vec<String>,

    /// Resources to drop (repeatable).
    #[arg(long = "exclude-category")]
    pub exclude_categories: Vec<String>,

    /// Scopes to drop (repeatable).
    #[arg(long = "exclude-scope")]
    pub exclude_scopes: Vec<String>,

    /// Copy the source's user assignments.
    #[arg(long)]
    pub copy_users: bool,

    /// Do not record lineage.
    #[arg(long)]
    pub no_lineage: bool,

    /// Operator role performing the clone.
    #[arg(long, default_value = "role_manager")]
    pub operator: String,
}

impl CloneArgs {
    /// Source role ID.
    #[must_use]
    pub fn source_id(&self) -> RoleId {
        RoleId::new(self.source.trim())
    }

    /// Parses the operator role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown role.
    pub fn operator_role(&self) -> Result<OperatorRole> {
        OperatorRole::parse(&self.operator).ok_or_else(|| {
            Error::InvalidInput(format!("unknown operator role '{}'", self.operator))
        })
    }

    /// Builds the configuration patch described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown scope.
    pub fn to_patch(&self) -> Result<CloneConfigurationPatch> {
        let exclude_scopes = self
            .exclude_scopes
            .iter()
            .map(|s| match PermissionScope::parse(s) {
                PermissionScope::Unknown => {
                    Err(Error::InvalidInput(format!("unknown scope '{s}'")))
                },
                scope => Ok(scope),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CloneConfigurationPatch {
            clone_type: Some(CloneType::parse(&self.clone_type)),
            new_metadata: Some(RoleMetadataPatch {
                name: self.name.clone(),
                description: self.description.clone(),
                level: self.level,
                ..RoleMetadataPatch::default()
            }),
            permission_filters: Some(PermissionFiltersPatch {
                custom_selections: Some(
                    self.selections.iter().map(|s| PermissionId::new(s.trim())).collect(),
                ),
                exclude_categories: Some(self.exclude_categories.clone()),
                exclude_scopes: Some(exclude_scopes),
                ..PermissionFiltersPatch::default()
            }),
            preserve_lineage: Some(!self.no_lineage),
            inheritance_rules: Some(InheritanceRulesPatch {
                copy_user_assignments: Some(self.copy_users),
                ..InheritanceRulesPatch::default()
            }),
            ..CloneConfigurationPatch::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CloneArgs,
    }

    #[test]
    fn test_args_to_patch() {
        let cli = TestCli::parse_from([
            "roleforge",
            "--directory",
            "roles.json",
            "--source",
            "front-desk",
            "-t",
            "partial",
            "--select",
            "p1",
            "--select",
            "p2",
            "--exclude-scope",
            "platform",
        ]);
        let patch = cli.args.to_patch().expect("patch");
        assert_eq!(patch.clone_type, Some(CloneType::Partial));
        let filters = patch.permission_filters.expect("filters");
        assert_eq!(filters.custom_selections.map(|s| s.len()), Some(2));
        assert_eq!(filters.exclude_scopes, Some(vec![PermissionScope::Platform]));
        assert_eq!(cli.args.operator_role().expect("role"), OperatorRole::RoleManager);
    }

    #[test]
    fn test_unknown_scope_rejected() {
        let cli = TestCli::parse_from([
            "roleforge",
            "--directory",
            "roles.json",
            "--source",
            "x",
            "--exclude-scope",
            "galaxy",
        ]);
        assert!(matches!(cli.args.to_patch(), Err(Error::InvalidInput(_))));
    }
}
