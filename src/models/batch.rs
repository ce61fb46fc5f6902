//! Batch clone configuration: N source roles times M variations.

use super::clone_config::{CloneConfiguration, CloneType};
use super::permission::PermissionScope;
use super::role::{Role, RoleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for the source role's name in a name pattern.
pub const SOURCE_NAME_PLACEHOLDER: &str = "{sourceName}";

/// Placeholder for the variation name in a name pattern.
pub const VARIATION_PLACEHOLDER: &str = "{variation}";

/// Default batch name pattern.
pub const DEFAULT_NAME_PATTERN: &str = "{sourceName} - {variation}";

/// Labelling hint for a batch; it does not change planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchType {
    /// Generic variations.
    #[default]
    Variations,
    /// One variation per department.
    Departments,
    /// One variation per property.
    Properties,
    /// One variation per region.
    Regions,
}

impl BatchType {
    /// Returns the batch type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Variations => "variations",
            Self::Departments => "departments",
            Self::Properties => "properties",
            Self::Regions => "regions",
        }
    }
}

impl fmt::Display for BatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Adjustments applied to every clone of a batch or of one variation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchAdjustments {
    /// Clone type override.
    pub clone_type: Option<CloneType>,
    /// Absolute level.
    pub level: Option<u32>,
    /// Level offset from the source role, applied when `level` is unset.
    pub level_delta: Option<i32>,
    /// Description override.
    pub description: Option<String>,
    /// Extra resources to exclude.
    pub exclude_categories: Vec<String>,
    /// Extra scopes to exclude.
    pub exclude_scopes: Vec<PermissionScope>,
}

impl BatchAdjustments {
    /// Layers `overlay` on top of `self`; overlay values win, lists concatenate.
    #[must_use]
    pub fn layered(&self, overlay: &Self) -> Self {
        let mut exclude_categories = self.exclude_categories.clone();
        exclude_categories.extend(overlay.exclude_categories.iter().cloned());
        let mut exclude_scopes = self.exclude_scopes.clone();
        exclude_scopes.extend(overlay.exclude_scopes.iter().copied());
        Self {
            clone_type: overlay.clone_type.or(self.clone_type),
            level: overlay.level.or(self.level),
            level_delta: overlay.level_delta.or(self.level_delta),
            description: overlay
                .description
                .clone()
                .or_else(|| self.description.clone()),
            exclude_categories,
            exclude_scopes,
        }
    }

    fn level_for(&self, source: &Role) -> u32 {
        if let Some(level) = self.level {
            return level;
        }
        let delta = self.level_delta.unwrap_or(0);
        source.level.saturating_add_signed(delta)
    }
}

/// One variation of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchVariation {
    /// Variation name, substituted for `{variation}`.
    pub name: String,
    /// Variation-specific adjustments.
    #[serde(default)]
    pub adjustments: BatchAdjustments,
}

impl BatchVariation {
    /// Creates a variation without adjustments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adjustments: BatchAdjustments::default(),
        }
    }

    /// Sets the variation adjustments.
    #[must_use]
    pub fn with_adjustments(mut self, adjustments: BatchAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }
}

/// Batch clone request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneBatchConfig {
    /// Source role IDs.
    pub source_roles: Vec<RoleId>,
    /// Labelling hint.
    #[serde(default)]
    pub batch_type: BatchType,
    /// Name template with `{sourceName}` / `{variation}` placeholders.
    pub name_pattern: String,
    /// Variations applied to every source.
    pub variations: Vec<BatchVariation>,
    /// Adjustments applied before per-variation ones.
    #[serde(default)]
    pub global_adjustments: BatchAdjustments,
}

impl CloneBatchConfig {
    /// Creates an empty batch for the given sources.
    #[must_use]
    pub fn new(source_roles: Vec<RoleId>, batch_type: BatchType) -> Self {
        Self {
            source_roles,
            batch_type,
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
            variations: Vec::new(),
            global_adjustments: BatchAdjustments::default(),
        }
    }

    /// Number of clone operations this batch produces.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.source_roles.len() * self.variations.len()
    }

    /// Renders the name pattern for one source / variation pair.
    #[must_use]
    pub fn render_name(&self, source_name: &str, variation: &str) -> String {
        self.name_pattern
            .replace(SOURCE_NAME_PLACEHOLDER, source_name)
            .replace(VARIATION_PLACEHOLDER, variation)
    }

    /// Expands the batch into one configuration per source and variation.
    ///
    /// `sources` must hold the fetched roles in `source_roles` order; roles that
    /// are missing from it are skipped. Output is source-major.
    #[must_use]
    pub fn plan(&self, sources: &[Role]) -> Vec<CloneConfiguration> {
        let mut plans = Vec::with_capacity(self.operation_count());
        for source_id in &self.source_roles {
            let Some(source) = sources.iter().find(|r| &r.id == source_id) else {
                continue;
            };
            for variation in &self.variations {
                let adjustments = self.global_adjustments.layered(&variation.adjustments);
                let mut config = CloneConfiguration::for_source(source);
                config.new_metadata.name = self.render_name(&source.name, &variation.name);
                config.new_metadata.level = adjustments.level_for(source);
                config.new_metadata.tags.push(format!("batch:{}", self.batch_type));
                config.new_metadata.tags.push(format!("variation:{}", variation.name));
                if let Some(clone_type) = adjustments.clone_type {
                    config.clone_type = clone_type;
                }
                if let Some(description) = adjustments.description {
                    config.new_metadata.description = description;
                }
                config.permission_filters.exclude_categories = adjustments.exclude_categories;
                config.permission_filters.exclude_scopes = adjustments.exclude_scopes;
                plans.push(config);
            }
        }
        plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<Role> {
        vec![
            Role::new("r1", "Front Desk", 40),
            Role::new("r2", "Housekeeping", 30),
            Role::new("r3", "Maintenance", 30),
        ]
    }

    #[test]
    fn test_three_sources_two_variations_plan_six() {
        let mut batch = CloneBatchConfig::new(
            vec![RoleId::new("r1"), RoleId::new("r2"), RoleId::new("r3")],
            BatchType::Properties,
        );
        batch.variations = vec![BatchVariation::new("Lisbon"), BatchVariation::new("Porto")];

        assert_eq!(batch.operation_count(), 6);
        let plans = batch.plan(&sources());
        assert_eq!(plans.len(), 6);
        assert_eq!(plans[0].new_metadata.name, "Front Desk - Lisbon");
        assert_eq!(plans[5].new_metadata.name, "Maintenance - Porto");
        assert!(plans[0].new_metadata.tags.contains(&"batch:properties".to_string()));
    }

    #[test]
    fn test_variation_overrides_global() {
        let mut batch = CloneBatchConfig::new(vec![RoleId::new("r1")], BatchType::Departments);
        batch.name_pattern = "{variation} {sourceName}".to_string();
        batch.global_adjustments = BatchAdjustments {
            level_delta: Some(-10),
            exclude_categories: vec!["billing".to_string()],
            ..BatchAdjustments::default()
        };
        batch.variations = vec![
            BatchVariation::new("Spa"),
            BatchVariation::new("Kitchen").with_adjustments(BatchAdjustments {
                level: Some(15),
                clone_type: Some(CloneType::Hierarchy),
                exclude_categories: vec!["payroll".to_string()],
                ..BatchAdjustments::default()
            }),
        ];

        let plans = batch.plan(&sources());
        assert_eq!(plans[0].new_metadata.name, "Spa Front Desk");
        assert_eq!(plans[0].new_metadata.level, 30);
        assert_eq!(plans[0].clone_type, CloneType::Full);
        assert_eq!(plans[1].new_metadata.level, 15);
        assert_eq!(plans[1].clone_type, CloneType::Hierarchy);
        assert_eq!(
            plans[1].permission_filters.exclude_categories,
            vec!["billing", "payroll"]
        );
    }

    #[test]
    fn test_negative_delta_saturates() {
        let mut batch = CloneBatchConfig::new(vec![RoleId::new("r2")], BatchType::Variations);
        batch.global_adjustments.level_delta = Some(-500);
        batch.variations = vec![BatchVariation::new("Trainee")];
        let plans = batch.plan(&sources());
        assert_eq!(plans[0].new_metadata.level, 0);
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let mut batch =
            CloneBatchConfig::new(vec![RoleId::new("r1"), RoleId::new("gone")], BatchType::Regions);
        batch.variations = vec![BatchVariation::new("North")];
        assert_eq!(batch.operation_count(), 2);
        assert_eq!(batch.plan(&sources()).len(), 1);
    }
}
