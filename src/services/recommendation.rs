//! Recommendation generation.
//!
//! Produces at most one name suggestion and one level adjustment. Applying an
//! auto-applicable recommendation and regenerating never proposes the same
//! change again.
//!
//! Level suggestions are capped at the source role's level, so applying one
//! never creates a hierarchy conflict. For hierarchy clones the fixed-point
//! search runs over the capped estimate.

use super::level_estimator::{MAX_ESTIMATED_LEVEL, MIN_ESTIMATED_LEVEL, estimate_level};
use super::permission_set::PermissionSetCalculator;
use crate::models::{
    CloneConfiguration, CloneConfigurationPatch, CloneType, RecommendedChange, Role,
    SmartCloneRecommendation,
};
use chrono::NaiveDate;

const NAME_CONFIDENCE: f32 = 0.8;
const LEVEL_CONFIDENCE: f32 = 0.9;

/// Upper bound on fixed-point iterations.
const MAX_LEVEL_ITERATIONS: u32 = MAX_ESTIMATED_LEVEL - MIN_ESTIMATED_LEVEL + 1;

/// Generates recommendations for a configuration.
#[derive(Debug, Clone, Default)]
pub struct RecommendationGenerator {
    calculator: PermissionSetCalculator,
}

impl RecommendationGenerator {
    /// Creates a generator using `calculator` for permission results.
    #[must_use]
    pub const fn new(calculator: PermissionSetCalculator) -> Self {
        Self { calculator }
    }

    /// Generates recommendations; `today` dates the default copy name.
    #[must_use]
    pub fn generate(
        &self,
        source: &Role,
        config: &CloneConfiguration,
        today: NaiveDate,
    ) -> Vec<SmartCloneRecommendation> {
        let mut recommendations = Vec::new();

        if config.new_metadata.name.trim().is_empty() {
            let name = suggested_name(&source.name, config.clone_type, today);
            recommendations.push(SmartCloneRecommendation {
                explanation: format!(
                    "Suggested name for a {} clone of '{}'",
                    config.clone_type, source.name
                ),
                reasoning: vec![
                    "The new role has no name yet".to_string(),
                    format!("Names for {} clones follow a fixed pattern", config.clone_type),
                ],
                change: RecommendedChange::NameSuggestion { name },
                confidence: NAME_CONFIDENCE,
                is_auto_applicable: true,
            });
        }

        if config.inheritance_rules.auto_suggest_level {
            let suggested = self.suggested_level(source, config);
            if let Some(suggested) = suggested.filter(|l| *l != config.new_metadata.level) {
                let permission_count = self
                    .calculator
                    .resulting_permissions(
                        &source.permissions,
                        &config.merged(CloneConfigurationPatch::level(suggested)),
                    )
                    .len();
                recommendations.push(SmartCloneRecommendation {
                    explanation: format!(
                        "Estimated level {suggested} fits the resulting permissions better than {}",
                        config.new_metadata.level
                    ),
                    reasoning: vec![
                        format!("{permission_count} permission(s) after filtering"),
                        format!("Clone type: {}", config.clone_type),
                        format!("Capped at the source level {}", source.level),
                    ],
                    change: RecommendedChange::LevelAdjustment { level: suggested },
                    confidence: LEVEL_CONFIDENCE,
                    is_auto_applicable: true,
                });
            }
        }

        recommendations
    }

    /// Level the estimator settles on for this configuration, capped at
    /// `source.level`.
    ///
    /// Hierarchy clones filter by the target level, so the estimate depends on
    /// the level it suggests. The result is always a fixed point `L` with
    /// `min(estimate(filter(source, L)), source.level) == L`: iteration from the
    /// configured level first, then the fixed point nearest to it. `None` when
    /// no level is stable.
    #[must_use]
    pub fn suggested_level(&self, source: &Role, config: &CloneConfiguration) -> Option<u32> {
        let ceiling = source.level;
        let estimate_at = |level: u32| {
            let mut candidate = config.clone();
            candidate.new_metadata.level = level;
            let resulting = self
                .calculator
                .resulting_permissions(&source.permissions, &candidate);
            estimate_level(&resulting, config.clone_type).min(ceiling)
        };

        if config.clone_type != CloneType::Hierarchy {
            return Some(estimate_at(config.new_metadata.level));
        }

        let mut level = config.new_metadata.level.min(ceiling);
        for _ in 0..MAX_LEVEL_ITERATIONS {
            let next = estimate_at(level);
            if next == level {
                return Some(level);
            }
            level = next;
        }

        // Widening scope adjustments can make the estimate oscillate.
        (MIN_ESTIMATED_LEVEL.min(ceiling)..=ceiling)
            .filter(|candidate| estimate_at(*candidate) == *candidate)
            .min_by_key(|candidate| candidate.abs_diff(config.new_metadata.level))
    }
}

/// Default name for a clone of `base`.
#[must_use]
pub fn suggested_name(base: &str, clone_type: CloneType, today: NaiveDate) -> String {
    match clone_type {
        CloneType::Template => format!("{base} Template"),
        CloneType::Hierarchy => format!("{base} (Modified)"),
        CloneType::Partial => format!("{base} (Partial)"),
        CloneType::Full | CloneType::Permissions => {
            format!("{base} Copy {}", today.format("%Y%m%d"))
        },
    }
}
