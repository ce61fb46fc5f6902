//! Advisory recommendations for a clone configuration.

use super::clone_config::CloneConfigurationPatch;
use serde::{Deserialize, Serialize};

/// What a recommendation proposes, one variant per recommendation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "recommendation_type", rename_all = "snake_case")]
pub enum RecommendedChange {
    /// Use this role name.
    NameSuggestion {
        /// Suggested name.
        name: String,
    },
    /// Use this level.
    LevelAdjustment {
        /// Suggested level.
        level: u32,
    },
}

impl RecommendedChange {
    /// Returns the recommendation type as a string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NameSuggestion { .. } => "name_suggestion",
            Self::LevelAdjustment { .. } => "level_adjustment",
        }
    }

    /// The configuration patch that applies this change.
    #[must_use]
    pub fn to_patch(&self) -> CloneConfigurationPatch {
        match self {
            Self::NameSuggestion { name } => CloneConfigurationPatch::name(name.clone()),
            Self::LevelAdjustment { level } => CloneConfigurationPatch::level(*level),
        }
    }
}

/// A recommendation with its confidence and explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartCloneRecommendation {
    /// Proposed change.
    #[serde(flatten)]
    pub change: RecommendedChange,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// One-line explanation.
    pub explanation: String,
    /// Supporting reasoning lines.
    pub reasoning: Vec<String>,
    /// Whether applying it needs no further input.
    pub is_auto_applicable: bool,
}

impl SmartCloneRecommendation {
    /// Returns `true` if `self` proposes the same kind of change as `other`.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(&self.change) == std::mem::discriminant(&other.change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let rec = SmartCloneRecommendation {
            change: RecommendedChange::LevelAdjustment { level: 42 },
            confidence: 0.9,
            explanation: "estimated".to_string(),
            reasoning: Vec::new(),
            is_auto_applicable: true,
        };
        let value = serde_json::to_value(&rec).expect("should encode");
        assert_eq!(value["recommendation_type"], "level_adjustment");
        assert_eq!(value["level"], 42);
    }

    #[test]
    fn test_patch_targets_single_field() {
        let patch = RecommendedChange::NameSuggestion {
            name: "Concierge Template".to_string(),
        }
        .to_patch();
        let metadata = patch.new_metadata.expect("metadata patch");
        assert_eq!(metadata.name.as_deref(), Some("Concierge Template"));
        assert!(metadata.level.is_none());
        assert!(patch.clone_type.is_none());
    }
}
