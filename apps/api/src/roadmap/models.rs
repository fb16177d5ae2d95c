//! Transient roadmap shapes produced by the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Difficulty the provider is asked to pick. Only a view over the draft:
/// the default validator accepts any truthy `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("unknown difficulty level '{other}'")),
        }
    }
}

/// One week of a roadmap, as the prompt asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week: u32,
    pub topics: Vec<String>,
}

/// Number of weeks the prompt requests.
pub const ROADMAP_WEEKS: usize = 12;

/// Provider output that passed validation.
///
/// `level` and `weeks` keep the raw JSON values: validation only guarantees
/// that `level` is truthy and `weeks` is an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapDraft {
    pub level: Value,
    pub weeks: Vec<Value>,
}

impl RoadmapDraft {
    /// The level as one of the known difficulties, if it is one.
    pub fn difficulty(&self) -> Option<DifficultyLevel> {
        self.level.as_str()?.parse().ok()
    }

    /// Typed view of the weeks. Fails if any entry does not fit `WeekPlan`.
    pub fn week_plans(&self) -> Result<Vec<WeekPlan>, serde_json::Error> {
        self.weeks
            .iter()
            .map(|w| serde_json::from_value(w.clone()))
            .collect()
    }
}

/// What a pipeline run returns to the job runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapOutput {
    pub user_id: String,
    pub level: Value,
    pub weeks: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_difficulty_parses_known_levels() {
        let draft = RoadmapDraft {
            level: json!("intermediate"),
            weeks: vec![],
        };
        assert_eq!(draft.difficulty(), Some(DifficultyLevel::Intermediate));
    }

    #[test]
    fn test_difficulty_is_none_for_unknown_or_non_string() {
        let unknown = RoadmapDraft {
            level: json!("expert"),
            weeks: vec![],
        };
        let numeric = RoadmapDraft {
            level: json!(3),
            weeks: vec![],
        };
        assert_eq!(unknown.difficulty(), None);
        assert_eq!(numeric.difficulty(), None);
    }

    #[test]
    fn test_week_plans_typed_view() {
        let draft = RoadmapDraft {
            level: json!("beginner"),
            weeks: vec![
                json!({"week": 1, "topics": ["HTTP", "REST"]}),
                json!({"week": 2, "topics": ["SQL"]}),
            ],
        };
        let plans = draft.week_plans().unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].topics, vec!["HTTP", "REST"]);
        assert_eq!(plans[1].week, 2);
    }

    #[test]
    fn test_week_plans_rejects_odd_entries() {
        let draft = RoadmapDraft {
            level: json!("beginner"),
            weeks: vec![json!("week one")],
        };
        assert!(draft.week_plans().is_err());
    }

    #[test]
    fn test_output_serializes_user_id_in_camel_case() {
        let output = RoadmapOutput {
            user_id: "u1".to_string(),
            level: json!("advanced"),
            weeks: vec![],
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value, json!({"userId": "u1", "level": "advanced", "weeks": []}));
    }

    #[test]
    fn test_difficulty_display_round_trips_through_from_str() {
        for level in [
            DifficultyLevel::Beginner,
            DifficultyLevel::Intermediate,
            DifficultyLevel::Advanced,
        ] {
            assert_eq!(level.to_string().parse::<DifficultyLevel>(), Ok(level));
        }
    }
}
