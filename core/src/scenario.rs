use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Midpoint of the 1..=10 quality/state sliders. Missing snapshot fields
/// degrade to this value, never to zero.
pub const SLIDER_MIDPOINT: f64 = 5.0;

/// Review lifecycle of a scenario. Only pending → in_review is driven by this
/// subsystem; the remaining states are set by the consensus tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Pending,
    InReview,
    ConsensusReached,
    Disputed,
    NeedsDiscussion,
    Archived,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::ConsensusReached => "consensus_reached",
            Self::Disputed => "disputed",
            Self::NeedsDiscussion => "needs_discussion",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ScenarioStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "consensus_reached" => Ok(Self::ConsensusReached),
            "disputed" => Ok(Self::Disputed),
            "needs_discussion" => Ok(Self::NeedsDiscussion),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown scenario status '{other}'")),
        }
    }
}

/// How far from the training-data distribution a synthetic scenario sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Common,
    EdgeCase,
    Extreme,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::EdgeCase => "edge_case",
            Self::Extreme => "extreme",
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "edge_case" => Ok(Self::EdgeCase),
            "extreme" => Ok(Self::Extreme),
            other => Err(format!("unknown difficulty level '{other}'")),
        }
    }
}

/// An opaque key→value snapshot (climber baseline or pre-session state).
///
/// There is no enforced schema version: generators add fields over time and
/// older scenarios lack newer ones. A missing key means "unknown", not zero —
/// readers get `Option` (or an explicit midpoint/"N/A" fallback) and must
/// never panic on absent or oddly-typed values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Snapshot(pub serde_json::Map<String, serde_json::Value>);

impl Snapshot {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Numeric read. Only genuine JSON numbers count; strings like "7" are
    /// left to the caller.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    /// Slider-style read: numeric value, or the midpoint when missing/malformed.
    pub fn slider(&self, key: &str) -> f64 {
        self.numeric(key).unwrap_or(SLIDER_MIDPOINT)
    }

    /// Human-facing rendering of a field, "N/A" when missing.
    pub fn display(&self, key: &str) -> String {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => "N/A".to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Bool(b)) => (if *b { "yes" } else { "no" }).to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// A synthetic climber situation presented for expert judgment. Immutable
/// from the review workflow's perspective apart from its `status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Scenario {
    pub id: Uuid,
    pub status: ScenarioStatus,
    pub difficulty_level: DifficultyLevel,
    /// Free-text framing shown above the snapshots
    pub description: String,
    pub tags: Vec<String>,
    /// Climber profile: experience years, highest grades, training focus,
    /// fear-of-falling, anxiety baseline, injury history
    pub baseline_snapshot: Snapshot,
    /// Situational state: energy, motivation, sleep, stress, soreness,
    /// rest spacing, substances, planned duration, goal, outdoor/pain flags
    pub pre_session_snapshot: Snapshot,
    /// Machine-generated suggestion shown for comparison, never edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to author a new scenario (manual authoring or AI generation)
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScenarioRequest {
    pub description: String,
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub tags: Vec<String>,
    pub baseline_snapshot: Snapshot,
    pub pre_session_snapshot: Snapshot,
    #[serde(default)]
    pub ai_recommendation: Option<String>,
    #[serde(default)]
    pub ai_reasoning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_snapshot_keys_are_unknown_not_zero() {
        let snap = snapshot(json!({ "energy_level": 7 }));

        assert_eq!(snap.numeric("energy_level"), Some(7.0));
        assert_eq!(snap.numeric("sleep_quality"), None);
        assert_eq!(snap.slider("sleep_quality"), SLIDER_MIDPOINT);
        assert_eq!(snap.display("sleep_quality"), "N/A");
    }

    #[test]
    fn non_numeric_values_do_not_read_as_numbers() {
        let snap = snapshot(json!({ "primary_goal": "send project", "outdoor": true }));

        assert_eq!(snap.numeric("primary_goal"), None);
        assert_eq!(snap.slider("primary_goal"), SLIDER_MIDPOINT);
        assert_eq!(snap.display("primary_goal"), "send project");
        assert_eq!(snap.display("outdoor"), "yes");
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ScenarioStatus::Pending,
            ScenarioStatus::InReview,
            ScenarioStatus::ConsensusReached,
            ScenarioStatus::Disputed,
            ScenarioStatus::NeedsDiscussion,
            ScenarioStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<ScenarioStatus>().unwrap(), status);
        }
    }
}
