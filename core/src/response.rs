use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::plan::Activity;

/// Expert's confidence in a single judgment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown confidence '{other}'")),
        }
    }
}

/// Closed set of session types an expert can recommend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Project,
    LimitBouldering,
    Volume,
    Technique,
    Training,
    LightSession,
    RestDay,
    ActiveRecovery,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::LimitBouldering => "limit_bouldering",
            Self::Volume => "volume",
            Self::Technique => "technique",
            Self::Training => "training",
            Self::LightSession => "light_session",
            Self::RestDay => "rest_day",
            Self::ActiveRecovery => "active_recovery",
        }
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "limit_bouldering" => Ok(Self::LimitBouldering),
            "volume" => Ok(Self::Volume),
            "technique" => Ok(Self::Technique),
            "training" => Ok(Self::Training),
            "light_session" => Ok(Self::LightSession),
            "rest_day" => Ok(Self::RestDay),
            "active_recovery" => Ok(Self::ActiveRecovery),
            other => Err(format!("unknown session type '{other}'")),
        }
    }
}

/// How strongly a treatment lever matters for the scenario at hand.
/// `Neutral` is the default and reads as "no opinion".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Critical,
    Helpful,
    #[default]
    Neutral,
    Avoid,
}

/// Direction a key driver pushed the recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

/// The adjustable levers an expert gives treatment advice on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKey {
    Caffeine,
    WarmupDuration,
    SessionIntensity,
    Timing,
}

impl TreatmentKey {
    pub const ALL: [TreatmentKey; 4] = [
        TreatmentKey::Caffeine,
        TreatmentKey::WarmupDuration,
        TreatmentKey::SessionIntensity,
        TreatmentKey::Timing,
    ];
}

/// One treatment lever: the concrete advice plus how much it matters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TreatmentRecommendation {
    pub value: String,
    pub importance: Importance,
}

/// A hypothesized "if this variable had been different" judgment.
/// `expected_outcome_change` is derived at assembly time: the signed,
/// one-decimal delta of `new_predicted_quality` against the section-1
/// *optimal* prediction (not the baseline one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CounterfactualJudgment {
    pub variable: String,
    pub actual_value: String,
    pub hypothetical_value: String,
    pub new_predicted_quality: f64,
    pub expected_outcome_change: String,
    pub would_change_session_type: bool,
}

/// One of up to three ranked causal drivers. `magnitude` and `reasoning` are
/// placeholders ("medium" / empty) until the capture form collects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KeyDriver {
    pub rank: u8,
    pub variable: String,
    pub direction: Direction,
    pub magnitude: String,
    pub reasoning: String,
}

/// A judged interaction between two situational variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InteractionEffect {
    #[schema(value_type = Vec<String>, max_items = 2, min_items = 2)]
    pub factors: [String; 2],
    pub description: String,
    /// Populated from the "recommendation with both present" field;
    /// empty string when the form omits it, never absent
    pub combined_impact: String,
}

/// Structured session plan. The ordered `activities` list is the canonical
/// representation; the three duration buckets are a derived projection kept
/// for the legacy consumer of this payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionStructure {
    pub activities: Vec<Activity>,
    pub warmup_minutes: u32,
    pub main_minutes: u32,
    pub cooldown_minutes: u32,
    pub specific_recommendations: Vec<String>,
}

/// One expert's normalized judgment for one scenario.
///
/// Unique per (scenario_id, expert_id) — persisting twice for the same pair
/// overwrites, never appends. Quality predictions live in [1,10] with 0.5
/// steps; the model does not clamp (input widgets own that), the domain is
/// documented here so bulk importers can validate before insert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpertResponse {
    pub scenario_id: Uuid,
    pub expert_id: Uuid,
    /// Section 1: predicted session quality under the expert's recommendation
    pub predicted_quality_optimal: f64,
    /// Section 1: predicted quality if the climber trains as planned
    pub predicted_quality_baseline: f64,
    pub prediction_confidence: Confidence,
    /// Section 2. `None` can only appear on saved drafts — submission is
    /// gated on a choice being made.
    pub recommended_session_type: Option<SessionType>,
    pub session_type_confidence: Confidence,
    /// Section 3
    pub treatment_recommendations: BTreeMap<TreatmentKey, TreatmentRecommendation>,
    /// Section 4
    pub counterfactuals: Vec<CounterfactualJudgment>,
    /// Section 5: only slots with a chosen variable, in slot order
    pub key_drivers: Vec<KeyDriver>,
    /// Section 6 (optional)
    pub interaction_effects: Vec<InteractionEffect>,
    /// Section 7 (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_structure: Option<SessionStructure>,
    /// Section 8
    pub reasoning: String,
    /// Wall-clock seconds from panel open to save; absent when the open
    /// timestamp was not captured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_duration_seconds: Option<i64>,
    /// Final submission (true) vs saved draft (false)
    pub is_complete: bool,
}
