use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::counterfactual::CounterfactualDraft;
use crate::plan::SessionPlan;
use crate::response::{
    Confidence, Direction, ExpertResponse, Importance, SessionType, TreatmentKey,
    TreatmentRecommendation,
};
use crate::scenario::SLIDER_MIDPOINT;

pub const KEY_DRIVER_SLOTS: usize = 3;

/// One of the three ranked key-driver slots. Rank is the slot's position
/// (1-based); an empty `variable` means the slot is unused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyDriverSlot {
    pub variable: String,
    pub direction: Direction,
}

/// An in-progress interaction-effect entry (section 6)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionEffectDraft {
    pub first_factor: String,
    pub second_factor: String,
    pub description: String,
    /// "Recommendation with both present" — optional in the capture form,
    /// persisted as empty string when not filled in
    pub combined_impact: String,
}

/// The expert's in-progress judgment for one (scenario, expert) pair.
///
/// Holds all eight section payloads in their editable form. Mutation happens
/// through plain field access and the small structured helpers below; nothing
/// here validates ranges beyond what input widgets enforce (documented
/// domains live on `ExpertResponse`). Serializable so a client can keep an
/// open panel on disk between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub scenario_id: Uuid,
    pub expert_id: Uuid,
    /// Captured when the panel opens; feeds response_duration_seconds
    pub started_at: Option<DateTime<Utc>>,

    // Section 1 — outcome predictions
    pub predicted_quality_optimal: f64,
    pub predicted_quality_baseline: f64,
    pub prediction_confidence: Confidence,

    // Section 2 — session type
    pub recommended_session_type: Option<SessionType>,
    pub session_type_confidence: Confidence,

    // Section 3 — treatment policy
    pub treatments: BTreeMap<TreatmentKey, TreatmentRecommendation>,

    // Section 4 — counterfactuals
    pub counterfactuals: Vec<CounterfactualDraft>,

    // Section 5 — ranked causal drivers
    pub key_drivers: [KeyDriverSlot; KEY_DRIVER_SLOTS],

    // Section 6 — interaction effects (optional)
    pub interaction_effects: Vec<InteractionEffectDraft>,

    // Section 7 — structured session plan (optional)
    pub include_session_structure: bool,
    pub plan: SessionPlan,

    // Section 8 — free-text reasoning
    pub reasoning: String,
}

fn default_treatments() -> BTreeMap<TreatmentKey, TreatmentRecommendation> {
    let mut map = BTreeMap::new();
    for key in TreatmentKey::ALL {
        let value = match key {
            TreatmentKey::Caffeine => "none",
            TreatmentKey::WarmupDuration => "20",
            TreatmentKey::SessionIntensity => "moderate",
            TreatmentKey::Timing => "afternoon",
        };
        map.insert(
            key,
            TreatmentRecommendation {
                value: value.to_string(),
                importance: Importance::Neutral,
            },
        );
    }
    map
}

impl ReviewDraft {
    /// Fresh draft with documented defaults. `opened_at` is the panel-open
    /// timestamp used later for duration computation.
    pub fn new(scenario_id: Uuid, expert_id: Uuid, opened_at: DateTime<Utc>) -> Self {
        Self {
            scenario_id,
            expert_id,
            started_at: Some(opened_at),
            predicted_quality_optimal: SLIDER_MIDPOINT,
            predicted_quality_baseline: SLIDER_MIDPOINT,
            prediction_confidence: Confidence::Medium,
            recommended_session_type: None,
            session_type_confidence: Confidence::Medium,
            treatments: default_treatments(),
            counterfactuals: Vec::new(),
            key_drivers: Default::default(),
            interaction_effects: Vec::new(),
            include_session_structure: false,
            plan: SessionPlan::new(),
            reasoning: String::new(),
        }
    }

    /// Draft seeded from the expert's earlier response to the same scenario.
    /// Every section is restored; the open timestamp is this panel's, not the
    /// prior response's.
    pub fn from_response(prior: &ExpertResponse, opened_at: DateTime<Utc>) -> Self {
        let mut draft = Self::new(prior.scenario_id, prior.expert_id, opened_at);

        draft.predicted_quality_optimal = prior.predicted_quality_optimal;
        draft.predicted_quality_baseline = prior.predicted_quality_baseline;
        draft.prediction_confidence = prior.prediction_confidence;
        draft.recommended_session_type = prior.recommended_session_type;
        draft.session_type_confidence = prior.session_type_confidence;

        for (key, rec) in &prior.treatment_recommendations {
            draft.treatments.insert(*key, rec.clone());
        }

        draft.counterfactuals = prior
            .counterfactuals
            .iter()
            .map(|cf| CounterfactualDraft {
                variable: cf.variable.clone(),
                actual_value: cf.actual_value.clone(),
                hypothetical_value: cf.hypothetical_value.clone(),
                new_predicted_quality: cf.new_predicted_quality,
                would_change_session_type: cf.would_change_session_type,
            })
            .collect();

        for driver in &prior.key_drivers {
            let rank = driver.rank as usize;
            if (1..=KEY_DRIVER_SLOTS).contains(&rank) {
                draft.key_drivers[rank - 1] = KeyDriverSlot {
                    variable: driver.variable.clone(),
                    direction: driver.direction,
                };
            }
        }

        draft.interaction_effects = prior
            .interaction_effects
            .iter()
            .map(|effect| InteractionEffectDraft {
                first_factor: effect.factors[0].clone(),
                second_factor: effect.factors[1].clone(),
                description: effect.description.clone(),
                combined_impact: effect.combined_impact.clone(),
            })
            .collect();

        if let Some(structure) = &prior.session_structure {
            draft.include_session_structure = true;
            draft.plan = SessionPlan::from_activities(structure.activities.clone());
        }

        draft.reasoning = prior.reasoning.clone();
        draft
    }

    /// Append an empty counterfactual entry and return it for editing
    pub fn add_counterfactual(&mut self) -> &mut CounterfactualDraft {
        self.counterfactuals.push(CounterfactualDraft::default());
        self.counterfactuals.last_mut().unwrap()
    }

    pub fn remove_counterfactual(&mut self, index: usize) {
        if index < self.counterfactuals.len() {
            self.counterfactuals.remove(index);
        }
    }

    /// Fill one of the ranked slots (rank 1..=3). Out-of-range ranks are ignored.
    pub fn set_key_driver(&mut self, rank: usize, variable: &str, direction: Direction) {
        if (1..=KEY_DRIVER_SLOTS).contains(&rank) {
            self.key_drivers[rank - 1] = KeyDriverSlot {
                variable: variable.to_string(),
                direction,
            };
        }
    }

    pub fn clear_key_driver(&mut self, rank: usize) {
        if (1..=KEY_DRIVER_SLOTS).contains(&rank) {
            self.key_drivers[rank - 1] = KeyDriverSlot::default();
        }
    }

    pub fn set_treatment(&mut self, key: TreatmentKey, value: &str, importance: Importance) {
        self.treatments.insert(
            key,
            TreatmentRecommendation {
                value: value.to_string(),
                importance,
            },
        );
    }

    pub fn add_interaction_effect(&mut self) -> &mut InteractionEffectDraft {
        self.interaction_effects.push(InteractionEffectDraft::default());
        self.interaction_effects.last_mut().unwrap()
    }

    pub fn remove_interaction_effect(&mut self, index: usize) {
        if index < self.interaction_effects.len() {
            self.interaction_effects.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{CounterfactualJudgment, KeyDriver};

    fn pair() -> (Uuid, Uuid) {
        (Uuid::now_v7(), Uuid::now_v7())
    }

    #[test]
    fn fresh_draft_takes_documented_defaults() {
        let (scenario_id, expert_id) = pair();
        let draft = ReviewDraft::new(scenario_id, expert_id, Utc::now());

        assert_eq!(draft.predicted_quality_optimal, 5.0);
        assert_eq!(draft.predicted_quality_baseline, 5.0);
        assert_eq!(draft.prediction_confidence, Confidence::Medium);
        assert_eq!(draft.recommended_session_type, None);
        assert_eq!(draft.treatments.len(), 4);
        assert!(draft
            .treatments
            .values()
            .all(|t| t.importance == Importance::Neutral));
        assert!(draft.key_drivers.iter().all(|slot| slot.variable.is_empty()));
        assert!(draft.started_at.is_some());
    }

    #[test]
    fn seeding_restores_key_driver_slots_by_rank() {
        let (scenario_id, expert_id) = pair();
        let prior = ExpertResponse {
            scenario_id,
            expert_id,
            predicted_quality_optimal: 7.5,
            predicted_quality_baseline: 6.0,
            prediction_confidence: Confidence::High,
            recommended_session_type: Some(SessionType::Volume),
            session_type_confidence: Confidence::Low,
            treatment_recommendations: BTreeMap::new(),
            counterfactuals: vec![CounterfactualJudgment {
                variable: "sleep_quality".to_string(),
                actual_value: "3".to_string(),
                hypothetical_value: "8".to_string(),
                new_predicted_quality: 8.0,
                expected_outcome_change: "+0.5".to_string(),
                would_change_session_type: true,
            }],
            key_drivers: vec![
                KeyDriver {
                    rank: 3,
                    variable: "motivation".to_string(),
                    direction: Direction::Positive,
                    magnitude: "medium".to_string(),
                    reasoning: String::new(),
                },
                KeyDriver {
                    rank: 1,
                    variable: "sleep_quality".to_string(),
                    direction: Direction::Negative,
                    magnitude: "medium".to_string(),
                    reasoning: String::new(),
                },
            ],
            interaction_effects: Vec::new(),
            session_structure: None,
            reasoning: "prior reasoning text".to_string(),
            response_duration_seconds: Some(240),
            is_complete: false,
        };

        let draft = ReviewDraft::from_response(&prior, Utc::now());

        assert_eq!(draft.key_drivers[0].variable, "sleep_quality");
        assert_eq!(draft.key_drivers[0].direction, Direction::Negative);
        assert!(draft.key_drivers[1].variable.is_empty());
        assert_eq!(draft.key_drivers[2].variable, "motivation");
        assert_eq!(draft.counterfactuals.len(), 1);
        assert_eq!(draft.counterfactuals[0].new_predicted_quality, 8.0);
        assert_eq!(draft.reasoning, "prior reasoning text");
        assert_eq!(draft.recommended_session_type, Some(SessionType::Volume));
        // Treatments not present in the prior keep their defaults
        assert_eq!(draft.treatments.len(), 4);
    }
}
