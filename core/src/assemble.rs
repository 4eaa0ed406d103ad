use chrono::{DateTime, Utc};

use crate::counterfactual::format_outcome_change;
use crate::draft::ReviewDraft;
use crate::plan::ActivityType;
use crate::response::{
    CounterfactualJudgment, ExpertResponse, InteractionEffect, KeyDriver, SessionStructure,
};

/// Placeholder magnitude until the capture form collects one per driver
const DRIVER_MAGNITUDE: &str = "medium";

/// Normalize a draft into the persistence payload.
///
/// `now` is the save instant; the response duration is the whole-second floor
/// of `now - started_at`, omitted when no open timestamp was captured.
pub fn assemble(draft: &ReviewDraft, now: DateTime<Utc>, is_complete: bool) -> ExpertResponse {
    let response_duration_seconds = draft
        .started_at
        .map(|started| (now - started).num_seconds().max(0));

    let counterfactuals = draft
        .counterfactuals
        .iter()
        .map(|cf| CounterfactualJudgment {
            variable: cf.variable.clone(),
            actual_value: cf.actual_value.clone(),
            hypothetical_value: cf.hypothetical_value.clone(),
            new_predicted_quality: cf.new_predicted_quality,
            expected_outcome_change: format_outcome_change(
                cf.new_predicted_quality,
                draft.predicted_quality_optimal,
            ),
            would_change_session_type: cf.would_change_session_type,
        })
        .collect();

    // Only filled slots persist; slot order is preserved as-is, an empty
    // slot is skipped rather than re-ranking the ones after it.
    let key_drivers = draft
        .key_drivers
        .iter()
        .enumerate()
        .filter(|(_, slot)| !slot.variable.is_empty())
        .map(|(index, slot)| KeyDriver {
            rank: (index + 1) as u8,
            variable: slot.variable.clone(),
            direction: slot.direction,
            magnitude: DRIVER_MAGNITUDE.to_string(),
            reasoning: String::new(),
        })
        .collect();

    let interaction_effects = draft
        .interaction_effects
        .iter()
        .map(|effect| InteractionEffect {
            factors: [effect.first_factor.clone(), effect.second_factor.clone()],
            description: effect.description.clone(),
            combined_impact: effect.combined_impact.clone(),
        })
        .collect();

    let session_structure = draft
        .include_session_structure
        .then(|| assemble_structure(draft));

    ExpertResponse {
        scenario_id: draft.scenario_id,
        expert_id: draft.expert_id,
        predicted_quality_optimal: draft.predicted_quality_optimal,
        predicted_quality_baseline: draft.predicted_quality_baseline,
        prediction_confidence: draft.prediction_confidence,
        recommended_session_type: draft.recommended_session_type,
        session_type_confidence: draft.session_type_confidence,
        treatment_recommendations: draft.treatments.clone(),
        counterfactuals,
        key_drivers,
        interaction_effects,
        session_structure,
        reasoning: draft.reasoning.clone(),
        response_duration_seconds,
        is_complete,
    }
}

/// The ordered activity list is canonical; the warm-up/main/cooldown buckets
/// are derived from it for the legacy consumer of this payload.
fn assemble_structure(draft: &ReviewDraft) -> SessionStructure {
    let mut warmup_minutes = 0;
    let mut main_minutes = 0;
    let mut cooldown_minutes = 0;

    for activity in &draft.plan.activities {
        match activity.activity_type {
            ActivityType::WarmUp => warmup_minutes += activity.duration_minutes,
            ActivityType::Cooldown | ActivityType::Stretching => {
                cooldown_minutes += activity.duration_minutes
            }
            _ => main_minutes += activity.duration_minutes,
        }
    }

    SessionStructure {
        activities: draft.plan.activities.clone(),
        warmup_minutes,
        main_minutes,
        cooldown_minutes,
        specific_recommendations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{Direction, SessionType};
    use chrono::Duration;
    use uuid::Uuid;

    fn draft() -> ReviewDraft {
        ReviewDraft::new(Uuid::now_v7(), Uuid::now_v7(), Utc::now())
    }

    #[test]
    fn counterfactual_delta_subtracts_the_optimal_prediction() {
        let mut draft = draft();
        draft.predicted_quality_optimal = 6.0;
        draft.predicted_quality_baseline = 3.0;
        draft.add_counterfactual().new_predicted_quality = 4.5;
        draft.add_counterfactual().new_predicted_quality = 6.0;

        let response = assemble(&draft, Utc::now(), false);
        assert_eq!(response.counterfactuals[0].expected_outcome_change, "-1.5");
        assert_eq!(response.counterfactuals[1].expected_outcome_change, "+0.0");
    }

    #[test]
    fn empty_key_driver_slots_are_skipped_in_slot_order() {
        let mut draft = draft();
        draft.set_key_driver(1, "sleep_quality", Direction::Negative);
        draft.set_key_driver(3, "motivation", Direction::Positive);

        let response = assemble(&draft, Utc::now(), false);
        assert_eq!(response.key_drivers.len(), 2);
        assert_eq!(response.key_drivers[0].variable, "sleep_quality");
        assert_eq!(response.key_drivers[0].rank, 1);
        assert_eq!(response.key_drivers[1].variable, "motivation");
        assert_eq!(response.key_drivers[1].rank, 3);
        assert!(response
            .key_drivers
            .iter()
            .all(|d| d.magnitude == "medium" && d.reasoning.is_empty()));
    }

    #[test]
    fn interaction_effects_default_combined_impact_to_empty_string() {
        let mut draft = draft();
        let effect = draft.add_interaction_effect();
        effect.first_factor = "sleep_quality".to_string();
        effect.second_factor = "caffeine_intake".to_string();
        effect.description = "caffeine masks sleep debt early, costs later".to_string();

        let response = assemble(&draft, Utc::now(), false);
        assert_eq!(
            response.interaction_effects[0].factors,
            ["sleep_quality".to_string(), "caffeine_intake".to_string()]
        );
        assert_eq!(response.interaction_effects[0].combined_impact, "");
    }

    #[test]
    fn session_structure_is_emitted_only_when_enabled() {
        let mut draft = draft();
        draft.plan.add(ActivityType::WarmUp);
        let response = assemble(&draft, Utc::now(), false);
        assert!(response.session_structure.is_none());

        draft.include_session_structure = true;
        let response = assemble(&draft, Utc::now(), false);
        assert!(response.session_structure.is_some());
    }

    #[test]
    fn structure_buckets_durations_and_keeps_the_activity_list() {
        let mut draft = draft();
        draft.include_session_structure = true;
        draft.plan.add(ActivityType::WarmUp); // 15 warmup
        draft.plan.add(ActivityType::Hangboard); // 30 main
        draft.plan.add(ActivityType::Bouldering); // 30 main
        draft.plan.add(ActivityType::Stretching); // 10 cooldown
        draft.plan.add(ActivityType::Cooldown); // 10 cooldown

        let structure = assemble(&draft, Utc::now(), false).session_structure.unwrap();
        assert_eq!(structure.warmup_minutes, 15);
        assert_eq!(structure.main_minutes, 60);
        assert_eq!(structure.cooldown_minutes, 20);
        assert_eq!(structure.activities.len(), 5);
        assert!(structure.specific_recommendations.is_empty());
    }

    #[test]
    fn duration_is_floored_seconds_since_open() {
        let opened = Utc::now();
        let mut draft = ReviewDraft::new(Uuid::now_v7(), Uuid::now_v7(), opened);

        let response = assemble(&draft, opened + Duration::milliseconds(90_700), true);
        assert_eq!(response.response_duration_seconds, Some(90));

        draft.started_at = None;
        let response = assemble(&draft, Utc::now(), true);
        assert_eq!(response.response_duration_seconds, None);
    }

    #[test]
    fn seeded_draft_reassembles_to_the_prior_payload() {
        let mut original = draft();
        original.predicted_quality_optimal = 8.0;
        original.predicted_quality_baseline = 4.5;
        original.recommended_session_type = Some(SessionType::Project);
        original.set_key_driver(2, "energy_level", Direction::Positive);
        original.reasoning = "well rested, conditions are good".to_string();
        original.include_session_structure = true;
        original.plan.add(ActivityType::WarmUp);
        original.plan.add(ActivityType::Projecting);

        let saved = assemble(&original, Utc::now(), false);
        let reopened = crate::draft::ReviewDraft::from_response(&saved, Utc::now());
        let resaved = assemble(&reopened, Utc::now(), false);

        assert_eq!(resaved.predicted_quality_optimal, saved.predicted_quality_optimal);
        assert_eq!(resaved.recommended_session_type, saved.recommended_session_type);
        assert_eq!(resaved.key_drivers, saved.key_drivers);
        assert_eq!(resaved.session_structure, saved.session_structure);
        assert_eq!(resaved.reasoning, saved.reasoning);
    }
}
