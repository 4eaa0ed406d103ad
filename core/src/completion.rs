use serde::{Deserialize, Serialize};

use crate::draft::ReviewDraft;
use crate::response::Importance;
use crate::scenario::SLIDER_MIDPOINT;

pub const SECTION_COUNT: usize = 8;

/// Minimum meaningful reasoning length (trimmed). Anything at or below this
/// reads as a placeholder.
pub const MIN_REASONING_CHARS: usize = 10;

/// Per-section completion flags for one draft. Sections are numbered 1..=8 as
/// in the capture form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMap {
    pub sections: [bool; SECTION_COUNT],
}

impl CompletionMap {
    /// 1-based section lookup
    pub fn section(&self, number: usize) -> bool {
        self.sections[number - 1]
    }

    /// The submission gate: sections 1, 2, 5 and 8. Sections 3 and 4 carry
    /// their own indicators for guidance but never block submission, and 6/7
    /// are optional outright.
    pub fn required_complete(&self) -> bool {
        self.section(1) && self.section(2) && self.section(5) && self.section(8)
    }

    /// Required sections still missing, for error reporting
    pub fn missing_required(&self) -> Vec<usize> {
        [1, 2, 5, 8]
            .into_iter()
            .filter(|&n| !self.section(n))
            .collect()
    }
}

/// Pure completion recomputation. Called explicitly after every draft
/// mutation — there is no reactive recomputation to keep in sync.
pub fn compute_completion(draft: &ReviewDraft) -> CompletionMap {
    let predictions_touched = draft.predicted_quality_optimal != SLIDER_MIDPOINT
        || draft.predicted_quality_baseline != SLIDER_MIDPOINT;

    let sections = [
        // 1 — complete once either outcome slider moved off its default
        predictions_touched,
        // 2 — a session type has been chosen
        draft.recommended_session_type.is_some(),
        // 3 — at least one treatment has an opinion attached
        draft
            .treatments
            .values()
            .any(|t| t.importance != Importance::Neutral),
        // 4 — at least one counterfactual entry exists
        !draft.counterfactuals.is_empty(),
        // 5 — at least one ranked slot holds a variable
        draft
            .key_drivers
            .iter()
            .any(|slot| !slot.variable.is_empty()),
        // 6, 7 — optional sections never block
        true,
        true,
        // 8 — reasoning has meaningful length
        draft.reasoning.trim().chars().count() > MIN_REASONING_CHARS,
    ];

    CompletionMap { sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{Direction, SessionType, TreatmentKey};
    use chrono::Utc;
    use uuid::Uuid;

    fn empty_draft() -> ReviewDraft {
        ReviewDraft::new(Uuid::now_v7(), Uuid::now_v7(), Utc::now())
    }

    /// Draft with exactly the required sections filled in
    fn required_only_draft() -> ReviewDraft {
        let mut draft = empty_draft();
        draft.predicted_quality_optimal = 7.0;
        draft.recommended_session_type = Some(SessionType::Technique);
        draft.set_key_driver(1, "sleep_quality", Direction::Negative);
        draft.reasoning = "poor sleep caps intensity today".to_string();
        draft
    }

    #[test]
    fn optional_sections_are_always_complete() {
        let completion = compute_completion(&empty_draft());
        assert!(completion.section(6));
        assert!(completion.section(7));

        let mut draft = required_only_draft();
        draft.include_session_structure = true;
        let completion = compute_completion(&draft);
        assert!(completion.section(6));
        assert!(completion.section(7));
    }

    #[test]
    fn fresh_draft_has_no_required_section_complete() {
        let completion = compute_completion(&empty_draft());
        assert!(!completion.section(1));
        assert!(!completion.section(2));
        assert!(!completion.section(3));
        assert!(!completion.section(4));
        assert!(!completion.section(5));
        assert!(!completion.section(8));
        assert!(!completion.required_complete());
        assert_eq!(completion.missing_required(), vec![1, 2, 5, 8]);
    }

    #[test]
    fn either_outcome_slider_satisfies_section_one() {
        let mut draft = empty_draft();
        draft.predicted_quality_baseline = 4.5;
        assert!(compute_completion(&draft).section(1));

        let mut draft = empty_draft();
        draft.predicted_quality_optimal = 5.5;
        assert!(compute_completion(&draft).section(1));
    }

    #[test]
    fn treatment_section_needs_a_non_neutral_importance() {
        let mut draft = empty_draft();
        // Changing only the value is not an opinion
        draft.set_treatment(TreatmentKey::Caffeine, "one espresso", Importance::Neutral);
        assert!(!compute_completion(&draft).section(3));

        draft.set_treatment(TreatmentKey::Caffeine, "one espresso", Importance::Helpful);
        assert!(compute_completion(&draft).section(3));
    }

    #[test]
    fn counterfactual_section_needs_one_entry() {
        let mut draft = empty_draft();
        assert!(!compute_completion(&draft).section(4));
        draft.add_counterfactual();
        assert!(compute_completion(&draft).section(4));
    }

    #[test]
    fn reasoning_is_trimmed_before_length_check() {
        let mut draft = empty_draft();
        draft.reasoning = "   short     ".to_string();
        assert!(!compute_completion(&draft).section(8));

        draft.reasoning = "exactly10c".to_string();
        assert!(!compute_completion(&draft).section(8));

        draft.reasoning = "long enough to mean something".to_string();
        assert!(compute_completion(&draft).section(8));
    }

    #[test]
    fn required_gate_is_sections_one_two_five_eight() {
        let draft = required_only_draft();
        let completion = compute_completion(&draft);
        assert!(completion.required_complete());
        // 3, 4 stay incomplete without affecting the gate
        assert!(!completion.section(3));
        assert!(!completion.section(4));

        for strip in 1..=4usize {
            let mut draft = required_only_draft();
            match strip {
                1 => {
                    draft.predicted_quality_optimal = SLIDER_MIDPOINT;
                    draft.predicted_quality_baseline = SLIDER_MIDPOINT;
                }
                2 => draft.recommended_session_type = None,
                3 => draft.clear_key_driver(1),
                _ => draft.reasoning = "too short".to_string(),
            }
            assert!(!compute_completion(&draft).required_complete());
        }
    }

    #[test]
    fn guidance_sections_do_not_unlock_the_gate() {
        let mut draft = empty_draft();
        draft.add_counterfactual();
        draft.set_treatment(TreatmentKey::Timing, "morning", Importance::Critical);
        let completion = compute_completion(&draft);
        assert!(completion.section(3));
        assert!(completion.section(4));
        assert!(!completion.required_complete());
    }
}
