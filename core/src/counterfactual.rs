use serde::{Deserialize, Serialize};

use crate::scenario::{SLIDER_MIDPOINT, Snapshot};

/// Situational variables an expert can hypothesize about. These mirror the
/// numeric fields of the pre-session snapshot; the catalog is fixed so
/// captured judgments aggregate across experts.
pub const VARIABLE_CATALOG: &[&str] = &[
    "energy_level",
    "motivation",
    "sleep_quality",
    "sleep_hours",
    "stress_level",
    "soreness",
    "days_since_last_session",
    "days_since_rest_day",
    "caffeine_intake",
    "alcohol_units",
    "planned_duration_minutes",
];

pub fn is_catalog_variable(name: &str) -> bool {
    VARIABLE_CATALOG.contains(&name)
}

/// An in-progress counterfactual entry. The derived outcome-change string is
/// computed at assembly time, not stored mid-edit.
///
/// Entries are never deduplicated or merged: an expert may hold two
/// contradictory judgments about the same variable and both are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualDraft {
    pub variable: String,
    pub actual_value: String,
    pub hypothetical_value: String,
    pub new_predicted_quality: f64,
    pub would_change_session_type: bool,
}

impl Default for CounterfactualDraft {
    fn default() -> Self {
        Self {
            variable: String::new(),
            actual_value: String::new(),
            hypothetical_value: String::new(),
            new_predicted_quality: SLIDER_MIDPOINT,
            would_change_session_type: false,
        }
    }
}

impl CounterfactualDraft {
    /// Choose (or change) the variable under hypothesis. The actual value is
    /// read out of the scenario's pre-session snapshot when the field holds a
    /// genuine number; non-numeric or missing snapshot values leave whatever
    /// the entry previously held.
    pub fn select_variable(&mut self, variable: &str, pre_session: &Snapshot) {
        self.variable = variable.to_string();
        if let Some(serde_json::Value::Number(n)) = pre_session.get(variable) {
            self.actual_value = n.to_string();
        }
    }
}

/// Signed outcome delta of a counterfactual, formatted for persistence:
/// one decimal place, explicit `+` for non-negative ("+2.0", "-1.5", "+0.0").
///
/// The baseline subtracted is the section-1 *optimal* prediction, not the
/// baseline prediction.
pub fn format_outcome_change(new_predicted_quality: f64, predicted_quality_optimal: f64) -> String {
    format!("{:+.1}", new_predicted_quality - predicted_quality_optimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pre_session() -> Snapshot {
        serde_json::from_value(json!({
            "sleep_hours": 6.5,
            "energy_level": 4,
            "primary_goal": "send project"
        }))
        .unwrap()
    }

    #[test]
    fn outcome_change_carries_explicit_sign() {
        assert_eq!(format_outcome_change(4.5, 6.0), "-1.5");
        assert_eq!(format_outcome_change(6.0, 6.0), "+0.0");
        assert_eq!(format_outcome_change(8.0, 6.0), "+2.0");
        assert_eq!(format_outcome_change(7.5, 7.0), "+0.5");
    }

    #[test]
    fn selecting_a_variable_autofills_numeric_actuals() {
        let mut entry = CounterfactualDraft::default();
        entry.select_variable("sleep_hours", &pre_session());
        assert_eq!(entry.actual_value, "6.5");

        entry.select_variable("energy_level", &pre_session());
        assert_eq!(entry.actual_value, "4");
    }

    #[test]
    fn non_numeric_snapshot_values_keep_the_previous_actual() {
        let mut entry = CounterfactualDraft::default();
        entry.select_variable("energy_level", &pre_session());
        assert_eq!(entry.actual_value, "4");

        entry.select_variable("primary_goal", &pre_session());
        assert_eq!(entry.variable, "primary_goal");
        assert_eq!(entry.actual_value, "4");

        entry.select_variable("not_in_snapshot", &pre_session());
        assert_eq!(entry.actual_value, "4");
    }

    #[test]
    fn catalog_lookup_is_exact() {
        assert!(is_catalog_variable("sleep_quality"));
        assert!(!is_catalog_variable("sleep"));
    }
}
