use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crux_core::draft::KEY_DRIVER_SLOTS;
use crux_core::error::ApiError;
use crux_core::response::ExpertResponse;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/scenarios/{scenario_id}/responses/{expert_id}",
        get(get_response).put(upsert_response),
    )
}

/// Quality predictions live in [1,10] with 0.5 steps. The review panel's
/// sliders enforce this; bulk importers hit this check instead.
fn quality_in_domain(value: f64) -> bool {
    (1.0..=10.0).contains(&value) && (value * 2.0).fract() == 0.0
}

fn validate_response(response: &ExpertResponse) -> Result<(), AppError> {
    for (field, value) in [
        ("predicted_quality_optimal", response.predicted_quality_optimal),
        ("predicted_quality_baseline", response.predicted_quality_baseline),
    ] {
        if !quality_in_domain(value) {
            return Err(AppError::Validation {
                message: format!("{field} must be between 1 and 10 in steps of 0.5"),
                field: Some(field.to_string()),
                received: Some(serde_json::json!(value)),
                docs_hint: None,
            });
        }
    }

    for (i, cf) in response.counterfactuals.iter().enumerate() {
        if !quality_in_domain(cf.new_predicted_quality) {
            return Err(AppError::Validation {
                message: format!(
                    "counterfactuals[{i}].new_predicted_quality must be between 1 and 10 in steps of 0.5"
                ),
                field: Some(format!("counterfactuals[{i}].new_predicted_quality")),
                received: Some(serde_json::json!(cf.new_predicted_quality)),
                docs_hint: None,
            });
        }
    }

    if response.key_drivers.len() > KEY_DRIVER_SLOTS {
        return Err(AppError::Validation {
            message: format!("at most {KEY_DRIVER_SLOTS} key drivers are captured"),
            field: Some("key_drivers".to_string()),
            received: Some(serde_json::json!(response.key_drivers.len())),
            docs_hint: None,
        });
    }

    for (i, driver) in response.key_drivers.iter().enumerate() {
        if driver.variable.is_empty() {
            return Err(AppError::Validation {
                message: format!("key_drivers[{i}].variable must not be empty"),
                field: Some(format!("key_drivers[{i}].variable")),
                received: None,
                docs_hint: Some("Empty slots are dropped client-side, not persisted".to_string()),
            });
        }
        if !(1..=KEY_DRIVER_SLOTS as u8).contains(&driver.rank) {
            return Err(AppError::Validation {
                message: format!("key_drivers[{i}].rank must be between 1 and {KEY_DRIVER_SLOTS}"),
                field: Some(format!("key_drivers[{i}].rank")),
                received: Some(serde_json::json!(driver.rank)),
                docs_hint: None,
            });
        }
    }

    Ok(())
}

/// Fetch one expert's response to a scenario
#[utoipa::path(
    get,
    path = "/v1/scenarios/{scenario_id}/responses/{expert_id}",
    params(
        ("scenario_id" = Uuid, Path, description = "Scenario ID"),
        ("expert_id" = Uuid, Path, description = "Expert ID")
    ),
    responses(
        (status = 200, description = "The stored response", body = ExpertResponse),
        (status = 404, description = "No response for this pair", body = ApiError)
    ),
    tag = "responses"
)]
pub async fn get_response(
    State(state): State<AppState>,
    Path((scenario_id, expert_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ExpertResponse>, AppError> {
    let row = sqlx::query_as::<_, ResponseRow>(
        r#"
        SELECT scenario_id, expert_id,
               predicted_quality_optimal, predicted_quality_baseline, prediction_confidence,
               recommended_session_type, session_type_confidence,
               treatment_recommendations, counterfactuals, key_drivers, interaction_effects,
               session_structure, reasoning, response_duration_seconds, is_complete
        FROM expert_responses
        WHERE scenario_id = $1 AND expert_id = $2
        "#,
    )
    .bind(scenario_id)
    .bind(expert_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        AppError::not_found(format!(
            "No response from expert {expert_id} for scenario {scenario_id}"
        ))
    })?;

    Ok(Json(row.into_response()?))
}

/// Store an expert's response (draft or final)
///
/// Natural key is (scenario_id, expert_id): a later save overwrites the
/// earlier one, it never appends a second row.
#[utoipa::path(
    put,
    path = "/v1/scenarios/{scenario_id}/responses/{expert_id}",
    params(
        ("scenario_id" = Uuid, Path, description = "Scenario ID"),
        ("expert_id" = Uuid, Path, description = "Expert ID")
    ),
    request_body = ExpertResponse,
    responses(
        (status = 200, description = "Stored response", body = ExpertResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Unknown scenario", body = ApiError)
    ),
    tag = "responses"
)]
pub async fn upsert_response(
    State(state): State<AppState>,
    Path((scenario_id, expert_id)): Path<(Uuid, Uuid)>,
    Json(mut response): Json<ExpertResponse>,
) -> Result<Json<ExpertResponse>, AppError> {
    // The path owns the identity
    response.scenario_id = scenario_id;
    response.expert_id = expert_id;
    validate_response(&response)?;

    let treatment_recommendations = serde_json::to_value(&response.treatment_recommendations)
        .map_err(|e| AppError::Internal(format!("Failed to serialize treatments: {e}")))?;
    let counterfactuals = serde_json::to_value(&response.counterfactuals)
        .map_err(|e| AppError::Internal(format!("Failed to serialize counterfactuals: {e}")))?;
    let key_drivers = serde_json::to_value(&response.key_drivers)
        .map_err(|e| AppError::Internal(format!("Failed to serialize key drivers: {e}")))?;
    let interaction_effects = serde_json::to_value(&response.interaction_effects)
        .map_err(|e| AppError::Internal(format!("Failed to serialize interactions: {e}")))?;
    let session_structure = response
        .session_structure
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Failed to serialize structure: {e}")))?;

    let row = sqlx::query_as::<_, ResponseRow>(
        r#"
        INSERT INTO expert_responses
            (scenario_id, expert_id,
             predicted_quality_optimal, predicted_quality_baseline, prediction_confidence,
             recommended_session_type, session_type_confidence,
             treatment_recommendations, counterfactuals, key_drivers, interaction_effects,
             session_structure, reasoning, response_duration_seconds, is_complete)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (scenario_id, expert_id) DO UPDATE SET
            predicted_quality_optimal = EXCLUDED.predicted_quality_optimal,
            predicted_quality_baseline = EXCLUDED.predicted_quality_baseline,
            prediction_confidence = EXCLUDED.prediction_confidence,
            recommended_session_type = EXCLUDED.recommended_session_type,
            session_type_confidence = EXCLUDED.session_type_confidence,
            treatment_recommendations = EXCLUDED.treatment_recommendations,
            counterfactuals = EXCLUDED.counterfactuals,
            key_drivers = EXCLUDED.key_drivers,
            interaction_effects = EXCLUDED.interaction_effects,
            session_structure = EXCLUDED.session_structure,
            reasoning = EXCLUDED.reasoning,
            response_duration_seconds = EXCLUDED.response_duration_seconds,
            is_complete = EXCLUDED.is_complete,
            updated_at = now()
        RETURNING scenario_id, expert_id,
                  predicted_quality_optimal, predicted_quality_baseline, prediction_confidence,
                  recommended_session_type, session_type_confidence,
                  treatment_recommendations, counterfactuals, key_drivers, interaction_effects,
                  session_structure, reasoning, response_duration_seconds, is_complete
        "#,
    )
    .bind(scenario_id)
    .bind(expert_id)
    .bind(response.predicted_quality_optimal)
    .bind(response.predicted_quality_baseline)
    .bind(response.prediction_confidence.as_str())
    .bind(response.recommended_session_type.map(|t| t.as_str()))
    .bind(response.session_type_confidence.as_str())
    .bind(&treatment_recommendations)
    .bind(&counterfactuals)
    .bind(&key_drivers)
    .bind(&interaction_effects)
    .bind(&session_structure)
    .bind(&response.reasoning)
    .bind(response.response_duration_seconds)
    .bind(response.is_complete)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        // FK violation: the scenario is gone
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some("23503")
        {
            return AppError::not_found(format!("Scenario {scenario_id} does not exist"));
        }
        AppError::Database(e)
    })?;

    tracing::info!(
        %scenario_id, %expert_id,
        is_complete = response.is_complete,
        "expert response stored"
    );

    Ok(Json(row.into_response()?))
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct ResponseRow {
    scenario_id: Uuid,
    expert_id: Uuid,
    predicted_quality_optimal: f64,
    predicted_quality_baseline: f64,
    prediction_confidence: String,
    recommended_session_type: Option<String>,
    session_type_confidence: String,
    treatment_recommendations: serde_json::Value,
    counterfactuals: serde_json::Value,
    key_drivers: serde_json::Value,
    interaction_effects: serde_json::Value,
    session_structure: Option<serde_json::Value>,
    reasoning: String,
    response_duration_seconds: Option<i64>,
    is_complete: bool,
}

impl ResponseRow {
    fn into_response(self) -> Result<ExpertResponse, AppError> {
        let internal = |e: String| AppError::Internal(e);

        Ok(ExpertResponse {
            scenario_id: self.scenario_id,
            expert_id: self.expert_id,
            predicted_quality_optimal: self.predicted_quality_optimal,
            predicted_quality_baseline: self.predicted_quality_baseline,
            prediction_confidence: self.prediction_confidence.parse().map_err(internal)?,
            recommended_session_type: self
                .recommended_session_type
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(internal)?,
            session_type_confidence: self.session_type_confidence.parse().map_err(internal)?,
            treatment_recommendations: serde_json::from_value(self.treatment_recommendations)
                .map_err(|e| AppError::Internal(format!("Malformed stored treatments: {e}")))?,
            counterfactuals: serde_json::from_value(self.counterfactuals)
                .map_err(|e| AppError::Internal(format!("Malformed stored counterfactuals: {e}")))?,
            key_drivers: serde_json::from_value(self.key_drivers)
                .map_err(|e| AppError::Internal(format!("Malformed stored key drivers: {e}")))?,
            interaction_effects: serde_json::from_value(self.interaction_effects)
                .map_err(|e| AppError::Internal(format!("Malformed stored interactions: {e}")))?,
            session_structure: self
                .session_structure
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| AppError::Internal(format!("Malformed stored structure: {e}")))?,
            reasoning: self.reasoning,
            response_duration_seconds: self.response_duration_seconds,
            is_complete: self.is_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_domain_accepts_half_steps_only() {
        assert!(quality_in_domain(1.0));
        assert!(quality_in_domain(5.5));
        assert!(quality_in_domain(10.0));
        assert!(!quality_in_domain(0.5));
        assert!(!quality_in_domain(10.5));
        assert!(!quality_in_domain(6.3));
    }
}
