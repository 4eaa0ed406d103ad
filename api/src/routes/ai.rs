use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crux_core::error::ApiError;

use crate::error::AppError;
use crate::state::AppState;

const MAX_BATCH_SIZE: u32 = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/ai/status", get(ai_status))
        .route("/v1/ai/generate", post(generate_scenarios))
}

/// Whether scenario generation is available, with a masked credential preview
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AiStatusResponse {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_preview: Option<String>,
}

/// Request a batch of generated scenarios
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GenerateScenariosRequest {
    /// How many scenarios to generate (1..=20)
    pub count: u32,
}

fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{prefix}...")
}

/// Report whether the scenario generator is configured
#[utoipa::path(
    get,
    path = "/v1/ai/status",
    responses((status = 200, description = "Generator configuration", body = AiStatusResponse)),
    tag = "ai"
)]
pub async fn ai_status(State(state): State<AppState>) -> Json<AiStatusResponse> {
    Json(AiStatusResponse {
        configured: state.ai.configured(),
        key_preview: state.ai.api_key.as_deref().map(mask_key),
    })
}

/// Trigger a generation batch
///
/// Proxies to the configured generator service. Generation is an opaque
/// action from this API's perspective: upstream failures come back to the
/// caller with the upstream's error text untouched.
#[utoipa::path(
    post,
    path = "/v1/ai/generate",
    request_body = GenerateScenariosRequest,
    responses(
        (status = 200, description = "Generation result from the upstream service"),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 502, description = "Generator failure", body = ApiError)
    ),
    tag = "ai"
)]
pub async fn generate_scenarios(
    State(state): State<AppState>,
    Json(req): Json<GenerateScenariosRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.count == 0 || req.count > MAX_BATCH_SIZE {
        return Err(AppError::Validation {
            message: format!("count must be between 1 and {MAX_BATCH_SIZE}"),
            field: Some("count".to_string()),
            received: Some(serde_json::json!(req.count)),
            docs_hint: None,
        });
    }

    let (Some(generator_url), Some(api_key)) = (&state.ai.generator_url, &state.ai.api_key) else {
        return Err(AppError::Validation {
            message: "Scenario generation is not configured".to_string(),
            field: None,
            received: None,
            docs_hint: Some(
                "Set CRUX_AI_GENERATOR_URL and CRUX_AI_API_KEY on the API service".to_string(),
            ),
        });
    };

    let resp = state
        .http
        .post(format!("{generator_url}/generate"))
        .bearer_auth(api_key)
        .json(&serde_json::json!({ "count": req.count }))
        .send()
        .await
        .map_err(|e| AppError::Upstream {
            detail: format!("Generator unreachable: {e}"),
        })?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp
            .text()
            .await
            .unwrap_or_else(|_| format!("Generator returned HTTP {status}"));
        tracing::warn!(%status, "scenario generation failed");
        return Err(AppError::Upstream { detail });
    }

    let body: serde_json::Value = resp.json().await.map_err(|e| AppError::Upstream {
        detail: format!("Generator returned a non-JSON body: {e}"),
    })?;

    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_preview_is_masked() {
        assert_eq!(mask_key("crux_ai_0123456789abcdef"), "crux_ai_...");
        assert_eq!(mask_key("abc"), "abc...");
    }
}
