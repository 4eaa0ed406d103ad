use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crux_core::error::ApiError;
use crux_core::scenario::{CreateScenarioRequest, Scenario, ScenarioStatus, Snapshot};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/scenarios", get(list_scenarios).post(create_scenario))
        .route("/v1/scenarios/{id}", get(get_scenario))
        .route("/v1/scenarios/{id}/status", patch(update_scenario_status))
}

/// Query parameters for listing scenarios
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListScenariosParams {
    /// Filter by review status (e.g. "pending", "in_review")
    #[serde(default)]
    pub status: Option<String>,
    /// Maximum number of scenarios to return (default 50, max 200)
    #[serde(default)]
    pub limit: Option<i64>,
}

/// List scenarios, newest first
#[utoipa::path(
    get,
    path = "/v1/scenarios",
    params(ListScenariosParams),
    responses(
        (status = 200, description = "Scenarios matching the filter", body = Vec<Scenario>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "scenarios"
)]
pub async fn list_scenarios(
    State(state): State<AppState>,
    Query(params): Query<ListScenariosParams>,
) -> Result<Json<Vec<Scenario>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            s.parse::<ScenarioStatus>().map_err(|_| AppError::Validation {
                message: format!("'{s}' is not a scenario status"),
                field: Some("status".to_string()),
                received: Some(serde_json::Value::String(s.to_string())),
                docs_hint: Some(
                    "One of: pending, in_review, consensus_reached, disputed, needs_discussion, archived"
                        .to_string(),
                ),
            })
        })
        .transpose()?;

    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let rows = if let Some(status) = status {
        sqlx::query_as::<_, ScenarioRow>(
            r#"
            SELECT id, status, difficulty_level, description, tags,
                   baseline_snapshot, pre_session_snapshot,
                   ai_recommendation, ai_reasoning, created_at
            FROM scenarios
            WHERE status = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, ScenarioRow>(
            r#"
            SELECT id, status, difficulty_level, description, tags,
                   baseline_snapshot, pre_session_snapshot,
                   ai_recommendation, ai_reasoning, created_at
            FROM scenarios
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&state.db)
        .await?
    };

    let scenarios = rows
        .into_iter()
        .map(|row| row.into_scenario())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(scenarios))
}

/// Fetch one scenario
#[utoipa::path(
    get,
    path = "/v1/scenarios/{id}",
    params(("id" = Uuid, Path, description = "Scenario ID")),
    responses(
        (status = 200, description = "The scenario", body = Scenario),
        (status = 404, description = "Unknown scenario", body = ApiError)
    ),
    tag = "scenarios"
)]
pub async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Scenario>, AppError> {
    let row = sqlx::query_as::<_, ScenarioRow>(
        r#"
        SELECT id, status, difficulty_level, description, tags,
               baseline_snapshot, pre_session_snapshot,
               ai_recommendation, ai_reasoning, created_at
        FROM scenarios
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found(format!("Scenario {id} does not exist")))?;

    Ok(Json(row.into_scenario()?))
}

/// Author a new scenario
///
/// Used by the authoring screen and by the AI generator. New scenarios start
/// in the `pending` review state.
#[utoipa::path(
    post,
    path = "/v1/scenarios",
    request_body = CreateScenarioRequest,
    responses(
        (status = 201, description = "Scenario created", body = Scenario),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "scenarios"
)]
pub async fn create_scenario(
    State(state): State<AppState>,
    Json(req): Json<CreateScenarioRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::Validation {
            message: "description must not be empty".to_string(),
            field: Some("description".to_string()),
            received: None,
            docs_hint: Some(
                "Give experts one or two sentences framing the situation".to_string(),
            ),
        });
    }

    let row = sqlx::query_as::<_, ScenarioRow>(
        r#"
        INSERT INTO scenarios
            (id, status, difficulty_level, description, tags,
             baseline_snapshot, pre_session_snapshot, ai_recommendation, ai_reasoning)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, status, difficulty_level, description, tags,
                  baseline_snapshot, pre_session_snapshot,
                  ai_recommendation, ai_reasoning, created_at
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(ScenarioStatus::Pending.as_str())
    .bind(req.difficulty_level.as_str())
    .bind(&req.description)
    .bind(&req.tags)
    .bind(serde_json::to_value(&req.baseline_snapshot).unwrap_or_default())
    .bind(serde_json::to_value(&req.pre_session_snapshot).unwrap_or_default())
    .bind(&req.ai_recommendation)
    .bind(&req.ai_reasoning)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row.into_scenario()?)))
}

/// Request to move a scenario to a new review status
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateScenarioStatusRequest {
    pub status: ScenarioStatus,
}

/// Update a scenario's review status
///
/// The review workflow uses this once per scenario, for the
/// pending → in_review transition after the first response lands.
#[utoipa::path(
    patch,
    path = "/v1/scenarios/{id}/status",
    params(("id" = Uuid, Path, description = "Scenario ID")),
    request_body = UpdateScenarioStatusRequest,
    responses(
        (status = 200, description = "Updated scenario", body = Scenario),
        (status = 404, description = "Unknown scenario", body = ApiError)
    ),
    tag = "scenarios"
)]
pub async fn update_scenario_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateScenarioStatusRequest>,
) -> Result<Json<Scenario>, AppError> {
    let row = sqlx::query_as::<_, ScenarioRow>(
        r#"
        UPDATE scenarios
        SET status = $2
        WHERE id = $1
        RETURNING id, status, difficulty_level, description, tags,
                  baseline_snapshot, pre_session_snapshot,
                  ai_recommendation, ai_reasoning, created_at
        "#,
    )
    .bind(id)
    .bind(req.status.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found(format!("Scenario {id} does not exist")))?;

    tracing::info!(scenario_id = %id, status = req.status.as_str(), "scenario status updated");

    Ok(Json(row.into_scenario()?))
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct ScenarioRow {
    id: Uuid,
    status: String,
    difficulty_level: String,
    description: String,
    tags: Vec<String>,
    baseline_snapshot: serde_json::Value,
    pre_session_snapshot: serde_json::Value,
    ai_recommendation: Option<String>,
    ai_reasoning: Option<String>,
    created_at: DateTime<Utc>,
}

impl ScenarioRow {
    fn into_scenario(self) -> Result<Scenario, AppError> {
        let status = self
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        let difficulty_level = self
            .difficulty_level
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;

        // A malformed stored snapshot degrades to an empty map; readers
        // already treat every missing key as unknown.
        let baseline_snapshot =
            serde_json::from_value::<Snapshot>(self.baseline_snapshot).unwrap_or_default();
        let pre_session_snapshot =
            serde_json::from_value::<Snapshot>(self.pre_session_snapshot).unwrap_or_default();

        Ok(Scenario {
            id: self.id,
            status,
            difficulty_level,
            description: self.description,
            tags: self.tags,
            baseline_snapshot,
            pre_session_snapshot,
            ai_recommendation: self.ai_recommendation,
            ai_reasoning: self.ai_reasoning,
            created_at: self.created_at,
        })
    }
}
