use std::net::SocketAddr;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod error;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crux Review API",
        version = "0.1.0",
        description = "Persistence service for the Crux expert scenario review workflow: synthetic scenarios, expert responses, and the scenario-generation trigger."
    ),
    paths(
        routes::health::health_check,
        routes::scenarios::list_scenarios,
        routes::scenarios::get_scenario,
        routes::scenarios::create_scenario,
        routes::scenarios::update_scenario_status,
        routes::responses::get_response,
        routes::responses::upsert_response,
        routes::ai::ai_status,
        routes::ai::generate_scenarios,
    ),
    components(schemas(
        HealthResponse,
        routes::scenarios::UpdateScenarioStatusRequest,
        routes::ai::AiStatusResponse,
        routes::ai::GenerateScenariosRequest,
        crux_core::error::ApiError,
        crux_core::scenario::Scenario,
        crux_core::scenario::ScenarioStatus,
        crux_core::scenario::DifficultyLevel,
        crux_core::scenario::Snapshot,
        crux_core::scenario::CreateScenarioRequest,
        crux_core::response::ExpertResponse,
        crux_core::response::Confidence,
        crux_core::response::SessionType,
        crux_core::response::Importance,
        crux_core::response::Direction,
        crux_core::response::TreatmentKey,
        crux_core::response::TreatmentRecommendation,
        crux_core::response::CounterfactualJudgment,
        crux_core::response::KeyDriver,
        crux_core::response::InteractionEffect,
        crux_core::response::SessionStructure,
        crux_core::plan::Activity,
        crux_core::plan::ActivityType,
        crux_core::plan::Intensity,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// CORS for the dashboard origin(s), comma-separated in `CRUX_CORS_ORIGINS`
fn build_cors_layer() -> CorsLayer {
    let origins_str =
        std::env::var("CRUX_CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string());

    let origins: Vec<HeaderValue> = origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            HeaderValue::from_str(trimmed).ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("content-type"),
        ])
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crux_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Database connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let app_state = state::AppState {
        db: pool,
        http: reqwest::Client::new(),
        ai: state::AiConfig::from_env(),
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::scenarios::router())
        .merge(routes::responses::router())
        .merge(routes::ai::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer()),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Crux API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
