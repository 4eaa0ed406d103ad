use sqlx::PgPool;

/// Connection to the external scenario generator. Absent pieces mean the
/// feature is unconfigured; the AI routes report that instead of failing.
#[derive(Clone, Debug, Default)]
pub struct AiConfig {
    pub generator_url: Option<String>,
    pub api_key: Option<String>,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            generator_url: std::env::var("CRUX_AI_GENERATOR_URL").ok().filter(|v| !v.is_empty()),
            api_key: std::env::var("CRUX_AI_API_KEY").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn configured(&self) -> bool {
        self.generator_url.is_some() && self.api_key.is_some()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub http: reqwest::Client,
    pub ai: AiConfig,
}
