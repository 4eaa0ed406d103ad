use async_trait::async_trait;
use uuid::Uuid;

use crux_core::response::ExpertResponse;
use crux_core::review::{ReviewError, ReviewStore};
use crux_core::scenario::{Scenario, ScenarioStatus};

use crate::util::client;

/// `ReviewStore` backed by the Crux API over HTTP
pub struct HttpStore {
    api_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client: client(),
        }
    }
}

/// Pull the API's structured `message` out of an error body, falling back to
/// the raw text
async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("API returned HTTP {status}")),
        Err(_) => format!("API returned HTTP {status}"),
    }
}

#[async_trait]
impl ReviewStore for HttpStore {
    async fn get_scenario(&self, id: Uuid) -> Result<Scenario, ReviewError> {
        let resp = self
            .client
            .get(format!("{}/v1/scenarios/{id}", self.api_url))
            .send()
            .await
            .map_err(|e| ReviewError::store(format!("API unreachable: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ReviewError::ScenarioNotFound(id));
        }
        if !resp.status().is_success() {
            return Err(ReviewError::store(error_message(resp).await));
        }

        resp.json()
            .await
            .map_err(|e| ReviewError::store(format!("Malformed scenario payload: {e}")))
    }

    async fn get_response(
        &self,
        scenario_id: Uuid,
        expert_id: Uuid,
    ) -> Result<Option<ExpertResponse>, ReviewError> {
        let resp = self
            .client
            .get(format!(
                "{}/v1/scenarios/{scenario_id}/responses/{expert_id}",
                self.api_url
            ))
            .send()
            .await
            .map_err(|e| ReviewError::store(format!("API unreachable: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ReviewError::store(error_message(resp).await));
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| ReviewError::store(format!("Malformed response payload: {e}")))
    }

    async fn upsert_response(&self, response: &ExpertResponse) -> Result<(), ReviewError> {
        let resp = self
            .client
            .put(format!(
                "{}/v1/scenarios/{}/responses/{}",
                self.api_url, response.scenario_id, response.expert_id
            ))
            .json(response)
            .send()
            .await
            .map_err(|e| ReviewError::store(format!("API unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(ReviewError::store(error_message(resp).await));
        }
        Ok(())
    }

    async fn update_scenario_status(
        &self,
        id: Uuid,
        status: ScenarioStatus,
    ) -> Result<(), ReviewError> {
        let resp = self
            .client
            .patch(format!("{}/v1/scenarios/{id}/status", self.api_url))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .map_err(|e| ReviewError::store(format!("API unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(ReviewError::store(error_message(resp).await));
        }
        Ok(())
    }
}
