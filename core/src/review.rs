use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::assemble::assemble;
use crate::completion::{CompletionMap, compute_completion};
use crate::draft::ReviewDraft;
use crate::response::ExpertResponse;
use crate::scenario::{Scenario, ScenarioStatus};

/// Errors surfaced by the review workflow. Nothing here is fatal to the
/// application — every failure is scoped to one review panel.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Submit attempted before the required sections were complete. The
    /// panel affordance should prevent this; the core still refuses before
    /// any persistence call is made.
    #[error("cannot submit: required sections {missing:?} are incomplete")]
    IncompleteResponse { missing: Vec<usize> },
    #[error("scenario {0} not found")]
    ScenarioNotFound(Uuid),
    /// A persistence collaborator call failed; the draft is retained so the
    /// user can retry without re-entering data.
    #[error("{message}")]
    Store { message: String },
}

impl ReviewError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// Persistence collaborator for the review workflow. One backend per
/// deployment: HTTP against the Crux API in the CLI, in-memory in tests.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get_scenario(&self, id: Uuid) -> Result<Scenario, ReviewError>;

    /// Prior response for a (scenario, expert) pair, if any
    async fn get_response(
        &self,
        scenario_id: Uuid,
        expert_id: Uuid,
    ) -> Result<Option<ExpertResponse>, ReviewError>;

    /// Natural-key upsert: a later save for the same pair overwrites
    async fn upsert_response(&self, response: &ExpertResponse) -> Result<(), ReviewError>;

    async fn update_scenario_status(
        &self,
        id: Uuid,
        status: ScenarioStatus,
    ) -> Result<(), ReviewError>;
}

/// One open review panel: the scenario under judgment plus the expert's
/// mutable draft. Closing without saving discards the draft — cheap cancel,
/// no confirmation, no persistence.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    pub scenario: Scenario,
    pub draft: ReviewDraft,
}

impl ReviewSession {
    /// Open a panel: fetch the scenario, seed the draft from the expert's
    /// prior response when one exists. A failed prior-response lookup is
    /// treated as "no prior response" so the panel stays usable.
    pub async fn open(
        store: &impl ReviewStore,
        scenario_id: Uuid,
        expert_id: Uuid,
    ) -> Result<Self, ReviewError> {
        let scenario = store.get_scenario(scenario_id).await?;
        let opened_at = Utc::now();

        let draft = match store.get_response(scenario_id, expert_id).await {
            Ok(Some(prior)) => ReviewDraft::from_response(&prior, opened_at),
            Ok(None) => ReviewDraft::new(scenario_id, expert_id, opened_at),
            Err(err) => {
                tracing::warn!(%scenario_id, %expert_id, "prior response fetch failed, starting from defaults: {err}");
                ReviewDraft::new(scenario_id, expert_id, opened_at)
            }
        };

        Ok(Self { scenario, draft })
    }

    /// Rehydrate a panel from previously captured state (e.g. a client that
    /// keeps the open draft on disk between invocations)
    pub fn from_parts(scenario: Scenario, draft: ReviewDraft) -> Self {
        Self { scenario, draft }
    }

    /// Recomputed on demand after every mutation
    pub fn completion(&self) -> CompletionMap {
        compute_completion(&self.draft)
    }

    /// Persist the current draft (is_complete = false). Never gated on
    /// completion; the panel stays open.
    pub async fn save_draft(
        &mut self,
        store: &impl ReviewStore,
    ) -> Result<ExpertResponse, ReviewError> {
        let response = assemble(&self.draft, Utc::now(), false);
        store.upsert_response(&response).await?;
        self.advance_if_pending(store).await;
        Ok(response)
    }

    /// Final submission (is_complete = true). Requires the completion gate;
    /// the panel closes only when this returns Ok.
    pub async fn submit(&mut self, store: &impl ReviewStore) -> Result<ExpertResponse, ReviewError> {
        let completion = self.completion();
        if !completion.required_complete() {
            return Err(ReviewError::IncompleteResponse {
                missing: completion.missing_required(),
            });
        }

        let response = assemble(&self.draft, Utc::now(), true);
        store.upsert_response(&response).await?;
        self.advance_if_pending(store).await;

        Ok(response)
    }

    /// The first persisted response (draft or final) to a pending scenario
    /// advances it to in_review, at most once. Sequenced strictly after a
    /// successful upsert; a failure here never fails the save — the response
    /// is stored and the transition is left for the next first responder.
    async fn advance_if_pending(&mut self, store: &impl ReviewStore) {
        if self.scenario.status != ScenarioStatus::Pending {
            return;
        }

        match store
            .update_scenario_status(self.scenario.id, ScenarioStatus::InReview)
            .await
        {
            Ok(()) => self.scenario.status = ScenarioStatus::InReview,
            Err(err) => {
                tracing::warn!(scenario_id = %self.scenario.id, "status transition to in_review failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{Direction, SessionType};
    use crate::scenario::{DifficultyLevel, Snapshot};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MemoryStore {
        scenarios: Mutex<HashMap<Uuid, Scenario>>,
        responses: Mutex<HashMap<(Uuid, Uuid), ExpertResponse>>,
        status_updates: Mutex<Vec<(Uuid, ScenarioStatus)>>,
        fail_get_response: AtomicBool,
        fail_upsert: AtomicBool,
        fail_status_update: AtomicBool,
    }

    impl MemoryStore {
        fn with_scenario(scenario: Scenario) -> Self {
            let store = Self::default();
            store
                .scenarios
                .lock()
                .unwrap()
                .insert(scenario.id, scenario);
            store
        }

        fn response_count(&self) -> usize {
            self.responses.lock().unwrap().len()
        }

        fn status_update_count(&self) -> usize {
            self.status_updates.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReviewStore for MemoryStore {
        async fn get_scenario(&self, id: Uuid) -> Result<Scenario, ReviewError> {
            self.scenarios
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(ReviewError::ScenarioNotFound(id))
        }

        async fn get_response(
            &self,
            scenario_id: Uuid,
            expert_id: Uuid,
        ) -> Result<Option<ExpertResponse>, ReviewError> {
            if self.fail_get_response.load(Ordering::SeqCst) {
                return Err(ReviewError::store("lookup unavailable"));
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(&(scenario_id, expert_id))
                .cloned())
        }

        async fn upsert_response(&self, response: &ExpertResponse) -> Result<(), ReviewError> {
            if self.fail_upsert.load(Ordering::SeqCst) {
                return Err(ReviewError::store("upsert failed"));
            }
            self.responses
                .lock()
                .unwrap()
                .insert((response.scenario_id, response.expert_id), response.clone());
            Ok(())
        }

        async fn update_scenario_status(
            &self,
            id: Uuid,
            status: ScenarioStatus,
        ) -> Result<(), ReviewError> {
            if self.fail_status_update.load(Ordering::SeqCst) {
                return Err(ReviewError::store("status update failed"));
            }
            self.status_updates.lock().unwrap().push((id, status));
            if let Some(scenario) = self.scenarios.lock().unwrap().get_mut(&id) {
                scenario.status = status;
            }
            Ok(())
        }
    }

    fn pending_scenario() -> Scenario {
        Scenario {
            id: Uuid::now_v7(),
            status: ScenarioStatus::Pending,
            difficulty_level: DifficultyLevel::Common,
            description: "tired climber eyeing a limit session".to_string(),
            tags: vec!["fatigue".to_string()],
            baseline_snapshot: Snapshot::default(),
            pre_session_snapshot: Snapshot::default(),
            ai_recommendation: None,
            ai_reasoning: None,
            created_at: Utc::now(),
        }
    }

    fn fill_required(draft: &mut ReviewDraft) {
        draft.predicted_quality_optimal = 7.0;
        draft.recommended_session_type = Some(SessionType::LightSession);
        draft.set_key_driver(1, "soreness", Direction::Negative);
        draft.reasoning = "accumulated fatigue, keep it light".to_string();
    }

    #[tokio::test]
    async fn submit_is_rejected_before_any_persistence_call() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let mut session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();

        let err = session.submit(&store).await.unwrap_err();
        assert!(matches!(err, ReviewError::IncompleteResponse { .. }));
        assert_eq!(store.response_count(), 0);
        assert_eq!(store.status_update_count(), 0);
    }

    #[tokio::test]
    async fn save_draft_is_never_gated_on_completion() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let mut session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();

        let saved = session.save_draft(&store).await.unwrap();
        assert!(!saved.is_complete);
        assert_eq!(store.response_count(), 1);
    }

    #[tokio::test]
    async fn first_persisted_draft_also_advances_a_pending_scenario() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let mut session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();

        session.save_draft(&store).await.unwrap();
        assert_eq!(
            *store.status_updates.lock().unwrap(),
            vec![(scenario.id, ScenarioStatus::InReview)]
        );

        // Saving again, or submitting later, never re-advances
        session.save_draft(&store).await.unwrap();
        fill_required(&mut session.draft);
        session.submit(&store).await.unwrap();
        assert_eq!(store.status_update_count(), 1);
    }

    #[tokio::test]
    async fn saving_twice_overwrites_the_same_pair() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let expert_id = Uuid::now_v7();
        let mut session = ReviewSession::open(&store, scenario.id, expert_id)
            .await
            .unwrap();

        session.draft.reasoning = "first pass".to_string();
        session.save_draft(&store).await.unwrap();
        session.draft.reasoning = "second pass, revised".to_string();
        session.save_draft(&store).await.unwrap();

        assert_eq!(store.response_count(), 1);
        let stored = store
            .get_response(scenario.id, expert_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reasoning, "second pass, revised");
    }

    #[tokio::test]
    async fn first_submit_advances_pending_to_in_review_exactly_once() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let mut session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();
        fill_required(&mut session.draft);

        let response = session.submit(&store).await.unwrap();
        assert!(response.is_complete);
        assert_eq!(
            *store.status_updates.lock().unwrap(),
            vec![(scenario.id, ScenarioStatus::InReview)]
        );

        // Second submit from the same panel: no further transition
        session.submit(&store).await.unwrap();
        assert_eq!(store.status_update_count(), 1);

        // A different expert opening the now-in_review scenario: still none
        let mut second = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();
        fill_required(&mut second.draft);
        second.submit(&store).await.unwrap();
        assert_eq!(store.status_update_count(), 1);
        assert_eq!(store.response_count(), 2);
    }

    #[tokio::test]
    async fn upsert_failure_surfaces_and_skips_the_status_update() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let mut session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();
        fill_required(&mut session.draft);

        store.fail_upsert.store(true, Ordering::SeqCst);
        let err = session.submit(&store).await.unwrap_err();
        assert!(matches!(err, ReviewError::Store { .. }));
        assert_eq!(store.status_update_count(), 0);
        // The draft is untouched and a retry succeeds
        store.fail_upsert.store(false, Ordering::SeqCst);
        session.submit(&store).await.unwrap();
        assert_eq!(store.response_count(), 1);
    }

    #[tokio::test]
    async fn failed_status_transition_still_counts_as_saved() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let mut session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();
        fill_required(&mut session.draft);

        store.fail_status_update.store(true, Ordering::SeqCst);
        let response = session.submit(&store).await.unwrap();
        assert!(response.is_complete);
        assert_eq!(store.response_count(), 1);
    }

    #[tokio::test]
    async fn failed_prior_lookup_opens_with_defaults() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        store.fail_get_response.store(true, Ordering::SeqCst);

        let session = ReviewSession::open(&store, scenario.id, Uuid::now_v7())
            .await
            .unwrap();
        assert_eq!(session.draft.recommended_session_type, None);
        assert!(!session.completion().required_complete());
    }

    #[tokio::test]
    async fn opening_with_a_prior_response_seeds_the_draft() {
        let scenario = pending_scenario();
        let store = MemoryStore::with_scenario(scenario.clone());
        let expert_id = Uuid::now_v7();

        let mut first = ReviewSession::open(&store, scenario.id, expert_id)
            .await
            .unwrap();
        fill_required(&mut first.draft);
        first.save_draft(&store).await.unwrap();

        let reopened = ReviewSession::open(&store, scenario.id, expert_id)
            .await
            .unwrap();
        assert_eq!(
            reopened.draft.recommended_session_type,
            Some(SessionType::LightSession)
        );
        assert_eq!(reopened.draft.key_drivers[0].variable, "soreness");
        assert!(reopened.completion().required_complete());
    }
}
