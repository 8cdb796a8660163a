//! Drives a [`GenerationSession`] against a [`StudioApi`].
//!
//! The controller is cheap to clone; clones share the session, so one task
//! can await [`StudioController::generate`] while another calls
//! [`StudioController::abort`].

use std::sync::Arc;

use aistudio_core::generation::DEFAULT_HISTORY_LIMIT;
use tokio::sync::Mutex;

use crate::api::StudioApi;
use crate::error::ClientError;
use crate::session::{AttemptKind, BeginError, GenerationSession, Settlement};
use crate::types::Generation;

pub struct StudioController<A> {
    api: Arc<A>,
    base_url: String,
    token: String,
    session: Arc<Mutex<GenerationSession>>,
}

impl<A> Clone for StudioController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

impl<A: StudioApi> StudioController<A> {
    /// * `base_url` - Server origin that relative image URLs resolve against.
    /// * `token` - Access token from signup or login.
    pub fn new(api: Arc<A>, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            session: Arc::new(Mutex::new(GenerationSession::new())),
        }
    }

    /// A copy of the current session state.
    pub async fn snapshot(&self) -> GenerationSession {
        self.session.lock().await.clone()
    }

    /// Edit the session (form fields, image) under its lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut GenerationSession) -> R) -> R {
        f(&mut *self.session.lock().await)
    }

    /// Submit the form as a fresh generation.
    pub async fn generate(&self) -> Result<Settlement, BeginError> {
        self.run(AttemptKind::Generate).await
    }

    /// Re-send the last inputs after an overload failure.
    pub async fn retry(&self) -> Result<Settlement, BeginError> {
        self.run(AttemptKind::Retry).await
    }

    /// Cancel the in-flight generation. Returns whether one was running.
    pub async fn abort(&self) -> bool {
        self.session.lock().await.abort()
    }

    /// Replace history with the server's most recent generations.
    pub async fn load_history(&self) -> Result<(), ClientError> {
        let items = self
            .api
            .list_generations(&self.token, DEFAULT_HISTORY_LIMIT)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to load history"))?;
        let items = items.into_iter().map(|g| self.normalize(g)).collect();
        self.session.lock().await.replace_history(items);
        Ok(())
    }

    /// Load a history entry into the form. Returns whether `id` was found.
    pub async fn select_history(&self, id: i64) -> bool {
        self.session.lock().await.select_history(id)
    }

    async fn run(&self, kind: AttemptKind) -> Result<Settlement, BeginError> {
        let attempt = self.session.lock().await.begin(kind)?;

        // The session lock is not held while the request is in flight.
        let outcome = tokio::select! {
            biased;
            () = attempt.cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.api.create_generation(&self.token, &attempt.request, &attempt.cancel) => result,
        };
        let outcome = outcome.map(|g| self.normalize(g));

        Ok(self.session.lock().await.settle(attempt.id, outcome))
    }

    fn normalize(&self, mut generation: Generation) -> Generation {
        generation.image_url = absolute_url(&self.base_url, &generation.image_url);
        generation
    }
}

/// Resolve a root-relative URL against `base_url`; absolute URLs pass through.
pub fn absolute_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{base_url}{url}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use aistudio_core::generation::Style;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::session::Phase;
    use crate::types::{AuthSession, Credentials, GenerationRequest, ImageFile};

    /// Scripted API. `create_generation` optionally parks until released and
    /// never looks at the cancellation token itself.
    #[derive(Default)]
    struct FakeApi {
        outcomes: std::sync::Mutex<VecDeque<Result<Generation, ClientError>>>,
        history: Vec<Generation>,
        started: Notify,
        gate: Option<Notify>,
        requests: std::sync::Mutex<Vec<GenerationRequest>>,
    }

    impl FakeApi {
        fn scripted(outcomes: Vec<Result<Generation, ClientError>>) -> Self {
            Self {
                outcomes: std::sync::Mutex::new(outcomes.into()),
                ..Self::default()
            }
        }

        fn gated(outcomes: Vec<Result<Generation, ClientError>>) -> Self {
            Self {
                gate: Some(Notify::new()),
                ..Self::scripted(outcomes)
            }
        }
    }

    #[async_trait]
    impl StudioApi for FakeApi {
        async fn signup(&self, _: &Credentials) -> Result<AuthSession, ClientError> {
            unimplemented!()
        }

        async fn login(&self, _: &Credentials) -> Result<AuthSession, ClientError> {
            unimplemented!()
        }

        async fn list_generations(
            &self,
            _token: &str,
            limit: i64,
        ) -> Result<Vec<Generation>, ClientError> {
            Ok(self.history.iter().take(limit as usize).cloned().collect())
        }

        async fn create_generation(
            &self,
            _token: &str,
            request: &GenerationRequest,
            _cancel: &CancellationToken,
        ) -> Result<Generation, ClientError> {
            self.requests.lock().unwrap().push(request.clone());
            self.started.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.outcomes.lock().unwrap().pop_front().unwrap()
        }
    }

    fn generation(id: i64) -> Generation {
        Generation {
            id,
            prompt: "Create a futuristic gown".into(),
            style: "Avant-garde".into(),
            image_url: format!("/uploads/{id}-gown.png"),
            created_at: "2024-01-01T00:00:00Z".into(),
            status: "completed".into(),
        }
    }

    fn overloaded() -> ClientError {
        ClientError::Api {
            status: 503,
            message: "Model overloaded".into(),
        }
    }

    async fn ready(api: FakeApi) -> (StudioController<FakeApi>, Arc<FakeApi>) {
        let api = Arc::new(api);
        let controller = StudioController::new(Arc::clone(&api), "http://localhost:4000/", "tok");
        controller
            .update(|s| {
                s.prompt = "Create a futuristic gown".into();
                s.style = Style::AvantGarde;
                s.image = Some(ImageFile {
                    filename: "gown.png".into(),
                    content_type: "image/png".into(),
                    bytes: b"\x89PNG\r\n\x1a\n".to_vec(),
                });
            })
            .await;
        (controller, api)
    }

    #[tokio::test]
    async fn generate_success_updates_history_with_absolute_url() {
        let (controller, _) = ready(FakeApi::scripted(vec![Ok(generation(1))])).await;

        assert_eq!(controller.generate().await, Ok(Settlement::Succeeded));

        let session = controller.snapshot().await;
        assert_eq!(session.history()[0].image_url, "http://localhost:4000/uploads/1-gown.png");
        assert_eq!(session.preview.as_deref(), Some("http://localhost:4000/uploads/1-gown.png"));
    }

    #[tokio::test]
    async fn retry_reuses_inputs_until_exhausted() {
        let outcomes = (0..4).map(|_| Err(overloaded())).collect();
        let (controller, api) = ready(FakeApi::scripted(outcomes)).await;

        assert_eq!(controller.generate().await, Ok(Settlement::Failed));
        for _ in 0..3 {
            assert_eq!(controller.retry().await, Ok(Settlement::Failed));
        }
        assert_eq!(controller.retry().await, Err(BeginError::RetryUnavailable));

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| *r == requests[0]));
    }

    #[tokio::test]
    async fn abort_before_settle_prevents_history_mutation() {
        let (controller, api) = ready(FakeApi::gated(vec![Ok(generation(1))])).await;

        let running = tokio::spawn({
            let controller = controller.clone();
            async move { controller.generate().await }
        });
        api.started.notified().await;
        assert_eq!(controller.snapshot().await.phase(), Phase::Submitting);

        assert!(controller.abort().await);
        // The underlying call would still succeed if allowed to finish.
        if let Some(gate) = &api.gate {
            gate.notify_one();
        }

        let settled = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled, Ok(Settlement::Ignored));

        let session = controller.snapshot().await;
        assert_eq!(session.phase(), Phase::Aborted);
        assert!(session.history().is_empty());
        assert_eq!(session.preview, None);
    }

    #[tokio::test]
    async fn load_and_select_history() {
        let api = FakeApi {
            history: (1..=7).rev().map(generation).collect(),
            ..FakeApi::default()
        };
        let (controller, _) = ready(api).await;

        controller.load_history().await.unwrap();
        let session = controller.snapshot().await;
        assert_eq!(session.history().len(), 5);
        assert_eq!(session.history()[0].id, 7);

        assert!(controller.select_history(6).await);
        let session = controller.snapshot().await;
        assert_eq!(session.preview.as_deref(), Some("http://localhost:4000/uploads/6-gown.png"));
    }

    #[test]
    fn absolute_url_passes_through_absolute() {
        assert_eq!(absolute_url("http://a", "https://cdn/x.png"), "https://cdn/x.png");
        assert_eq!(absolute_url("http://a", "/uploads/x.png"), "http://a/uploads/x.png");
    }
}
