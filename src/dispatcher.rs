use crate::api::{ApiError, ChatProvider, Message};
use crate::config::{ProviderProfile, SettingsStore};
use crate::constants::RATE_LIMIT_STATUS;
use crate::prompt::build_messages;
use crate::query::{QueryError, QueryRequest, QueryResult};
use std::sync::Arc;

/// Runs one query against the configured provider, walking fallback models on 429.
///
/// Settings are read from the store on every call. Nothing about the credential
/// or model is cached between dispatches.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn SettingsStore>,
    provider: Arc<dyn ChatProvider>,
    profile: ProviderProfile,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        provider: Arc<dyn ChatProvider>,
        profile: ProviderProfile,
    ) -> Self {
        Self {
            store,
            provider,
            profile,
        }
    }

    pub async fn dispatch(&self, request: QueryRequest) -> QueryResult {
        match self.run(&request).await {
            Ok((text, model)) => QueryResult::success(text, model),
            Err(e) => {
                tracing::warn!("Query failed: {}", e);
                QueryResult::failure(&e)
            }
        }
    }

    async fn run(&self, request: &QueryRequest) -> Result<(String, String), QueryError> {
        request.validate()?;

        let settings = self.store.load().await.map_err(|e| {
            tracing::error!("Failed to load settings: {:#}", e);
            QueryError::Config(format!("could not read settings: {}", e))
        })?;
        let api_key = settings.api_key().ok_or_else(|| {
            QueryError::Config("API key is not configured".to_string())
        })?;

        let messages = build_messages(request);
        let candidates = self.profile.candidates(settings.model.as_deref());

        let Some((primary, fallbacks)) = candidates.split_first() else {
            return Err(QueryError::Config("no model configured".to_string()));
        };

        self.call_with_fallback(api_key, primary, fallbacks, &messages)
            .await
            .map_err(QueryError::from)
    }

    /// The primary is always tried. Fallbacks run only after a 429 from the primary,
    /// and any non-429 failure ends the walk.
    async fn call_with_fallback(
        &self,
        api_key: &str,
        primary: &str,
        fallbacks: &[String],
        messages: &[Message],
    ) -> Result<(String, String), ApiError> {
        let mut last_error = match self.attempt(api_key, primary, messages, 0).await {
            Ok(text) => return Ok((text, primary.to_string())),
            Err(e) if e.status() == Some(RATE_LIMIT_STATUS) && !fallbacks.is_empty() => e,
            Err(e) => return Err(e),
        };

        for (index, model) in fallbacks.iter().enumerate() {
            match self.attempt(api_key, model, messages, index + 1).await {
                Ok(text) => return Ok((text, model.clone())),
                Err(e) if e.status() == Some(RATE_LIMIT_STATUS) => last_error = e,
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            "All {} candidate models were rate limited",
            fallbacks.len() + 1
        );
        Err(last_error)
    }

    async fn attempt(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
        index: usize,
    ) -> Result<String, ApiError> {
        let start = std::time::Instant::now();
        let outcome = self.provider.complete(api_key, model, messages).await;
        let elapsed = start.elapsed();
        match &outcome {
            Ok(text) => tracing::info!(
                "{} answered with {} ({} chars, attempt {}, {:.2}s)",
                self.provider.name(),
                model,
                text.len(),
                index + 1,
                elapsed.as_secs_f64()
            ),
            Err(e) => tracing::info!(
                "{} attempt {} with {} failed (status {:?}): {}",
                self.provider.name(),
                index + 1,
                model,
                e.status(),
                e
            ),
        }
        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{FileSettingsStore, MemorySettingsStore, ProviderKind, Settings};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes in order and records every model it was called with.
    pub(crate) struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, ApiError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(script: Vec<Result<String, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn complete(
            &self,
            _api_key: &str,
            model: &str,
            _messages: &[Message],
        ) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Transport("script exhausted".into())))
        }
    }

    pub(crate) fn profile(models: &[&str]) -> ProviderProfile {
        ProviderProfile {
            name: "Test".into(),
            kind: ProviderKind::OpenAiCompatible,
            base_url: "http://localhost".into(),
            default_model: models[0].to_string(),
            fallback_models: models[1..].iter().map(|m| m.to_string()).collect(),
        }
    }

    pub(crate) fn keyed_store() -> Arc<MemorySettingsStore> {
        Arc::new(MemorySettingsStore::new(Settings {
            api_key: Some("sk-test".into()),
            model: None,
        }))
    }

    fn status(code: u16) -> Result<String, ApiError> {
        Err(ApiError::from_status(code, ""))
    }

    fn dispatcher(
        provider: &Arc<ScriptedProvider>,
        models: &[&str],
    ) -> Dispatcher {
        Dispatcher::new(keyed_store(), provider.clone(), profile(models))
    }

    #[tokio::test]
    async fn test_explain_success_reports_model() {
        let provider = ScriptedProvider::new(vec![Ok("Plants convert light...".into())]);
        let result = dispatcher(&provider, &["primary", "backup"])
            .dispatch(QueryRequest::explain("photosynthesis"))
            .await;

        assert_eq!(
            result,
            QueryResult::success("Plants convert light...", "primary")
        );
        assert_eq!(provider.calls(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_calls() {
        let provider = ScriptedProvider::new(vec![Ok("unused".into())]);
        let store = Arc::new(MemorySettingsStore::default());
        let dispatcher = Dispatcher::new(store, provider.clone(), profile(&["m"]));

        let result = dispatcher.dispatch(QueryRequest::explain("text")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("API key is not configured"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_rejected_before_network() {
        let provider = ScriptedProvider::new(vec![Ok("unused".into())]);
        let result = dispatcher(&provider, &["m"])
            .dispatch(QueryRequest::custom("anything at all", ""))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("a question is required"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_settings_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = Arc::new(FileSettingsStore::new(blocker.join("settings.toml")));
        let provider = ScriptedProvider::new(vec![Ok("unused".into())]);
        let dispatcher = Dispatcher::new(store, provider.clone(), profile(&["m"]));

        let result = dispatcher.dispatch(QueryRequest::explain("text")).await;
        assert!(!result.success);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("could not read settings"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_and_blank_text_reports_question() {
        let provider = ScriptedProvider::new(vec![Ok("unused".into())]);
        let result = dispatcher(&provider, &["m"])
            .dispatch(QueryRequest::custom("", ""))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("a question is required"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_walks_until_kth_candidate_succeeds() {
        let models = ["m0", "m1", "m2", "m3", "m4"];
        for k in 1..models.len() {
            let mut script: Vec<_> = (0..k).map(|_| status(429)).collect();
            script.push(Ok(format!("answer from {}", models[k])));
            let provider = ScriptedProvider::new(script);

            let result = dispatcher(&provider, &models)
                .dispatch(QueryRequest::explain("text"))
                .await;

            assert!(result.success);
            assert_eq!(result.model_used.as_deref(), Some(models[k]));
            assert_eq!(provider.calls(), models[..=k].to_vec());
        }
    }

    #[tokio::test]
    async fn test_non_rate_limit_during_fallback_aborts() {
        let provider = ScriptedProvider::new(vec![status(429), status(500), Ok("never".into())]);
        let result = dispatcher(&provider, &["a", "b", "c"])
            .dispatch(QueryRequest::explain("text"))
            .await;

        assert!(!result.success);
        assert_eq!(result.status_code, Some(500));
        assert_eq!(
            result.error.as_deref(),
            Some("request failed with status 500")
        );
        assert_eq!(provider.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_transport_failure_during_fallback_aborts() {
        let provider = ScriptedProvider::new(vec![
            status(429),
            Err(ApiError::Transport("request timed out".into())),
        ]);
        let result = dispatcher(&provider, &["a", "b", "c"])
            .dispatch(QueryRequest::explain("text"))
            .await;
        assert_eq!(result.error.as_deref(), Some("request timed out"));
        assert_eq!(result.status_code, None);
        assert_eq!(provider.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_all_candidates_rate_limited_returns_last() {
        let provider = ScriptedProvider::new(vec![
            status(429),
            status(429),
            Err(ApiError::from_status(429, r#"{"error":{"message":"slow down"}}"#)),
        ]);
        let result = dispatcher(&provider, &["a", "b", "c"])
            .dispatch(QueryRequest::explain("text"))
            .await;
        assert_eq!(result.status_code, Some(429));
        assert_eq!(result.error.as_deref(), Some("slow down"));
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_first_attempt_other_error_short_circuits() {
        for first in [
            status(401),
            status(500),
            Err(ApiError::EmptyResponse),
            Err(ApiError::Transport("network error: refused".into())),
        ] {
            let provider = ScriptedProvider::new(vec![first, Ok("never".into())]);
            let result = dispatcher(&provider, &["a", "b"])
                .dispatch(QueryRequest::explain("text"))
                .await;
            assert!(!result.success);
            assert!(result.error.is_some());
            assert_eq!(provider.calls(), vec!["a"]);
        }
    }

    #[tokio::test]
    async fn test_single_candidate_rate_limit_has_no_fallback() {
        let provider = ScriptedProvider::new(vec![status(429), Ok("never".into())]);
        let result = dispatcher(&provider, &["only"])
            .dispatch(QueryRequest::explain("text"))
            .await;
        assert_eq!(result.status_code, Some(429));
        assert_eq!(provider.calls(), vec!["only"]);
    }

    #[tokio::test]
    async fn test_settings_model_override_is_primary() {
        let provider = ScriptedProvider::new(vec![status(429), Ok("ok".into())]);
        let store = Arc::new(MemorySettingsStore::new(Settings {
            api_key: Some("sk-test".into()),
            model: Some("chosen".into()),
        }));
        let dispatcher = Dispatcher::new(store, provider.clone(), profile(&["default", "backup"]));

        let result = dispatcher.dispatch(QueryRequest::explain("text")).await;
        assert_eq!(result.model_used.as_deref(), Some("backup"));
        assert_eq!(provider.calls(), vec!["chosen", "backup"]);
    }

    #[tokio::test]
    async fn test_settings_reloaded_each_dispatch() {
        let provider = ScriptedProvider::new(vec![Ok("first".into())]);
        let store = Arc::new(MemorySettingsStore::default());
        let dispatcher = Dispatcher::new(store.clone(), provider.clone(), profile(&["m"]));

        assert!(!dispatcher.dispatch(QueryRequest::explain("t")).await.success);
        store
            .set(Settings {
                api_key: Some("sk-late".into()),
                model: None,
            })
            .await;
        assert!(dispatcher.dispatch(QueryRequest::explain("t")).await.success);
        assert_eq!(provider.calls(), vec!["m"]);
    }

    #[tokio::test]
    async fn test_success_never_has_empty_response() {
        let provider = ScriptedProvider::new(vec![Err(ApiError::EmptyResponse)]);
        let result = dispatcher(&provider, &["m"])
            .dispatch(QueryRequest::explain("photosynthesis"))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no response received"));
        assert!(result.response.is_none());
    }
}
