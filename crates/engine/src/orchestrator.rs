//! The answer pipeline: retrieve, compose, generate, parse, persist.
//!
//! Each request walks a fixed sequence of phases. Retrieval failures degrade
//! the request to an LLM-only answer; provider and parser failures are fatal.
//! History persistence is best-effort and never fails a request.

use crate::greeting;
use crate::history::ConversationHistory;
use crate::memory::ConversationMemory;
use crate::parser::parse_answer;
use crate::types::{AnswerRequest, AnswerResponse, MemoryStats, StructuredAnswer};
use mizan_core::config::MemorySettings;
use mizan_core::{EngineError, EngineResult, Role};
use mizan_llm::ProviderGateway;
use mizan_prompt::PromptComposer;
use mizan_retrieval::{rank_chunks, Chunk, ChunkStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pipeline phase, attached to log events for request tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Received,
    Retrieving,
    Composing,
    Generating,
    Parsing,
    Persisting,
    Done,
    Failed,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Retrieving => "retrieving",
            Self::Composing => "composing",
            Self::Generating => "generating",
            Self::Parsing => "parsing",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Retrieval knobs applied per request.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalPolicy {
    /// Chunks requested from the store
    pub top_k: usize,

    /// Chunks kept after ranking
    pub max_sources: usize,

    /// Minimum relevance score to keep a chunk
    pub min_score: f32,
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_sources: 5,
            min_score: 0.2,
        }
    }
}

/// The conversation engine. One instance serves many conversations.
pub struct AnswerEngine {
    store: Arc<dyn ChunkStore>,
    gateway: ProviderGateway,
    composer: PromptComposer,
    memory: ConversationMemory,
    history: Option<ConversationHistory>,
    policy: RetrievalPolicy,
}

impl AnswerEngine {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        gateway: ProviderGateway,
        composer: PromptComposer,
        memory: ConversationMemory,
    ) -> Self {
        Self {
            store,
            gateway,
            composer,
            memory,
            history: None,
            policy: RetrievalPolicy::default(),
        }
    }

    /// Attach a durable conversation store.
    pub fn with_history(mut self, history: ConversationHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_retrieval_policy(mut self, policy: RetrievalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Answer one request end to end.
    ///
    /// # Errors
    /// `EmptyInput` for a blank message; `Provider` when generation fails
    /// after the fallback policy is exhausted. Retrieval and history failures
    /// never surface here.
    pub async fn answer(&self, request: AnswerRequest) -> EngineResult<AnswerResponse> {
        match self.run(request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                tracing::error!(
                    phase = RequestPhase::Failed.as_str(),
                    error = %err,
                    "Answer request failed"
                );
                Err(err)
            }
        }
    }

    async fn run(&self, request: AnswerRequest) -> EngineResult<AnswerResponse> {
        if request.message.trim().is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        debug!(
            phase = RequestPhase::Received.as_str(),
            conversation = %conversation_id,
            tone = request.tone.as_str(),
            "Handling answer request"
        );

        if let Some(settings) = &request.memory_settings {
            self.set_memory_settings(settings);
        }

        if greeting::is_greeting(&request.message) {
            debug!(conversation = %conversation_id, "Greeting short-circuit");
            let answer = greeting::greeting_answer();
            self.remember_and_persist(&conversation_id, &request.message, &answer, &[]);
            return Ok(AnswerResponse {
                conversation_id,
                answer,
                sources: Vec::new(),
            });
        }

        debug!(phase = RequestPhase::Retrieving.as_str(), top_k = self.policy.top_k);
        let chunks = match self.store.search(&request.message, self.policy.top_k).await {
            Ok(chunks) => chunks,
            Err(err) => {
                warn!(error = %err, "Retrieval failed, degrading to an LLM-only answer");
                Vec::new()
            }
        };
        let sources = rank_chunks(chunks, self.policy.max_sources, self.policy.min_score);

        debug!(
            phase = RequestPhase::Composing.as_str(),
            sources = sources.len()
        );
        let window = self.memory.window(&conversation_id);
        let prompt = self
            .composer
            .compose(&request.message, &sources, &window, request.tone)?;

        debug!(
            phase = RequestPhase::Generating.as_str(),
            provider = self.gateway.provider_name()
        );
        let completion = self.gateway.complete(&prompt, None).await?;

        debug!(phase = RequestPhase::Parsing.as_str());
        let answer = parse_answer(&completion.text)?;

        debug!(phase = RequestPhase::Persisting.as_str());
        self.remember_and_persist(&conversation_id, &request.message, &answer, &sources);

        debug!(phase = RequestPhase::Done.as_str(), conversation = %conversation_id);
        Ok(AnswerResponse {
            conversation_id,
            answer,
            sources,
        })
    }

    /// Forget a conversation's memory window. Durable history is untouched.
    pub fn clear_memory(&self, conversation_id: &str) {
        self.memory.clear(conversation_id);
    }

    pub fn memory_stats(&self, conversation_id: &str) -> MemoryStats {
        self.memory.stats(conversation_id)
    }

    pub fn set_memory_settings(&self, settings: &MemorySettings) {
        self.memory.set_enabled(settings.enabled);
        self.memory.set_window_size(settings.window_size);
    }

    /// The attached history store, when configured.
    pub fn history(&self) -> Option<&ConversationHistory> {
        self.history.as_ref()
    }

    fn remember_and_persist(
        &self,
        conversation_id: &str,
        question: &str,
        answer: &StructuredAnswer,
        sources: &[Chunk],
    ) {
        self.memory
            .record(conversation_id, question, &answer.main_text);

        let Some(history) = &self.history else {
            return;
        };
        let persisted = history
            .ensure_conversation(conversation_id, question)
            .and_then(|_| history.add_message(conversation_id, Role::User, question, &[]))
            .and_then(|_| {
                history.add_message(
                    conversation_id,
                    Role::Assistant,
                    &answer.to_markdown(),
                    sources,
                )
            });
        if let Err(err) = persisted {
            warn!(error = %err, conversation = %conversation_id, "History persistence failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mizan_core::ProviderErrorKind;
    use mizan_llm::{CompletionBackend, CompletionRequest, CompletionResponse, GatewayConfig};
    use mizan_prompt::{ComposerConfig, Tone};
    use std::sync::Mutex;

    struct FixedStore(Vec<Chunk>);

    #[async_trait::async_trait]
    impl ChunkStore for FixedStore {
        async fn search(&self, _query: &str, _top_k: usize) -> EngineResult<Vec<Chunk>> {
            Ok(self.0.clone())
        }
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl ChunkStore for FailingStore {
        async fn search(&self, _query: &str, _top_k: usize) -> EngineResult<Vec<Chunk>> {
            Err(EngineError::RetrievalUnavailable("store is down".to_string()))
        }
    }

    /// Backend returning canned text and capturing the last prompt it saw.
    struct CannedBackend {
        text: String,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedBackend {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionBackend for CannedBackend {
        fn provider_name(&self) -> &'static str {
            "mock"
        }

        async fn complete(&self, request: &CompletionRequest) -> EngineResult<CompletionResponse> {
            *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());
            Ok(CompletionResponse {
                text: self.text.clone(),
                model: request.model.clone(),
                usage: Default::default(),
            })
        }
    }

    struct RefusingBackend;

    #[async_trait::async_trait]
    impl CompletionBackend for RefusingBackend {
        fn provider_name(&self) -> &'static str {
            "mock"
        }

        async fn complete(&self, _request: &CompletionRequest) -> EngineResult<CompletionResponse> {
            Err(EngineError::provider(ProviderErrorKind::Auth, "no key"))
        }
    }

    fn sample_chunk(id: &str, page: u32, score: f32) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("chunk {}", id),
            page,
            source_file: "standards.pdf".to_string(),
            score,
        }
    }

    fn engine_with(
        store: Arc<dyn ChunkStore>,
        backend: Arc<dyn CompletionBackend>,
    ) -> AnswerEngine {
        AnswerEngine::new(
            store,
            ProviderGateway::new(backend, GatewayConfig::new("model")),
            PromptComposer::new(ComposerConfig::default()).unwrap(),
            ConversationMemory::new(5, true),
        )
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RequestPhase::Received.as_str(), "received");
        assert_eq!(RequestPhase::Done.as_str(), "done");
        assert_eq!(RequestPhase::Failed.as_str(), "failed");
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let backend = Arc::new(CannedBackend::new(
            "Murabaha needs ownership first [Page 12 | standards.pdf].",
        ));
        let store = Arc::new(FixedStore(vec![
            sample_chunk("a", 12, 0.9),
            sample_chunk("b", 30, 0.7),
        ]));
        let engine = engine_with(store, backend.clone());

        let response = engine
            .answer(AnswerRequest::new("What is Murabaha?"))
            .await
            .unwrap();

        assert!(!response.conversation_id.is_empty());
        assert!(response.answer.main_text.contains("Murabaha"));
        assert_eq!(response.answer.citations.len(), 1);
        assert_eq!(response.sources.len(), 2);

        // The retrieved context made it into the prompt
        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("chunk a"));
        assert!(prompt.contains("What is Murabaha?"));

        // Memory recorded the pair
        let stats = engine.memory_stats(&response.conversation_id);
        assert_eq!(stats.pair_count, 1);
    }

    #[tokio::test]
    async fn test_every_returned_source_reaches_the_prompt() {
        let backend = Arc::new(CannedBackend::new("Grounded answer."));
        let chunks: Vec<Chunk> = ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(i, id)| sample_chunk(id, i as u32 + 1, 0.9 - i as f32 * 0.1))
            .collect();
        let engine = engine_with(Arc::new(FixedStore(chunks)), backend.clone());

        let response = engine
            .answer(AnswerRequest::new("What backs a Sukuk issuance?"))
            .await
            .unwrap();

        assert_eq!(response.sources.len(), 5);
        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        for source in &response.sources {
            assert!(prompt.contains(&source.text), "missing {}", source.id);
        }
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades() {
        let backend = Arc::new(CannedBackend::new("An answer without sources."));
        let engine = engine_with(Arc::new(FailingStore), backend);

        let response = engine.answer(AnswerRequest::new("What is Riba?")).await.unwrap();
        assert!(response.sources.is_empty());
        assert_eq!(response.answer.main_text, "An answer without sources.");
    }

    #[tokio::test]
    async fn test_provider_failure_is_fatal() {
        let store = Arc::new(FixedStore(vec![sample_chunk("a", 1, 0.9)]));
        let engine = engine_with(store, Arc::new(RefusingBackend));

        let err = engine
            .answer(AnswerRequest::new("What is Riba?"))
            .await
            .unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Auth));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let engine = engine_with(
            Arc::new(FixedStore(Vec::new())),
            Arc::new(CannedBackend::new("x")),
        );
        let err = engine.answer(AnswerRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));
    }

    #[tokio::test]
    async fn test_greeting_short_circuits_provider() {
        // The backend refuses every call; a greeting must never reach it
        let engine = engine_with(Arc::new(FailingStore), Arc::new(RefusingBackend));

        let response = engine.answer(AnswerRequest::new("hello")).await.unwrap();
        assert!(response.answer.main_text.contains("AAOIFI"));
        assert!(response.sources.is_empty());
        assert!(!response.answer.follow_up_questions.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_continuity() {
        let backend = Arc::new(CannedBackend::new("Follow-up answer."));
        let engine = engine_with(Arc::new(FixedStore(Vec::new())), backend.clone());

        let first = engine
            .answer(AnswerRequest::new("What is Salam?"))
            .await
            .unwrap();
        engine
            .answer(
                AnswerRequest::new("And its conditions?")
                    .with_conversation(first.conversation_id.clone()),
            )
            .await
            .unwrap();

        // The second prompt carries the first exchange as transcript
        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("User: What is Salam?"));
        assert!(prompt.contains("Assistant: Follow-up answer."));
    }

    #[tokio::test]
    async fn test_memory_settings_applied_per_request() {
        let backend = Arc::new(CannedBackend::new("ok"));
        let engine = engine_with(Arc::new(FixedStore(Vec::new())), backend);

        let mut request = AnswerRequest::new("What is Riba?").with_tone(Tone::Concise);
        request.memory_settings = Some(MemorySettings {
            enabled: false,
            window_size: 3,
        });
        let response = engine.answer(request).await.unwrap();

        let stats = engine.memory_stats(&response.conversation_id);
        assert!(!stats.enabled);
        assert_eq!(stats.window_size, 3);
        // Buffer still populated while disabled
        assert_eq!(stats.pair_count, 1);
    }

    #[tokio::test]
    async fn test_history_persisted_best_effort() {
        let backend = Arc::new(CannedBackend::new("Recorded answer [Page 2]."));
        let store = Arc::new(FixedStore(vec![sample_chunk("a", 2, 0.8)]));
        let engine = engine_with(store, backend)
            .with_history(ConversationHistory::open_in_memory().unwrap());

        let response = engine
            .answer(AnswerRequest::new("What is Istisna?"))
            .await
            .unwrap();

        let history = engine.history().unwrap();
        let messages = history
            .messages(&response.conversation_id)
            .unwrap()
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].sources.len(), 1);
    }
}
