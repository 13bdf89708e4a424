//! Per-session conversation orchestration.
//!
//! An [`Assistant`] is built once and shared read-only by every session.
//! Each [`Session`] owns its history; a query cycle runs
//! classify -> retrieve -> compose -> generate against it and always leaves
//! the session idle and usable afterwards.

use crate::classifier::QueryClassifier;
use crate::composer::Composer;
use crate::embeddings::Embedder;
use crate::indexer::RetrievalIndexes;
use crate::models::ConversationTurn;
use crate::search::{RetrievalError, Retriever};
use providers::{ChatMessage, CompletionRequest, LlmProvider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

pub const APOLOGY: &str = "Sorry, I couldn't process your query.";
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't find relevant information in the store.";

const SYSTEM_PROMPT: &str = "You are a product store assistant. Respond only based on the provided context and avoid adding extra information, assumptions, or disclaimers. \
If the context includes details about a product, provide those details in a helpful and conversational tone. \
If the context does not include the required information, politely say, 'I'm sorry, I couldn't find relevant information in the store.'";

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("generation failed: {0}")]
    Generation(#[from] ProviderError),
    #[error("generation returned an empty reply")]
    EmptyReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Classifying,
    Retrieving,
    Composing,
    Generating,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    history: Vec<ConversationTurn>,
    state: SessionState,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn push(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub currency: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 200,
            currency: "tk".to_string(),
        }
    }
}

/// Shared, immutable runtime context for answering queries.
pub struct Assistant {
    indexes: Arc<RetrievalIndexes>,
    embedder: Embedder,
    classifier: QueryClassifier,
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl Assistant {
    pub fn new(
        indexes: Arc<RetrievalIndexes>,
        embedder: Embedder,
        classifier: QueryClassifier,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            indexes,
            embedder,
            classifier,
            llm,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn indexes(&self) -> &RetrievalIndexes {
        &self.indexes
    }

    /// Answers `query` within `session`. Failures are logged and replaced by
    /// [`APOLOGY`]; the session stays usable.
    pub async fn respond(&self, session: &mut Session, query: &str) -> String {
        let result = self.try_respond(session, query).await;
        session.state = SessionState::Idle;
        match result {
            Ok(reply) => reply,
            Err(e) => {
                error!(session = %session.id, error = %e, "Error during response generation");
                APOLOGY.to_string()
            }
        }
    }

    pub async fn try_respond(
        &self,
        session: &mut Session,
        query: &str,
    ) -> Result<String, ConversationError> {
        session.state = SessionState::Classifying;
        let label = self.classifier.classify(query).await;
        info!(session = %session.id, %label, "Query classified");

        session.state = SessionState::Retrieving;
        let outcome = Retriever::new(&self.indexes, &self.embedder)
            .retrieve(query, label)
            .await?;

        session.state = SessionState::Composing;
        let context = Composer::new(&self.indexes)
            .with_currency(self.settings.currency.clone())
            .context_for(&outcome);
        debug!(session = %session.id, %context, "Composed context");

        session.push(ConversationTurn::user(query));
        session.push(ConversationTurn::assistant(context));

        session.state = SessionState::Generating;
        let mut messages = Vec::with_capacity(session.history.len() + 1);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(session.history.iter().map(ChatMessage::from));
        let resp = self
            .llm
            .complete(CompletionRequest {
                messages,
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            })
            .await?;

        let reply = resp.content.trim().to_string();
        if reply.is_empty() {
            return Err(ConversationError::EmptyReply);
        }
        session.push(ConversationTurn::assistant(reply.clone()));
        Ok(reply)
    }
}
