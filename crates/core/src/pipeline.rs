//! Startup wiring: providers, index build and the shared chat service.

use crate::chatlog::{ChatLogStore, SqliteChatLog};
use crate::classifier::QueryClassifier;
use crate::config::AppConfig;
use crate::conversation::{Assistant, GenerationSettings};
use crate::embeddings::Embedder;
use crate::indexer::{IndexBuilder, RetrievalIndexes};
use crate::records::{RecordSource, SqliteRecordSource};
use crate::service::ChatService;
use anyhow::Context;
use providers::hashing::HashingEmbedder;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::{LlmProvider, ProviderRegistry};
use sqlx::SqlitePool;
use std::sync::Arc;
use storage::{connect, migrate};
use tracing::{info, warn};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

pub struct Runtime {
    pub pool: SqlitePool,
    pub service: ChatService,
}

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new()
        .with_embedding("noop", Arc::new(NoopProvider))
        .with_llm("noop", Arc::new(NoopProvider))
        .with_embedding(
            "hashing",
            Arc::new(HashingEmbedder::new(config.embeddings.dimension)),
        );

    if let Some(key) = std::env::var_os("OPENAI_API_KEY") {
        let base = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        let provider =
            OpenAiProvider::new(openai_config(config, key.to_string_lossy().into_owned(), base));
        reg = reg
            .with_embedding("openai", Arc::new(provider.clone()))
            .with_llm("openai", Arc::new(provider));
    }

    reg.set_preferred_embedding(&config.embeddings.provider)
        .set_preferred_llm(&config.llm.provider)
}

/// Settings for the `openai` provider: embedding and chat model names come
/// from `config`, credentials and endpoint from the caller.
pub fn openai_config(config: &AppConfig, api_key: String, base_url: String) -> OpenAiConfig {
    OpenAiConfig {
        api_key,
        base_url,
        embedding_model: config.embeddings.model.clone(),
        chat_model: config.llm.chat_model.clone(),
    }
}

/// The configured generation service, or the refusing noop provider when it
/// is not available.
pub fn resolve_llm(registry: &ProviderRegistry) -> Arc<dyn LlmProvider> {
    match registry.llm(None) {
        Ok(llm) => llm,
        Err(e) => {
            warn!(error = %e, "Generation service unavailable; every query will be answered with an apology");
            Arc::new(NoopProvider)
        }
    }
}

pub async fn build_indexes(
    config: &AppConfig,
    embedder: &Embedder,
    source: &dyn RecordSource,
) -> anyhow::Result<RetrievalIndexes> {
    let indexes = IndexBuilder::new(embedder)
        .with_batch_size(config.embeddings.batch_size)
        .build(source)
        .await
        .context("index build")?;
    Ok(indexes)
}

/// Assembles the shared chat service from already-built parts.
pub fn assemble(
    config: &AppConfig,
    indexes: RetrievalIndexes,
    embedder: Embedder,
    llm: Arc<dyn LlmProvider>,
    log: Arc<dyn ChatLogStore>,
) -> ChatService {
    let classifier =
        QueryClassifier::new(llm.clone()).with_max_tokens(config.generation.classify_max_tokens);
    let assistant = Assistant::new(Arc::new(indexes), embedder, classifier, llm).with_settings(
        GenerationSettings {
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
            currency: config.chat.currency.clone(),
        },
    );
    ChatService::new(Arc::new(assistant), log)
        .with_senders(config.chat.anonymous_sender.clone(), config.chat.bot_sender.clone())
}

/// Connects storage, builds both indexes once and returns the service every
/// session shares. Fails if there is nothing to index.
pub async fn start(config: &AppConfig) -> anyhow::Result<Runtime> {
    let pool = connect(&config.database.path).await.context("db connect")?;
    migrate(&pool).await.context("db migrate")?;

    let registry = build_registry(config);
    let embedder = Embedder::from_registry(&registry, None).context("embedding provider")?;
    let llm = resolve_llm(&registry);

    info!(embedder = embedder.name(), "Starting index build...");
    let source = SqliteRecordSource::new(pool.clone());
    let indexes = build_indexes(config, &embedder, &source).await?;

    let log = Arc::new(SqliteChatLog::new(pool.clone()));
    let service = assemble(config, indexes, embedder, llm, log);
    Ok(Runtime { pool, service })
}
