use crate::{
    CompletionRequest, CompletionResponse, EmbedResponse, EmbeddingProvider, LlmProvider,
    ProviderError,
};

/// Refuses every call. Registered so an unconfigured deployment degrades
/// instead of failing to start.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}

#[async_trait::async_trait]
impl LlmProvider for NoopProvider {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
