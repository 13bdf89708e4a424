use providers::{EmbeddingProvider, ProviderError, ProviderRegistry};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("provider returned {got} vectors for {expected} texts")]
    CountMismatch { expected: usize, got: usize },
    #[error("provider returned an empty vector")]
    EmptyVector,
    #[error("vector dimension {got} differs from {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Maps text to vectors through one embedding provider.
///
/// The same `Embedder` must be used to build an index and to query it;
/// vectors from different models are not comparable.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    name: String,
}

impl Embedder {
    pub fn new(name: impl Into<String>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }

    pub fn from_registry(
        registry: &ProviderRegistry,
        name: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let provider = registry.embedding(name)?;
        let name = name
            .map(str::to_string)
            .or_else(|| registry.preferred_embedding.clone())
            .unwrap_or_default();
        Ok(Self { provider, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }

    /// Embeds `texts` in order. Every returned vector is non-empty and all
    /// share one dimension.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self.provider.embed(texts).await?;
        if resp.vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: resp.vectors.len(),
            });
        }
        let expected = resp.vectors[0].len();
        if expected == 0 {
            return Err(EmbeddingError::EmptyVector);
        }
        if let Some(v) = resp.vectors.iter().find(|v| v.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                got: v.len(),
            });
        }
        Ok(resp.vectors)
    }
}
