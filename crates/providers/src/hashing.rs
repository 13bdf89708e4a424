//! Deterministic local embedder based on feature hashing.
//!
//! Each lower-cased alphanumeric token is hashed with blake3 into one of
//! `dimension` buckets with a hash-derived sign, and the bag is L2-normalised.
//! Texts sharing vocabulary land close together, which is enough for offline
//! runs and tests. The same text always yields the same vector. Text with no
//! tokens has no direction and is refused.

use crate::{EmbedResponse, EmbeddingProvider, ProviderError};

pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vector = vec![0f32; self.dimension];
        for token in tokens(text) {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(word) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Err(ProviderError::UnsupportedInput(format!(
                "no embeddable tokens in {text:?}"
            )));
        }
        for v in &mut vector {
            *v /= norm;
        }
        Ok(vector)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        let vectors = texts
            .iter()
            .map(|t| self.embed_one(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EmbedResponse { vectors })
    }
}
