//! Routes a classified query to its domain index and runs top-k search.

use crate::embeddings::{Embedder, EmbeddingError};
use crate::indexer::{DomainIndex, RetrievalIndexes};
use crate::models::{ClassificationLabel, RecordKind};
use crate::vectorstore::{IndexError, VectorIndex};
use thiserror::Error;
use tracing::debug;

/// Number of neighbours requested from a domain index.
pub const TOP_K: usize = 3;
pub const UNCLASSIFIED_CONTEXT: &str = "Sorry, I couldn't classify your query.";

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("search failed: {0}")]
    Index(#[from] IndexError),
}

/// A valid index position and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub position: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// The query could not be classified; no index was consulted.
    Unclassified,
    /// The domain has no index or the index is empty.
    NoDataForDomain(RecordKind),
    /// The search returned no valid positions. `FlatIndex` always fills at
    /// least one slot when it holds any rows, so only other `VectorIndex`
    /// implementations produce this.
    NoMatchFound(RecordKind),
    /// Best match first.
    Matches { kind: RecordKind, hits: Vec<Hit> },
}

impl RetrievalOutcome {
    /// Context passed downstream for outcomes that carry no records.
    pub fn informational_context(&self) -> Option<String> {
        match self {
            RetrievalOutcome::Unclassified => Some(UNCLASSIFIED_CONTEXT.to_string()),
            RetrievalOutcome::NoDataForDomain(kind) => {
                Some(format!("No relevant {} data available.", kind.noun()))
            }
            RetrievalOutcome::NoMatchFound(kind) => {
                Some(format!("No relevant {} found for your query.", kind.noun()))
            }
            RetrievalOutcome::Matches { .. } => None,
        }
    }
}

pub struct Retriever<'a> {
    indexes: &'a RetrievalIndexes,
    embedder: &'a Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(indexes: &'a RetrievalIndexes, embedder: &'a Embedder) -> Self {
        Self { indexes, embedder }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        label: ClassificationLabel,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let Some(kind) = label.record_kind() else {
            return Ok(RetrievalOutcome::Unclassified);
        };
        match kind {
            RecordKind::Catalog => self.search_domain(query, kind, self.indexes.catalog()).await,
            RecordKind::Knowledge => {
                self.search_domain(query, kind, self.indexes.knowledge())
                    .await
            }
        }
    }

    async fn search_domain<R, I: VectorIndex>(
        &self,
        query: &str,
        kind: RecordKind,
        domain: Option<&DomainIndex<R, I>>,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let index = match domain {
            Some(d) if !d.index().is_empty() => d.index(),
            _ => {
                debug!(%kind, "Index is absent or empty");
                return Ok(RetrievalOutcome::NoDataForDomain(kind));
            }
        };

        let vector = self.embedder.embed(query).await?;
        let neighbors = index.search(&vector, TOP_K)?;
        debug!(%kind, ?neighbors, "Search results");

        let hits: Vec<Hit> = neighbors
            .into_iter()
            .filter_map(|n| {
                n.position.map(|position| Hit {
                    position,
                    distance: n.distance,
                })
            })
            .collect();
        if hits.is_empty() {
            return Ok(RetrievalOutcome::NoMatchFound(kind));
        }
        Ok(RetrievalOutcome::Matches { kind, hits })
    }
}
