//! Builds the two retrieval indexes from a record snapshot.

use crate::embeddings::{Embedder, EmbeddingError};
use crate::models::{CatalogItem, KnowledgeEntry, RecordKind};
use crate::records::RecordSource;
use crate::vectorstore::{FlatIndex, IndexError, VectorIndex};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no catalog or knowledge records found; nothing to index")]
    NoData,
    #[error("record source failed: {0:#}")]
    Source(anyhow::Error),
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("index construction failed: {0}")]
    Index(#[from] IndexError),
    #[error("{vectors} vectors for {records} records")]
    PositionMismatch { vectors: usize, records: usize },
}

/// Text embedded for a catalog item.
pub fn render_catalog_text(item: &CatalogItem) -> String {
    format!(
        "Name: {}, Description: {}, Category: {}",
        item.name, item.description, item.category
    )
}

/// Text embedded for a knowledge entry.
pub fn render_knowledge_text(entry: &KnowledgeEntry) -> String {
    format!("Q: {}, A: {}", entry.question, entry.answer)
}

/// A vector index plus the records it was built from. Row `i` of the index
/// is the embedding of `records[i]`; neither half can be mutated on its own.
#[derive(Debug, Clone)]
pub struct DomainIndex<R, I = FlatIndex> {
    index: I,
    records: Vec<R>,
}

impl<R, I: VectorIndex> DomainIndex<R, I> {
    /// Pairs an already-loaded index with its records. Fails unless both have
    /// the same length.
    pub fn new(index: I, records: Vec<R>) -> Result<Self, BuildError> {
        if index.len() != records.len() {
            return Err(BuildError::PositionMismatch {
                vectors: index.len(),
                records: records.len(),
            });
        }
        Ok(Self { index, records })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn record(&self, position: usize) -> Option<&R> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Both domain indexes. A domain with no records has no index at all
/// (`None`), which is distinct from an index with zero rows.
#[derive(Debug, Clone, Default)]
pub struct RetrievalIndexes {
    catalog: Option<DomainIndex<CatalogItem>>,
    knowledge: Option<DomainIndex<KnowledgeEntry>>,
}

impl RetrievalIndexes {
    pub fn catalog(&self) -> Option<&DomainIndex<CatalogItem>> {
        self.catalog.as_ref()
    }

    pub fn knowledge(&self) -> Option<&DomainIndex<KnowledgeEntry>> {
        self.knowledge.as_ref()
    }

    /// Number of indexed rows for `kind`, or `None` when the index is absent.
    pub fn size(&self, kind: RecordKind) -> Option<usize> {
        match kind {
            RecordKind::Catalog => self.catalog.as_ref().map(DomainIndex::len),
            RecordKind::Knowledge => self.knowledge.as_ref().map(DomainIndex::len),
        }
    }
}

pub struct IndexBuilder<'a> {
    embedder: &'a Embedder,
    batch_size: usize,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a Embedder) -> Self {
        Self {
            embedder,
            batch_size: 32,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn build(&self, source: &dyn RecordSource) -> Result<RetrievalIndexes, BuildError> {
        let catalog_items = source.catalog_items().await.map_err(BuildError::Source)?;
        let knowledge_entries = source
            .knowledge_entries()
            .await
            .map_err(BuildError::Source)?;
        info!(
            catalog = catalog_items.len(),
            knowledge = knowledge_entries.len(),
            embedder = self.embedder.name(),
            "Building retrieval indexes"
        );

        if catalog_items.is_empty() && knowledge_entries.is_empty() {
            warn!("No data found for index creation");
            return Err(BuildError::NoData);
        }

        let catalog = self
            .build_domain(catalog_items, render_catalog_text)
            .await?;
        let knowledge = self
            .build_domain(knowledge_entries, render_knowledge_text)
            .await?;

        let indexes = RetrievalIndexes { catalog, knowledge };
        info!(
            catalog_size = indexes.size(RecordKind::Catalog).unwrap_or(0),
            knowledge_size = indexes.size(RecordKind::Knowledge).unwrap_or(0),
            "Retrieval indexes ready"
        );
        Ok(indexes)
    }

    async fn build_domain<R>(
        &self,
        records: Vec<R>,
        render: fn(&R) -> String,
    ) -> Result<Option<DomainIndex<R>>, BuildError> {
        if records.is_empty() {
            return Ok(None);
        }

        let texts: Vec<String> = records.iter().map(render).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embedder.embed_batch(batch).await?);
            debug!(embedded = vectors.len(), total = texts.len(), "Embedded batch");
        }

        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        let mut index = FlatIndex::new(dim)?;
        index.add(&vectors)?;
        DomainIndex::new(index, records).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_follow_documented_layout() {
        let item = CatalogItem {
            name: "Mango".into(),
            description: "Sweet".into(),
            category: "Fruit".into(),
            price: 120.0,
            stock_quantity: 4,
            specifications: "1kg".into(),
            image: None,
        };
        assert_eq!(
            render_catalog_text(&item),
            "Name: Mango, Description: Sweet, Category: Fruit"
        );
        let entry = KnowledgeEntry {
            question: "Do you deliver?".into(),
            answer: "Yes.".into(),
        };
        assert_eq!(render_knowledge_text(&entry), "Q: Do you deliver?, A: Yes.");
    }

    #[test]
    fn domain_index_rejects_misaligned_records() {
        let mut index = FlatIndex::new(1).unwrap();
        index.add(&[vec![1.0]]).unwrap();
        let err = DomainIndex::new(index, vec!["a", "b"]).unwrap_err();
        assert!(matches!(
            err,
            BuildError::PositionMismatch {
                vectors: 1,
                records: 2
            }
        ));
    }
}
