//! Renders retrieved records into the context block handed to generation.

use crate::indexer::RetrievalIndexes;
use crate::models::{CatalogItem, KnowledgeEntry, RecordKind};
use crate::search::{Hit, RetrievalOutcome};
use tracing::warn;

pub const NO_MATCHES_CONTEXT: &str = "I'm sorry, I couldn't find any relevant matches.";

pub struct Composer<'a> {
    indexes: &'a RetrievalIndexes,
    currency: String,
}

impl<'a> Composer<'a> {
    pub fn new(indexes: &'a RetrievalIndexes) -> Self {
        Self {
            indexes,
            currency: "tk".to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Context for any retrieval outcome. Non-match outcomes pass their
    /// informational string through unchanged.
    pub fn context_for(&self, outcome: &RetrievalOutcome) -> String {
        match outcome {
            RetrievalOutcome::Matches { kind, hits } => self.compose(hits, *kind),
            other => other
                .informational_context()
                .unwrap_or_else(|| NO_MATCHES_CONTEXT.to_string()),
        }
    }

    /// Renders `hits` in rank order, skipping positions with no record.
    pub fn compose(&self, hits: &[Hit], kind: RecordKind) -> String {
        let blocks: Vec<String> = match kind {
            RecordKind::Catalog => self.render_each(hits, kind, |pos| {
                self.indexes
                    .catalog()
                    .and_then(|d| d.record(pos))
                    .map(|item| render_catalog_block(item, &self.currency))
            }),
            RecordKind::Knowledge => self.render_each(hits, kind, |pos| {
                self.indexes
                    .knowledge()
                    .and_then(|d| d.record(pos))
                    .map(render_knowledge_block)
            }),
        };

        if blocks.is_empty() {
            return NO_MATCHES_CONTEXT.to_string();
        }
        blocks.join("\n\n")
    }

    fn render_each(
        &self,
        hits: &[Hit],
        kind: RecordKind,
        render: impl Fn(usize) -> Option<String>,
    ) -> Vec<String> {
        hits.iter()
            .filter_map(|hit| {
                let block = render(hit.position);
                if block.is_none() {
                    warn!(%kind, position = hit.position, "Stale position skipped");
                }
                block
            })
            .collect()
    }
}

pub fn render_catalog_block(item: &CatalogItem, currency: &str) -> String {
    format!(
        "Product: {}\nDescription: {}\nCategory: {}\nPrice: {:.2} {}\nStock Quantity: {}\nSpecifications: {}",
        item.name,
        item.description,
        item.category,
        item.price,
        currency,
        item.stock_quantity,
        item.specifications
    )
}

pub fn render_knowledge_block(entry: &KnowledgeEntry) -> String {
    format!(
        "Knowledge Base:\nQuestion: {}\nAnswer: {}",
        entry.question, entry.answer
    )
}
