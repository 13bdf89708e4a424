//! Loads catalog and knowledge records from JSON files into the database.

use anyhow::{Context, Result};
use assistant_core::models::{CatalogItem, KnowledgeEntry};
use assistant_core::records::{insert_catalog_item, insert_knowledge_entry};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub products: usize,
    pub knowledge: usize,
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

/// Inserts every record in one transaction per file; a malformed file
/// imports nothing.
pub async fn import_records(
    pool: &SqlitePool,
    products: Option<&Path>,
    knowledge: Option<&Path>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    if let Some(path) = products {
        let items: Vec<CatalogItem> = read_json_array(path)?;
        anyhow::ensure!(
            items.iter().all(|i| !i.name.trim().is_empty()),
            "{}: every product needs a name",
            path.display()
        );
        let mut tx = pool.begin().await?;
        for item in &items {
            insert_catalog_item(&mut *tx, item).await?;
        }
        tx.commit().await?;
        summary.products = items.len();
        info!(count = items.len(), "Imported products");
    }

    if let Some(path) = knowledge {
        let entries: Vec<KnowledgeEntry> = read_json_array(path)?;
        let mut tx = pool.begin().await?;
        for entry in &entries {
            insert_knowledge_entry(&mut *tx, entry).await?;
        }
        tx.commit().await?;
        summary.knowledge = entries.len();
        info!(count = entries.len(), "Imported knowledge entries");
    }

    Ok(summary)
}
