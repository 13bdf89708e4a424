//! Record sources consumed by the index builder.

use crate::models::{CatalogItem, KnowledgeEntry};
use sqlx::{Executor, Sqlite, SqlitePool};
use storage::models::{KnowledgeBaseEntry, Product};

/// Full snapshot reads of both record collections.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn catalog_items(&self) -> anyhow::Result<Vec<CatalogItem>>;
    async fn knowledge_entries(&self) -> anyhow::Result<Vec<KnowledgeEntry>>;
}

pub struct SqliteRecordSource {
    pool: SqlitePool,
}

impl SqliteRecordSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordSource for SqliteRecordSource {
    async fn catalog_items(&self) -> anyhow::Result<Vec<CatalogItem>> {
        let rows = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn knowledge_entries(&self) -> anyhow::Result<Vec<KnowledgeEntry>> {
        let rows =
            sqlx::query_as::<_, KnowledgeBaseEntry>("SELECT * FROM knowledge_base ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(KnowledgeEntry::from).collect())
    }
}

/// Fixed in-memory collections.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    pub catalog: Vec<CatalogItem>,
    pub knowledge: Vec<KnowledgeEntry>,
}

#[async_trait::async_trait]
impl RecordSource for StaticRecordSource {
    async fn catalog_items(&self) -> anyhow::Result<Vec<CatalogItem>> {
        Ok(self.catalog.clone())
    }

    async fn knowledge_entries(&self) -> anyhow::Result<Vec<KnowledgeEntry>> {
        Ok(self.knowledge.clone())
    }
}

pub async fn insert_catalog_item<'e, E>(executor: E, item: &CatalogItem) -> anyhow::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO products (name, description, category, price, stock_quantity, specifications, image)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.name)
    .bind(&item.description)
    .bind(&item.category)
    .bind(item.price)
    .bind(item.stock_quantity)
    .bind(&item.specifications)
    .bind(&item.image)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_knowledge_entry<'e, E>(
    executor: E,
    entry: &KnowledgeEntry,
) -> anyhow::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO knowledge_base (question, answer) VALUES (?1, ?2)")
        .bind(&entry.question)
        .bind(&entry.answer)
        .execute(executor)
        .await?;
    Ok(result.last_insert_rowid())
}
