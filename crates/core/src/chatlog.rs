//! Append-only chat log.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use storage::models::Message;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait ChatLogStore: Send + Sync {
    async fn append(&self, sender: &str, content: &str) -> anyhow::Result<()>;
    /// All entries, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<LogEntry>>;
}

pub struct SqliteChatLog {
    pool: SqlitePool,
}

impl SqliteChatLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChatLogStore for SqliteChatLog {
    async fn append(&self, sender: &str, content: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO messages (sender, content, timestamp) VALUES (?1, ?2, ?3)")
            .bind(sender)
            .bind(content)
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, Message>("SELECT * FROM messages ORDER BY timestamp, id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|m| -> anyhow::Result<LogEntry> {
                let timestamp = Utc
                    .timestamp_millis_opt(m.timestamp)
                    .single()
                    .ok_or_else(|| {
                        anyhow::anyhow!("invalid timestamp {} on message {}", m.timestamp, m.id)
                    })?;
                Ok(LogEntry {
                    sender: m.sender,
                    message: m.content,
                    timestamp,
                })
            })
            .collect()
    }
}
