use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub stock_quantity: i64,
    pub specifications: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
}

/// One chat log row. `timestamp` is unix milliseconds (UTC).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: i64,
}
