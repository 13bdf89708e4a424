use serde::{Deserialize, Serialize};
use std::fmt;

/// A product in the store catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub specifications: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl From<storage::models::Product> for CatalogItem {
    fn from(p: storage::models::Product) -> Self {
        Self {
            name: p.name,
            description: p.description,
            category: p.category,
            price: p.price,
            stock_quantity: p.stock_quantity,
            specifications: p.specifications,
            image: p.image,
        }
    }
}

impl From<storage::models::KnowledgeBaseEntry> for KnowledgeEntry {
    fn from(e: storage::models::KnowledgeBaseEntry) -> Self {
        Self {
            question: e.question,
            answer: e.answer,
        }
    }
}

/// The two retrieval domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Catalog,
    Knowledge,
}

impl RecordKind {
    /// Human wording used in informational context strings.
    pub fn noun(&self) -> &'static str {
        match self {
            RecordKind::Catalog => "product",
            RecordKind::Knowledge => "knowledge base",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Catalog => "catalog",
            RecordKind::Knowledge => "knowledge",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLabel {
    Catalog,
    Knowledge,
    Unknown,
}

impl ClassificationLabel {
    pub fn record_kind(&self) -> Option<RecordKind> {
        match self {
            ClassificationLabel::Catalog => Some(RecordKind::Catalog),
            ClassificationLabel::Knowledge => Some(RecordKind::Knowledge),
            ClassificationLabel::Unknown => None,
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassificationLabel::Catalog => "catalog",
            ClassificationLabel::Knowledge => "knowledge",
            ClassificationLabel::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for providers::ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        match turn.role {
            Role::User => providers::ChatMessage::user(turn.content.clone()),
            Role::Assistant => providers::ChatMessage::assistant(turn.content.clone()),
        }
    }
}
