#![allow(dead_code)]

use assistant_core::conversation::FALLBACK_REPLY;
use assistant_core::models::{CatalogItem, KnowledgeEntry};
use providers::{
    ChatRole, CompletionRequest, CompletionResponse, EmbedResponse, EmbeddingProvider,
    LlmProvider, ProviderError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const VOCAB: [&str; 6] = ["mango", "laptop", "rice", "return", "policy", "deliver"];

/// One dimension per vocabulary word plus a constant bias, L2-normalised.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub texts_seen: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = VOCAB
            .iter()
            .map(|w| lower.matches(w).count() as f32)
            .collect();
        v.push(1.0);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(EmbedResponse {
            vectors: texts.iter().map(|t| Self::vector(t)).collect(),
        })
    }
}

pub struct FailingEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Err(ProviderError::RequestFailed("model offline".into()))
    }
}

/// Classifies by keyword and answers from the last context turn.
#[derive(Default)]
pub struct ScriptedLlm {
    pub fail_generation: AtomicBool,
    pub fail_classification: AtomicBool,
    /// Label every query as a catalog query.
    pub always_catalog: AtomicBool,
    pub generations: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    fn is_classification(request: &CompletionRequest) -> bool {
        request
            .messages
            .first()
            .map(|m| m.content.starts_with("You are a query classifier"))
            .unwrap_or(false)
    }

    fn label_for(query: &str) -> &'static str {
        let q = query.to_lowercase();
        if q.contains("policy") || q.contains("deliver") {
            "knowledge_base\n"
        } else if q.contains("mango") || q.contains("laptop") || q.contains("rice") {
            " Product"
        } else {
            "weather"
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        if Self::is_classification(&request) {
            if self.fail_classification.load(Ordering::SeqCst) {
                return Err(ProviderError::RateLimited("429".into()));
            }
            let query = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let label = if self.always_catalog.load(Ordering::SeqCst) {
                "product"
            } else {
                Self::label_for(&query)
            };
            return Ok(CompletionResponse {
                content: label.to_string(),
            });
        }

        self.generations.lock().unwrap().push(request.clone());
        if self.fail_generation.load(Ordering::SeqCst) {
            return Err(ProviderError::RequestFailed("connection reset".into()));
        }
        let context = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let content = match context.lines().next() {
            Some(first) if first.starts_with("Product:") || first.starts_with("Knowledge Base:") => {
                format!("From the store: {}", context.replace('\n', " | "))
            }
            _ => FALLBACK_REPLY.to_string(),
        };
        Ok(CompletionResponse { content })
    }
}

pub fn item(name: &str, description: &str, category: &str, price: f64) -> CatalogItem {
    CatalogItem {
        name: name.into(),
        description: description.into(),
        category: category.into(),
        price,
        stock_quantity: 10,
        specifications: format!("{name} specs"),
        image: None,
    }
}

pub fn catalog() -> Vec<CatalogItem> {
    vec![
        item("Laptop", "Portable computer", "Electronics", 85000.0),
        item("Mango", "Sweet tropical fruit", "Fruit", 120.0),
        item("Rice", "Long grain", "Grocery", 90.0),
        item("Mango Juice", "Bottled drink", "Beverage", 60.0),
    ]
}

pub fn knowledge() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry {
            question: "What is your return policy?".into(),
            answer: "Returns are accepted within 7 days.".into(),
        },
        KnowledgeEntry {
            question: "Do you deliver outside the city?".into(),
            answer: "Yes, for a flat fee.".into(),
        },
    ]
}
