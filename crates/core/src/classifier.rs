use crate::models::ClassificationLabel;
use providers::{ChatMessage, CompletionRequest, LlmProvider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub const CATALOG_LABEL: &str = "product";
pub const KNOWLEDGE_LABEL: &str = "knowledge_base";

const CLASSIFIER_PROMPT: &str = "You are a query classifier. Classify user queries into one of the following categories:\n\
- 'product': Use this category if the query is about a product (e.g., 'Tell me about mango', 'What is Mango?').\n\
- 'knowledge_base': Use this category if the query is general knowledge or informational (e.g., 'What is your return policy?').\n\
Respond with either 'product' or 'knowledge_base' only, and do not add any explanation.";

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("generation service failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("unrecognized label {0:?}")]
    UnrecognizedLabel(String),
}

/// Labels a query with the domain it should be answered from.
#[derive(Clone)]
pub struct QueryClassifier {
    llm: Arc<dyn LlmProvider>,
    max_tokens: u32,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            max_tokens: 10,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Never fails: any error degrades to `Unknown`.
    pub async fn classify(&self, query: &str) -> ClassificationLabel {
        match self.try_classify(query).await {
            Ok(label) => {
                debug!(%label, "Classified query");
                label
            }
            Err(e) => {
                warn!(error = %e, "Classification degraded to unknown");
                ClassificationLabel::Unknown
            }
        }
    }

    pub async fn try_classify(&self, query: &str) -> Result<ClassificationLabel, ClassificationError> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(CLASSIFIER_PROMPT),
                ChatMessage::user(format!("Classify the following query: {}", query)),
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };
        let resp = self.llm.complete(request).await?;
        match parse_label(&resp.content) {
            ClassificationLabel::Unknown => Err(ClassificationError::UnrecognizedLabel(resp.content)),
            label => Ok(label),
        }
    }
}

/// Trims and lower-cases `raw`; anything but an exact known label is `Unknown`.
pub fn parse_label(raw: &str) -> ClassificationLabel {
    match raw.trim().to_lowercase().as_str() {
        CATALOG_LABEL => ClassificationLabel::Catalog,
        KNOWLEDGE_LABEL => ClassificationLabel::Knowledge,
        _ => ClassificationLabel::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::CompletionResponse;
    use std::sync::Mutex;

    #[test]
    fn parses_known_labels_with_case_and_whitespace() {
        assert_eq!(parse_label("product"), ClassificationLabel::Catalog);
        assert_eq!(parse_label("  PRODUCT\n"), ClassificationLabel::Catalog);
        assert_eq!(parse_label("Knowledge_Base"), ClassificationLabel::Knowledge);
    }

    #[test]
    fn anything_else_is_unknown() {
        for raw in ["", "catalog", "'product'", "product.", "knowledge base", "products", "unknown"] {
            assert_eq!(parse_label(raw), ClassificationLabel::Unknown, "{raw:?}");
        }
    }

    struct Recording {
        reply: Result<String, ()>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for Recording {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                }),
                Err(()) => Err(ProviderError::RateLimited("slow down".into())),
            }
        }
    }

    #[tokio::test]
    async fn sends_deterministic_request_with_query() {
        let llm = Arc::new(Recording {
            reply: Ok(" Product ".into()),
            seen: Mutex::new(Vec::new()),
        });
        let classifier = QueryClassifier::new(llm.clone());
        assert_eq!(
            classifier.classify("Tell me about mango").await,
            ClassificationLabel::Catalog
        );
        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].max_tokens, 10);
        assert!(seen[0].messages[1].content.ends_with("Tell me about mango"));
    }

    #[tokio::test]
    async fn provider_errors_and_junk_degrade_to_unknown() {
        let failing = QueryClassifier::new(Arc::new(Recording {
            reply: Err(()),
            seen: Mutex::new(Vec::new()),
        }));
        assert_eq!(failing.classify("hi").await, ClassificationLabel::Unknown);
        assert!(matches!(
            failing.try_classify("hi").await,
            Err(ClassificationError::Provider(ProviderError::RateLimited(_)))
        ));

        let chatty = QueryClassifier::new(Arc::new(Recording {
            reply: Ok("I think it is a product".into()),
            seen: Mutex::new(Vec::new()),
        }));
        assert_eq!(chatty.classify("hi").await, ClassificationLabel::Unknown);
    }
}
