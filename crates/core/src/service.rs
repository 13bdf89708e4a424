//! Message-level entry point: envelopes, chat logging and log retrieval.

use crate::chatlog::{ChatLogStore, LogEntry};
use crate::conversation::{Assistant, Session};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

pub struct ChatService {
    assistant: Arc<Assistant>,
    log: Arc<dyn ChatLogStore>,
    anonymous_sender: String,
    bot_sender: String,
}

impl ChatService {
    pub fn new(assistant: Arc<Assistant>, log: Arc<dyn ChatLogStore>) -> Self {
        Self {
            assistant,
            log,
            anonymous_sender: "Anonymous".to_string(),
            bot_sender: "Bot".to_string(),
        }
    }

    pub fn with_senders(
        mut self,
        anonymous_sender: impl Into<String>,
        bot_sender: impl Into<String>,
    ) -> Self {
        self.anonymous_sender = anonymous_sender.into();
        self.bot_sender = bot_sender.into();
        self
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Logs the user message, answers it and logs the reply. Log write
    /// failures are reported but never fail the reply.
    pub async fn handle(&self, session: &mut Session, inbound: InboundMessage) -> OutboundMessage {
        let sender = inbound
            .sender
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.anonymous_sender.clone());

        if let Err(e) = self.log.append(&sender, &inbound.message).await {
            warn!(error = %e, "Failed to log user message");
        }

        let reply = self.assistant.respond(session, &inbound.message).await;

        if let Err(e) = self.log.append(&self.bot_sender, &reply).await {
            warn!(error = %e, "Failed to log assistant reply");
        }

        OutboundMessage { message: reply }
    }

    pub async fn logs(&self) -> anyhow::Result<LogsResponse> {
        Ok(LogsResponse {
            logs: self.log.list().await?,
        })
    }
}
