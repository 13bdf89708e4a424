//! Line-oriented chat loop.
//!
//! Each input line is either a JSON inbound envelope
//! (`{"message": "...", "sender": "..."}`) or plain text; each reply is
//! written as one JSON outbound envelope per line.

use anyhow::Result;
use assistant_core::conversation::Session;
use assistant_core::service::{ChatService, InboundMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub fn parse_line(line: &str, default_sender: Option<&str>) -> Option<InboundMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') {
        if let Ok(mut inbound) = serde_json::from_str::<InboundMessage>(trimmed) {
            if inbound.sender.is_none() {
                inbound.sender = default_sender.map(str::to_string);
            }
            return Some(inbound);
        }
    }
    Some(InboundMessage {
        message: trimmed.to_string(),
        sender: default_sender.map(str::to_string),
    })
}

/// Runs one session until `input` is exhausted. Returns the number of
/// messages answered.
pub async fn run_session<R, W>(
    service: &ChatService,
    session: &mut Session,
    input: R,
    mut output: W,
    default_sender: Option<&str>,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0usize;
    while let Some(line) = lines.next_line().await? {
        let Some(inbound) = parse_line(&line, default_sender) else {
            continue;
        };
        let outbound = service.handle(session, inbound).await;
        let mut encoded = serde_json::to_vec(&outbound)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
        answered += 1;
    }
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_uses_default_sender() {
        let msg = parse_line("  hello there \n", Some("cli")).unwrap();
        assert_eq!(msg.message, "hello there");
        assert_eq!(msg.sender.as_deref(), Some("cli"));
    }

    #[test]
    fn json_envelope_keeps_its_sender() {
        let msg = parse_line(r#"{"message":"hi","sender":"rahim"}"#, Some("cli")).unwrap();
        assert_eq!(msg.message, "hi");
        assert_eq!(msg.sender.as_deref(), Some("rahim"));
        let anon = parse_line(r#"{"message":"hi"}"#, None).unwrap();
        assert_eq!(anon.sender, None);
    }

    #[test]
    fn blank_lines_are_skipped_and_bad_json_is_text() {
        assert!(parse_line("   ", None).is_none());
        let msg = parse_line("{not json", None).unwrap();
        assert_eq!(msg.message, "{not json");
    }
}
