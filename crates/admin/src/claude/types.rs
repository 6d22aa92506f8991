//! Request and response bodies for the Messages API.

use serde::{Deserialize, Serialize};

/// Speaker of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn. Generation only sends plain text.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// A plain-text user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// A block of the reply. Anything but text (thinking, tool calls) is
/// kept as `Other` and skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// Non-streaming reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub stop_reason: Option<StopReason>,
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

impl ChatResponse {
    /// Concatenated text of all text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect()
    }

    /// The reply hit `max_tokens` and stops mid-post.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == Some(StopReason::MaxTokens)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(stop_reason: &str) -> ChatResponse {
        let json = format!(
            r##"{{
                "id": "msg_01",
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "{stop_reason}",
                "content": [
                    {{"type": "text", "text": "# Amethyst\n"}},
                    {{"type": "thinking", "thinking": "..."}},
                    {{"type": "text", "text": "Calm in violet."}}
                ],
                "usage": {{"input_tokens": 12, "output_tokens": 8}}
            }}"##
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_chat_request_skips_empty_system() {
        let request = ChatRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            messages: vec![Message::user("Hello")],
            system: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_text_skips_other_blocks() {
        let reply = response("end_turn");
        assert_eq!(reply.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(reply.text(), "# Amethyst\nCalm in violet.");
        assert!(!reply.is_truncated());
    }

    #[test]
    fn test_max_tokens_is_truncated() {
        assert!(response("max_tokens").is_truncated());
    }

    #[test]
    fn test_unknown_stop_reason_still_parses() {
        assert_eq!(response("pause_turn").stop_reason, Some(StopReason::Other));
    }
}
