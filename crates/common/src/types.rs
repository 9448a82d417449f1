//! Conversation data model and client-facing event types shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Source of an inline or storage-backed image.
///
/// `partial_storage_key` is a transient reference to an uploaded file. It must
/// be resolved to inline `data` or redacted to a text placeholder before the
/// block reaches the model or the client; raw keys never cross that boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
}

impl ImageSource {
    /// Inline base64 source, the only form allowed to reach the model.
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: Some(media_type.into()),
            data: Some(data.into()),
            partial_storage_key: None,
            file_extension: None,
        }
    }
}

/// One block of turn content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
    Document { file_name: String },
}

impl ContentBlock {
    pub fn text(value: impl Into<String>) -> Self {
        ContentBlock::Text { text: value.into() }
    }

    /// Text payload of this block, if it is a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// A single chronological turn. Content ordering is significant; the
/// orchestrator appends to it but never reorders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ConversationTurn {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::User, content }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::Assistant, content }
    }

    /// Concatenated text of all text blocks in this turn.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ordered conversation, exclusively owned by one orchestration run.
pub type ConversationHistory = Vec<ConversationTurn>;

/// Outbound event delivered to a connected client.
///
/// Progress updates and answer fragments share one channel; the serialized
/// shape keys (`progress`, `text`, `prompt_flow`, `error`) let the client
/// tell status apart from answer content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientEvent {
    Progress {
        progress: String,
        done: bool,
    },
    Text {
        text: String,
    },
    PromptFlow {
        prompt_flow: ConversationHistory,
        done: bool,
    },
    Error {
        error: String,
    },
}

impl ClientEvent {
    pub fn progress(message: impl Into<String>, done: bool) -> Self {
        ClientEvent::Progress { progress: message.into(), done }
    }

    pub fn text(fragment: impl Into<String>) -> Self {
        ClientEvent::Text { text: fragment.into() }
    }

    pub fn prompt_flow(history: &ConversationHistory, done: bool) -> Self {
        ClientEvent::PromptFlow { prompt_flow: history.clone(), done }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ClientEvent::Error { error: message.into() }
    }
}

/// Inbound websocket request from the transport layer.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundRequest {
    pub behaviour: String,
    pub query: ConversationHistory,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub query_vectordb: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_block_serializes_with_type_tag() {
        let block = ContentBlock::text("hello");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn turn_roundtrips_through_json() {
        let turn = ConversationTurn::user(vec![
            ContentBlock::text("what is 2+2?"),
            ContentBlock::Document { file_name: "notes.pdf".to_string() },
        ]);
        let json = serde_json::to_string(&turn).unwrap();
        let back: ConversationTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(turn, back);
    }

    #[test]
    fn client_events_use_distinct_keys() {
        let progress = serde_json::to_value(ClientEvent::progress("working", false)).unwrap();
        let text = serde_json::to_value(ClientEvent::text("4")).unwrap();
        assert!(progress.get("progress").is_some());
        assert!(progress.get("text").is_none());
        assert!(text.get("text").is_some());
    }

    #[test]
    fn joined_text_skips_non_text_blocks() {
        let turn = ConversationTurn::user(vec![
            ContentBlock::text("a"),
            ContentBlock::Image { source: ImageSource::base64("image/png", "AAAA") },
            ContentBlock::text("b"),
        ]);
        assert_eq!(turn.joined_text(), "a\nb");
    }
}
