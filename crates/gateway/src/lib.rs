//! Model Invocation Gateway
//!
//! Sends a structured prompt to the text-generation backend and returns the
//! reply either collected into one string or as a fragment stream. Provider
//! faults are normalized here; nothing past this boundary sees a raw
//! transport error.

pub mod anthropic;

pub use anthropic::AnthropicGateway;

use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;
use llm_relay_common::{ConversationHistory, GatewayResult, MAX_OUTPUT_TOKENS};
use std::pin::Pin;

/// One structured prompt for a single model invocation.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub messages: ConversationHistory,
    pub model_id: String,
    pub max_tokens: u32,
}

impl ModelRequest {
    pub fn new(system: impl Into<String>, messages: ConversationHistory, model_id: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages,
            model_id: model_id.into(),
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// One unit of streamed output.
///
/// Upstream faults are already converted into a final `Text` fragment by the
/// time they appear here; `EndOfMessage` always closes the stream so the
/// consumer can detect the message boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    EndOfMessage,
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Fragment> + Send>>;

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Single-shot invocation: the full generated text, or a normalized
    /// fault.
    async fn invoke(&self, request: ModelRequest) -> GatewayResult<String>;

    /// Streaming invocation. The returned stream never errors; faults arrive
    /// as a terminal text fragment and the stream ends cleanly after
    /// `Fragment::EndOfMessage`.
    async fn invoke_streaming(&self, request: ModelRequest) -> GatewayResult<FragmentStream>;
}

/// Drain a fragment stream into the concatenated reply text.
pub async fn collect_text(mut stream: FragmentStream) -> String {
    let mut out = String::new();
    while let Some(fragment) = stream.next().await {
        match fragment {
            Fragment::Text(text) => out.push_str(&text),
            Fragment::EndOfMessage => break,
        }
    }
    out
}
