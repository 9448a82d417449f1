//! HTTP gateway speaking the Anthropic messages wire format.
//!
//! Streaming replies arrive as server-sent events; each event is decoded
//! individually and bad frames are skipped rather than aborting the stream.

use crate::{Fragment, FragmentStream, ModelGateway, ModelRequest};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use llm_relay_common::{GatewayError, GatewayResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

pub struct AnthropicGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct SseError {
    error: SseErrorBody,
}

#[derive(Debug, Deserialize)]
struct SseErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Outcome of one decoded SSE frame.
#[derive(Debug)]
enum StreamStep {
    Text(String),
    Fault(GatewayError),
    Stop,
    Skip,
}

impl AnthropicGateway {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Build from configuration, reading the credential from the configured
    /// environment variable when present.
    pub fn from_config(model: &llm_relay_common::ModelConfig) -> Self {
        let api_key = std::env::var(&model.api_key_env).ok();
        Self::new(model.endpoint.clone(), api_key)
    }

    fn request_body(request: &ModelRequest, stream: bool) -> serde_json::Value {
        json!({
            "anthropic_version": ANTHROPIC_VERSION,
            "model": request.model_id,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": request.messages,
            "stream": stream,
        })
    }

    async fn post(&self, request: &ModelRequest, stream: bool) -> GatewayResult<reqwest::Response> {
        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("content-type", "application/json")
            .json(&Self::request_body(request, stream));
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &body))
    }

    /// Decode one SSE frame into a stream step. Frames that fail to decode
    /// are skipped; the upstream keeps talking.
    fn decode_event(event_type: &str, data: &str) -> StreamStep {
        match event_type {
            "content_block_delta" => match serde_json::from_str::<ContentBlockDelta>(data) {
                Ok(ContentBlockDelta { delta: Delta::TextDelta { text } }) => StreamStep::Text(text),
                Ok(_) => StreamStep::Skip,
                Err(e) => {
                    warn!("skipping undecodable content_block_delta: {e}");
                    StreamStep::Skip
                }
            },
            "error" => match serde_json::from_str::<SseError>(data) {
                Ok(err) => StreamStep::Fault(classify_fault(&err.error.kind, err.error.message)),
                Err(e) => StreamStep::Fault(GatewayError::Stream(format!(
                    "undecodable error event: {e}"
                ))),
            },
            "message_stop" => StreamStep::Stop,
            // message_start, content_block_start, ping, message_delta carry
            // no answer text.
            _ => StreamStep::Skip,
        }
    }
}

/// Map the provider's error taxonomy onto the four fault categories.
fn classify_fault(kind: &str, message: String) -> GatewayError {
    match kind {
        "throttlingException" | "rate_limit_error" | "overloaded_error" => {
            GatewayError::Throttled(message)
        }
        "validationException" | "invalid_request_error" => GatewayError::Validation(message),
        "modelStreamErrorException" => GatewayError::Stream(message),
        _ => GatewayError::Internal(message),
    }
}

fn classify_status(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<SseError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));
    match status {
        429 => GatewayError::Throttled(message),
        400 | 422 => GatewayError::Validation(message),
        _ => GatewayError::Internal(message),
    }
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    async fn invoke(&self, request: ModelRequest) -> GatewayResult<String> {
        debug!(model = %request.model_id, messages = request.messages.len(), "single-shot invocation");
        let response = self.post(&request, false).await?;
        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let text = body
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }

    async fn invoke_streaming(&self, request: ModelRequest) -> GatewayResult<FragmentStream> {
        debug!(model = %request.model_id, "streaming invocation");
        let response = self.post(&request, true).await?;
        let (mut tx, rx) = mpsc::unbounded();

        tokio::spawn(async move {
            let mut events = response.bytes_stream().eventsource();
            while let Some(frame) = events.next().await {
                let step = match frame {
                    Ok(sse) => Self::decode_event(&sse.event, &sse.data),
                    Err(e) => StreamStep::Fault(GatewayError::Stream(e.to_string())),
                };
                match step {
                    StreamStep::Text(text) => {
                        if tx.send(Fragment::Text(text)).await.is_err() {
                            return;
                        }
                    }
                    StreamStep::Fault(fault) => {
                        debug!("stream fault: {fault}");
                        let _ = tx.send(Fragment::Text(fault.client_message())).await;
                        break;
                    }
                    StreamStep::Stop => break,
                    StreamStep::Skip => {}
                }
            }
            let _ = tx.send(Fragment::EndOfMessage).await;
        });

        Ok(Box::pin(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_decodes_to_text() {
        let data = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"4"}}"#;
        match AnthropicGateway::decode_event("content_block_delta", data) {
            StreamStep::Text(text) => assert_eq!(text, "4"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn non_text_delta_is_skipped() {
        let data = r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{}"}}"#;
        assert!(matches!(
            AnthropicGateway::decode_event("content_block_delta", data),
            StreamStep::Skip
        ));
    }

    #[test]
    fn throttling_error_becomes_throttled_fault() {
        let data = r#"{"type":"error","error":{"type":"throttlingException","message":"slow down"}}"#;
        match AnthropicGateway::decode_event("error", data) {
            StreamStep::Fault(GatewayError::Throttled(msg)) => assert_eq!(msg, "slow down"),
            other => panic!("expected throttled fault, got {other:?}"),
        }
    }

    #[test]
    fn validation_error_becomes_validation_fault() {
        let data = r#"{"type":"error","error":{"type":"validationException","message":"bad input"}}"#;
        assert!(matches!(
            AnthropicGateway::decode_event("error", data),
            StreamStep::Fault(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn unknown_error_kind_is_internal() {
        let data = r#"{"type":"error","error":{"type":"internalServerException","message":"boom"}}"#;
        assert!(matches!(
            AnthropicGateway::decode_event("error", data),
            StreamStep::Fault(GatewayError::Internal(_))
        ));
    }

    #[test]
    fn message_stop_ends_stream() {
        assert!(matches!(
            AnthropicGateway::decode_event("message_stop", "{}"),
            StreamStep::Stop
        ));
    }

    #[test]
    fn ping_frames_are_ignored() {
        assert!(matches!(
            AnthropicGateway::decode_event("ping", "{}"),
            StreamStep::Skip
        ));
    }
}
