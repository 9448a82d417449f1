//! Single-prompt streaming behaviours: sentiment and PII redaction.

use crate::handlers::stream_reply;
use llm_relay_common::{ClientRelay, ConversationHistory, GatewayResult};
use llm_relay_gateway::{ModelGateway, ModelRequest};
use llm_relay_orchestrator::prompts;
use std::sync::Arc;

pub async fn sentiment(
    gateway: &Arc<dyn ModelGateway>,
    relay: &Arc<dyn ClientRelay>,
    history: ConversationHistory,
    model_id: &str,
    connection_id: &str,
) -> GatewayResult<String> {
    let request = ModelRequest::new(prompts::SENTIMENT_PROMPT, history, model_id);
    stream_reply(gateway, relay, request, connection_id).await
}

pub async fn pii_redact(
    gateway: &Arc<dyn ModelGateway>,
    relay: &Arc<dyn ClientRelay>,
    history: ConversationHistory,
    model_id: &str,
    connection_id: &str,
) -> GatewayResult<String> {
    let request = ModelRequest::new(prompts::PII_REDACT_PROMPT, history, model_id);
    stream_reply(gateway, relay, request, connection_id).await
}
