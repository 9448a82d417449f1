//! Behaviour handlers for inbound websocket requests.

pub mod chat;
pub mod passthrough;

use futures::StreamExt;
use llm_relay_common::{ClientEvent, ClientRelay, GatewayResult, END_OF_MESSAGE_ACK};
use llm_relay_gateway::{Fragment, ModelGateway, ModelRequest};
use std::sync::Arc;

/// Stream one model reply to the client, fragment by fragment, closing with
/// the boundary acknowledgement. Returns the collected reply text.
pub(crate) async fn stream_reply(
    gateway: &Arc<dyn ModelGateway>,
    relay: &Arc<dyn ClientRelay>,
    request: ModelRequest,
    connection_id: &str,
) -> GatewayResult<String> {
    let mut stream = gateway.invoke_streaming(request).await?;
    let mut collected = String::new();
    while let Some(fragment) = stream.next().await {
        match fragment {
            Fragment::Text(text) => {
                relay.notify(connection_id, ClientEvent::text(text.clone())).await;
                collected.push_str(&text);
            }
            Fragment::EndOfMessage => {
                relay.notify(connection_id, ClientEvent::text(END_OF_MESSAGE_ACK)).await;
                break;
            }
        }
    }
    Ok(collected)
}
