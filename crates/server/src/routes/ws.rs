//! Websocket endpoint: one connection per client, JSON frames in, relayed
//! events out.

use crate::handlers::{chat, passthrough};
use crate::server::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use llm_relay_common::{ClientEvent, ClientRelay, InboundRequest};
use llm_relay_orchestrator::Orchestrator;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[instrument(skip(socket, state), fields(connection_id))]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("connection_id", connection_id.as_str());
    info!("websocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let mut events = state.relay.register(&connection_id);

    // Writer task owns the sink; everything outbound funnels through the
    // relay channel so event order is preserved.
    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("failed to serialize client event: {e}"),
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<InboundRequest>(&text) {
                Ok(request) => dispatch(&state, request, &connection_id).await,
                Err(e) => {
                    warn!("unparseable request frame: {e}");
                    state
                        .relay
                        .notify(&connection_id, ClientEvent::error(format!("bad request: {e}")))
                        .await;
                }
            },
            Message::Close(_) => {
                debug!("client closed connection");
                break;
            }
            _ => {}
        }
    }

    state.relay.unregister(&connection_id);
    writer.abort();
    info!("websocket connection closed");
}

/// Route one request frame by behaviour. Every branch reports failures to the
/// client as an `Error` event; nothing propagates past this point.
async fn dispatch(state: &AppState, request: InboundRequest, connection_id: &str) {
    let model_id = state.model_id(request.model_id.as_deref());
    let relay: Arc<dyn ClientRelay> = state.relay.clone();
    debug!(behaviour = %request.behaviour, %model_id, "dispatching request");

    match request.behaviour.as_str() {
        "advanced-agent" => {
            let orchestrator = Orchestrator::new(
                state.gateway.clone(),
                state.registry.clone(),
                relay,
                &model_id,
            );
            let answer = orchestrator
                .run(&request.behaviour, request.query, connection_id)
                .await;
            info!(outcome = ?answer.outcome, steps = answer.steps_taken, "agent run finished");
        }
        "sentiment" => {
            if let Err(e) = passthrough::sentiment(
                &state.gateway,
                &relay,
                request.query,
                &model_id,
                connection_id,
            )
            .await
            {
                relay.notify(connection_id, ClientEvent::error(e.client_message())).await;
            }
        }
        "pii" => {
            if let Err(e) = passthrough::pii_redact(
                &state.gateway,
                &relay,
                request.query,
                &model_id,
                connection_id,
            )
            .await
            {
                relay.notify(connection_id, ClientEvent::error(e.client_message())).await;
            }
        }
        _ => {
            match chat::chat(
                &state.gateway,
                &relay,
                &state.store,
                &state.retriever,
                request.query,
                &model_id,
                request.query_vectordb.as_deref(),
                connection_id,
            )
            .await
            {
                Ok(Some(_)) => {}
                Ok(None) => debug!("chat request had nothing to answer"),
                Err(e) => {
                    relay.notify(connection_id, ClientEvent::error(e.client_message())).await;
                }
            }
        }
    }
}
