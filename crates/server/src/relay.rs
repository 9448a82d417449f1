//! Connection registry and outbound event relay.

use async_trait::async_trait;
use dashmap::DashMap;
use llm_relay_common::{ClientEvent, ClientRelay};
use tokio::sync::mpsc;
use tracing::debug;

/// Relay backed by the live websocket connection table.
///
/// Each connection registers an unbounded sender whose receiving end is owned
/// by that connection's writer task, so events for one connection are
/// delivered in generation order. A missing or closed connection drops the
/// event; producing runs never block on a dead client.
#[derive(Default)]
pub struct WebSocketRelay {
    connections: DashMap<String, mpsc::UnboundedSender<ClientEvent>>,
}

impl WebSocketRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and hand back the receiving end for its writer
    /// task.
    pub fn register(&self, connection_id: &str) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(connection_id.to_string(), tx);
        rx
    }

    pub fn unregister(&self, connection_id: &str) {
        self.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl ClientRelay for WebSocketRelay {
    async fn notify(&self, connection_id: &str, event: ClientEvent) {
        match self.connections.get(connection_id) {
            Some(tx) => {
                if tx.send(event).is_err() {
                    debug!(connection_id, "dropping event for closed connection");
                }
            }
            None => debug!(connection_id, "dropping event for unknown connection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let relay = WebSocketRelay::new();
        let mut rx = relay.register("conn-1");
        relay.notify("conn-1", ClientEvent::progress("one", false)).await;
        relay.notify("conn-1", ClientEvent::text("two")).await;

        assert_eq!(rx.recv().await, Some(ClientEvent::progress("one", false)));
        assert_eq!(rx.recv().await, Some(ClientEvent::text("two")));
    }

    #[tokio::test]
    async fn unknown_connection_drops_event_silently() {
        let relay = WebSocketRelay::new();
        relay.notify("nobody", ClientEvent::text("lost")).await;
        assert_eq!(relay.connection_count(), 0);
    }

    #[tokio::test]
    async fn unregister_closes_the_channel() {
        let relay = WebSocketRelay::new();
        let mut rx = relay.register("conn-1");
        relay.unregister("conn-1");
        relay.notify("conn-1", ClientEvent::text("late")).await;
        assert_eq!(rx.recv().await, None);
    }
}
