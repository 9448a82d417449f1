//! Client-facing streaming relay seam.

use crate::types::ClientEvent;
use async_trait::async_trait;

/// Forwards events to the originating client connection.
///
/// Delivery is best-effort and fire-and-forget: a disconnected client must
/// never abort the run that is producing events for it. Implementations log
/// and swallow delivery failures.
#[async_trait]
pub trait ClientRelay: Send + Sync {
    async fn notify(&self, connection_id: &str, event: ClientEvent);
}

/// Relay that drops every event. Used when no client is attached.
pub struct NullRelay;

#[async_trait]
impl ClientRelay for NullRelay {
    async fn notify(&self, _connection_id: &str, _event: ClientEvent) {}
}
