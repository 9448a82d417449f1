//! Websocket transport and request dispatch.
//!
//! One websocket connection carries every event for a client: progress
//! updates, streamed answer fragments, prompt-flow snapshots and errors.
//! Requests arrive as JSON frames and are dispatched by behaviour to the
//! orchestrator, a passthrough prompt, or the plain chat path.

pub mod handlers;
pub mod relay;
pub mod retrieval;
pub mod routes;
pub mod server;
pub mod storage;
pub mod tracing_setup;

pub use relay::WebSocketRelay;
pub use retrieval::{ContextRetriever, NoopRetriever};
pub use server::AppState;
pub use storage::{BlobStore, LocalBlobStore};
