use crate::relay::WebSocketRelay;
use crate::retrieval::{ContextRetriever, NoopRetriever};
use crate::storage::{BlobStore, LocalBlobStore};
use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use llm_relay_common::SystemConfig;
use llm_relay_gateway::{AnthropicGateway, ModelGateway};
use llm_relay_orchestrator::AgentRegistry;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handles for every route and connection task.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ModelGateway>,
    pub registry: Arc<AgentRegistry>,
    pub relay: Arc<WebSocketRelay>,
    pub store: Arc<dyn BlobStore>,
    pub retriever: Arc<dyn ContextRetriever>,
    pub config: Arc<SystemConfig>,
}

impl AppState {
    pub fn from_config(config: SystemConfig) -> Self {
        let gateway = Arc::new(AnthropicGateway::from_config(&config.model));
        let registry = Arc::new(AgentRegistry::from_config(&config.agents));
        let store = Arc::new(LocalBlobStore::new(config.server.upload_dir.clone()));
        Self {
            gateway,
            registry,
            relay: Arc::new(WebSocketRelay::new()),
            store,
            retriever: Arc::new(NoopRetriever),
            config: Arc::new(config),
        }
    }

    /// Model to use for a request, falling back to the configured default.
    pub fn model_id(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .unwrap_or_else(|| self.config.model.default_model_id.clone())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(crate::routes::ws::websocket_handler))
        .route("/rag/file_data", post(crate::routes::upload::upload_file_data))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.listen_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
