use thiserror::Error;

/// Upstream model-invocation faults, normalized from provider-specific
/// errors into the four categories the inference service reports plus the
/// transport-level failures of the gateway itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model internal error: {0}")]
    Internal(String),

    #[error("model stream error: {0}")]
    Stream(String),

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("request validation failed: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Human-readable message surfaced to the client as a terminal fragment.
    pub fn client_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
