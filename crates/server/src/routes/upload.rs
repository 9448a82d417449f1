//! File upload endpoint: data-url payloads persisted through the blob store.

use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub id: String,
    /// `data:<media-type>;base64,<payload>` as produced by browser file
    /// readers.
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn upload_file_data(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> (StatusCode, Json<UploadResponse>) {
    let (extension, bytes) = match parse_data_url(&request.content) {
        Ok(parsed) => parsed,
        Err(reason) => {
            warn!(id = %request.id, "rejected upload: {reason}");
            return (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse { success: false, key: None, error: Some(reason) }),
            );
        }
    };

    let key = format!("{}.{}", request.id, extension);
    match state.store.put(&key, &bytes).await {
        Ok(()) => {
            info!(%key, size = bytes.len(), "stored uploaded file");
            (
                StatusCode::OK,
                Json(UploadResponse { success: true, key: Some(key), error: None }),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UploadResponse { success: false, key: None, error: Some(e.to_string()) }),
        ),
    }
}

/// Split a data url into its file extension and decoded payload. The
/// extension comes from the media subtype; anything unrecognizable falls back
/// to `png`.
fn parse_data_url(content: &str) -> Result<(String, Vec<u8>), String> {
    let stripped = content
        .strip_prefix("data:")
        .ok_or_else(|| "content is not a data url".to_string())?;
    let (header, payload) = stripped
        .split_once(',')
        .ok_or_else(|| "data url has no payload separator".to_string())?;

    let media_type = header.split(';').next().unwrap_or_default();
    let extension = media_type
        .split('/')
        .nth(1)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png")
        .to_string();

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| format!("payload is not valid base64: {e}"))?;
    Ok((extension, bytes))
}
