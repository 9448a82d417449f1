//! Context retrieval seam for the plain chat path.

use async_trait::async_trait;
use llm_relay_common::Result;

/// Supplies supporting context for a retrieval-classified question.
///
/// The search backend lives behind this trait; the chat handler only sees an
/// optional block of text to prepend as `<context>`.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, collection: Option<&str>) -> Result<Option<String>>;
}

/// Retriever that never finds anything. Used when no search backend is
/// configured; the model then answers from the conversation alone.
pub struct NoopRetriever;

#[async_trait]
impl ContextRetriever for NoopRetriever {
    async fn retrieve(&self, _query: &str, _collection: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }
}
