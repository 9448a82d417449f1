//! Plain chat path: retrieval-or-casual classification, question wrapping,
//! optional context prepend, storage-reference hygiene, streamed reply.

use crate::handlers::stream_reply;
use crate::retrieval::ContextRetriever;
use crate::storage::BlobStore;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use llm_relay_common::{
    ClientRelay, ContentBlock, ConversationHistory, ConversationTurn, GatewayResult, Role,
};
use llm_relay_gateway::{ModelGateway, ModelRequest};
use llm_relay_orchestrator::interpreter::extract_tag;
use llm_relay_orchestrator::prompts;
use std::sync::Arc;
use tracing::{debug, warn};

const QUESTION_OPEN: &str = "<user-question>";
const QUESTION_CLOSE: &str = "</user-question>";
const QUERY_TYPE_TAG: &str = "query_type";
const TRANSLATED_QUERY_TAG: &str = "translated_query";

/// Answer the conversation's final user turn. Returns `Ok(None)` without any
/// model call when the final turn is not a user turn.
pub async fn chat(
    gateway: &Arc<dyn ModelGateway>,
    relay: &Arc<dyn ClientRelay>,
    store: &Arc<dyn BlobStore>,
    retriever: &Arc<dyn ContextRetriever>,
    mut history: ConversationHistory,
    model_id: &str,
    collection: Option<&str>,
    connection_id: &str,
) -> GatewayResult<Option<String>> {
    if !matches!(history.last(), Some(turn) if turn.role == Role::User) {
        debug!("final turn is not a user turn, nothing to answer");
        return Ok(None);
    }

    resolve_storage_references(&mut history, store).await;

    let question = history.last().map(ConversationTurn::joined_text).unwrap_or_default();

    // Side call: retrieval-vs-casual, plus an English rendition of the
    // question when the original is not English.
    let classification = gateway
        .invoke(ModelRequest::new(
            prompts::CLASSIFY_TRANSLATE_PROMPT,
            vec![ConversationTurn::user(vec![ContentBlock::text(question.clone())])],
            model_id,
        ))
        .await?;
    let casual = extract_tag(&classification, QUERY_TYPE_TAG)
        .map(|label| label.trim().eq_ignore_ascii_case("CASUAL"))
        .unwrap_or(false);
    let effective_question = extract_tag(&classification, TRANSLATED_QUERY_TAG)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or(question);

    let context = if casual {
        None
    } else {
        match retriever.retrieve(&effective_question, collection).await {
            Ok(context) => context,
            Err(e) => {
                warn!("context retrieval failed, answering without it: {e}");
                None
            }
        }
    };

    rewrite_final_turn(&mut history, &effective_question, context.as_deref());

    let mut system = prompts::RAG_CHAT_PROMPT.to_string();
    if casual {
        system.push_str(prompts::CASUAL_PROMPT);
    }
    let reply = stream_reply(
        gateway,
        relay,
        ModelRequest::new(system, history, model_id),
        connection_id,
    )
    .await?;
    Ok(Some(reply))
}

/// Replace the final turn's text blocks with the context block (when present)
/// followed by the wrapped question. Non-text blocks (inlined images) stay in
/// place.
fn rewrite_final_turn(history: &mut ConversationHistory, question: &str, context: Option<&str>) {
    let Some(last) = history.last_mut() else { return };
    let mut text = String::new();
    if let Some(context) = context {
        text.push_str(&format!("<context>\n{context}\n</context>\n\n"));
    }
    text.push_str(&wrap_question(question));
    last.content.retain(|block| block.as_text().is_none());
    last.content.push(ContentBlock::text(text));
}

fn wrap_question(question: &str) -> String {
    if question.contains(QUESTION_OPEN) {
        question.to_string()
    } else {
        format!("{QUESTION_OPEN}{question}{QUESTION_CLOSE}")
    }
}

/// Storage-reference hygiene over the whole history.
///
/// Image blocks in the final user turn that point at an uploaded file are
/// inlined as base64 so the model can see them; references anywhere earlier
/// are stale and collapse to a textual placeholder. Raw storage keys never
/// leave this function.
async fn resolve_storage_references(history: &mut ConversationHistory, store: &Arc<dyn BlobStore>) {
    let last_index = history.len().saturating_sub(1);
    for (index, turn) in history.iter_mut().enumerate() {
        let mut rewritten = Vec::with_capacity(turn.content.len());
        for block in turn.content.drain(..) {
            let replacement = match block {
                ContentBlock::Image { source } if source.partial_storage_key.is_some() => {
                    let key = storage_key(&source);
                    if index == last_index {
                        match store.get(&key).await {
                            Ok(bytes) => ContentBlock::Image {
                                source: llm_relay_common::ImageSource::base64(
                                    media_type_for(source.file_extension.as_deref()),
                                    BASE64.encode(bytes),
                                ),
                            },
                            Err(e) => {
                                warn!(key, "stored file unavailable, redacting: {e}");
                                redacted_reference(&key)
                            }
                        }
                    } else {
                        redacted_reference(&key)
                    }
                }
                other => other,
            };
            rewritten.push(replacement);
        }
        turn.content = rewritten;
    }
}

fn storage_key(source: &llm_relay_common::ImageSource) -> String {
    let base = source.partial_storage_key.clone().unwrap_or_default();
    match &source.file_extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

fn redacted_reference(key: &str) -> ContentBlock {
    ContentBlock::text(format!("content at storage location: {key}"))
}

fn media_type_for(extension: Option<&str>) -> String {
    match extension {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("gif") => "image/gif".to_string(),
        Some("webp") => "image/webp".to_string(),
        _ => "image/png".to_string(),
    }
}
