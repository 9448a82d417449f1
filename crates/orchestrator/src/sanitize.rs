//! Reserved-tag redaction for caller-supplied history.
//!
//! Assistant turns from earlier runs can carry delimiter tags whose spans
//! hold storage links that have since expired. Those spans are scrubbed once,
//! before classification, so internal routing syntax never feeds back into
//! the model as literal text.

use llm_relay_common::{ContentBlock, ConversationHistory};

/// Delimiter pairs whose spans must never re-enter a prompt. Processed in
/// this exact order; a tag may appear any number of times.
pub const RESERVED_TAGS: [(&str, &str); 2] = [
    ("<artifact>", "</artifact>"),
    ("<download-link>", "</download-link>"),
];

/// Neutral placeholder substituted for each redacted span.
pub const REDACTION_PLACEHOLDER: &str = "(S3).";

/// Scrub every text block in place. Runs exactly once per run, on the
/// caller-supplied history only; orchestrator-generated turns are never
/// passed through here.
pub fn sanitize_history(history: &mut ConversationHistory) {
    for turn in history.iter_mut() {
        for block in turn.content.iter_mut() {
            if let ContentBlock::Text { text } = block {
                if RESERVED_TAGS
                    .iter()
                    .any(|(open, close)| text.contains(open) || text.contains(close))
                {
                    *text = sanitize_text(text);
                }
            }
        }
    }
}

pub fn sanitize_text(input: &str) -> String {
    let mut out = input.to_string();
    for (open, close) in RESERVED_TAGS {
        out = redact_spans(&out, open, close);
    }
    out
}

/// Replace every `open..close` span (tags included) with the placeholder.
/// An unpaired open tag redacts just the tag itself; stray close tags are
/// replaced afterwards. The placeholder contains no tag text, so a second
/// pass is a no-op.
fn redact_spans(input: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        out.push_str(REDACTION_PLACEHOLDER);
        let after_open = &rest[start + open.len()..];
        match after_open.find(close) {
            Some(end) => rest = &after_open[end + close.len()..],
            None => rest = after_open,
        }
    }
    out.push_str(rest);
    out.replace(close, REDACTION_PLACEHOLDER)
}
