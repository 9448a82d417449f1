//! Step interpreter: turns one raw model turn into a typed decision.
//!
//! The rest of the core never inspects raw model text; every marker the
//! model can emit is recognized here and defaults apply when a marker is
//! absent or malformed.

use llm_relay_common::{ContentBlock, ConversationHistory, Role};

/// Terminal reply wrapper emitted by a worker agent.
pub const FINAL_ANSWER_TAG: &str = "final_answer";
/// Clarifying question the agent wants relayed to a human.
pub const QUESTION_TAG: &str = "question";
/// Classification label wrapper.
pub const AGENT_NAME_TAG: &str = "agent_name";
/// Embedded tool output a prior step placed into a user turn.
pub const FUNCTION_RESULT_TAG: &str = "function_result";
/// Marks generated content as a renderable/downloadable artifact.
pub const ARTIFACT_TAG: &str = "artifact";
/// Completion marker of the "can the orchestrator answer" side invocation.
pub const CAN_ANSWER_TAG: &str = "can_answer";

/// What one model turn told the orchestrator to do next.
#[derive(Debug, Clone, Default)]
pub struct StepDecision {
    pub done: bool,
    /// Present whenever `done` is true; always derived from
    /// `assistant_append`.
    pub user_visible_reply: Option<String>,
    /// Content appended to history as the assistant turn for this step.
    pub assistant_append: Vec<ContentBlock>,
    /// Human-directed prompt that may trigger the early-exit check.
    pub clarifying_prompt: Option<String>,
    /// Agent the output explicitly named, if any. The loop reclassifies
    /// regardless; this is advisory.
    pub next_agent: Option<String>,
    pub contains_artifact: bool,
}

/// Parse one step output against the history prior to the call.
///
/// Missing or malformed markers never abort the run: the default decision is
/// "not done, no next agent, no artifact" with the raw output appended as
/// the assistant turn.
pub fn interpret_step(raw: &str, prior_history: &ConversationHistory) -> StepDecision {
    let mut decision = StepDecision {
        assistant_append: vec![ContentBlock::text(raw.trim())],
        // Artifact markers count whether or not the turn is terminal.
        contains_artifact: raw.contains(&open_tag(ARTIFACT_TAG)),
        ..StepDecision::default()
    };

    if let Some(answer) = extract_tag(raw, FINAL_ANSWER_TAG) {
        decision.done = true;
        decision.user_visible_reply = Some(answer.trim().to_string());
    }

    if !decision.done {
        if let Some(question) = extract_tag(raw, QUESTION_TAG) {
            let question = question.trim().to_string();
            // A question the user already saw verbatim is not asked again;
            // re-raising it would loop without adding information.
            if !already_asked(&question, prior_history) {
                decision.clarifying_prompt = Some(question);
            }
        }
    }

    decision.next_agent = extract_tag(raw, AGENT_NAME_TAG).map(|name| name.trim().to_string());

    decision
}

/// Extract the innermost span wrapped by `<tag>...</tag>`.
///
/// Returns `None` when the tag is absent or unterminated. Repeated tags
/// yield the first complete span; nested tags resolve to the innermost
/// occurrence so wrapper echoes from the model do not leak markers.
pub fn extract_tag(raw: &str, tag: &str) -> Option<String> {
    let open = open_tag(tag);
    let close = close_tag(tag);

    let start = raw.find(&open)?;
    let inner = &raw[start + open.len()..];
    let end = inner.find(&close)?;
    let mut span = &inner[..end];

    // Nested open tags: descend to the innermost span.
    while let Some(nested) = span.find(&open) {
        span = &span[nested + open.len()..];
    }
    Some(span.to_string())
}

fn open_tag(tag: &str) -> String {
    format!("<{tag}>")
}

fn close_tag(tag: &str) -> String {
    format!("</{tag}>")
}

fn already_asked(question: &str, history: &ConversationHistory) -> bool {
    history
        .iter()
        .filter(|turn| turn.role == Role::User)
        .any(|turn| turn.joined_text().contains(question))
}
