//! Closed set of prompt-construction functions and fixed prompt texts.
//!
//! Every model call in the system goes through one of these typed builders;
//! nothing else assembles prompt dictionaries ad hoc.

use llm_relay_common::ConversationHistory;
use llm_relay_gateway::ModelRequest;

/// Appended to the last history turn after each non-terminal step to bias
/// the next call toward convergence.
pub const CONTINUATION_NUDGE: &str =
    "\n\nIf you know the answer, say it. If not, what is the next step?";

/// Fixed fallback reply for exhausted or unsalvageable runs.
pub const APOLOGY: &str = "I apologize but I can't answer this question";

pub const CLASSIFICATION_PROMPT: &str = "\
You are the routing step of an assistant. Read the conversation and decide \
which specialist should act next. The available specialists are: math \
(arithmetic and quantitative questions), research (questions needing \
external lookups), writer (drafting and formatting output for the user). \
Reply with exactly one specialist name wrapped as \
<agent_name>name</agent_name> and nothing else.";

pub const MATH_AGENT_PROMPT: &str = "\
You are the math specialist. Work the problem step by step. When the result \
is final, reply with <final_answer>result</final_answer>. If you are missing \
information only the user can supply, ask for it inside \
<question>...</question>.";

pub const RESEARCH_AGENT_PROMPT: &str = "\
You are the research specialist. Use any <context> or <function_result> \
material already present in the conversation. When the answer is complete, \
wrap it in <final_answer>...</final_answer>; otherwise state the next lookup \
that is needed, or ask the user inside <question>...</question>.";

pub const WRITER_AGENT_PROMPT: &str = "\
You are the writing specialist. Produce the requested document. Wrap \
downloadable output in <artifact>...</artifact> and your finished reply in \
<final_answer>...</final_answer>.";

const CAN_ANSWER_PROMPT: &str = "\
Look at the conversation so far. If the information already gathered is \
enough to answer the user's original question, reply with the answer wrapped \
as <can_answer>answer</can_answer>. If it is not enough, reply with the \
single word NO.";

/// Chat-bot system prompt for the plain (non-agent) request path.
pub const RAG_CHAT_PROMPT: &str = "\
You are a helpful assistant. Answer the question inside <user-question> \
using the material inside <context> when it is present. If the context does \
not cover the question, say so instead of guessing.";

/// Addendum applied when the request is conversational rather than a lookup.
pub const CASUAL_PROMPT: &str = "\
 The user is making casual conversation; respond naturally and briefly, and \
do not mention retrieval or context.";

pub const CLASSIFY_TRANSLATE_PROMPT: &str = "\
Classify the user's message. Reply with <query_type>RETRIEVAL</query_type> \
if answering needs stored documents, or <query_type>CASUAL</query_type> for \
small talk. If the message is not in English, additionally provide \
<translated_query>an English translation</translated_query>.";

pub const SENTIMENT_PROMPT: &str = "\
Assess the sentiment of the user's messages as positive, negative or \
neutral, and justify the assessment in one sentence.";

pub const PII_REDACT_PROMPT: &str = "\
Rewrite the user's text with every piece of personally identifiable \
information (names, addresses, phone numbers, account identifiers) replaced \
by the placeholder [REDACTED]. Reply with the rewritten text only.";

/// Side invocation asking whether the orchestrator can already answer
/// directly with what it has.
pub fn can_answer_request(history: &ConversationHistory, model_id: &str) -> ModelRequest {
    ModelRequest::new(CAN_ANSWER_PROMPT, history.clone(), model_id)
}
