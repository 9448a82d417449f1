//! The bounded orchestration loop.
//!
//! One run owns its history exclusively: sanitize, classify, then up to
//! [`MAX_PLAN_STEPS`] execute/interpret/handoff rounds. Every branch ends in
//! a defined terminal outcome; no error from the gateway or relay escapes to
//! the transport layer.

use crate::interpreter::{self, interpret_step};
use crate::prompts;
use crate::registry::{AgentRegistry, AgentSpec};
use crate::sanitize::sanitize_history;
use futures::StreamExt;
use llm_relay_common::{
    ClientEvent, ClientRelay, ContentBlock, ConversationHistory, ConversationTurn, GatewayError,
    Role, END_OF_MESSAGE_ACK, MAX_PLAN_STEPS,
};
use llm_relay_gateway::{Fragment, ModelGateway, ModelRequest};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Answered on the first step, or via the early-exit check.
    AnsweredDirectly,
    /// Answered after one or more handoffs.
    AnsweredAfterSteps,
    /// Planning budget spent without a terminal step.
    ExhaustedFallback,
    /// Classification produced a name outside the registry.
    UnknownAgentFallback,
}

#[derive(Debug, Clone)]
pub struct FinalAnswer {
    pub text: String,
    pub outcome: RunOutcome,
    pub steps_taken: usize,
}

/// Per-run mutable state. Created at run start, owned by the loop, discarded
/// when the run terminates.
struct RunState {
    iteration: usize,
    current_agent: AgentSpec,
    history: ConversationHistory,
}

pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    registry: Arc<AgentRegistry>,
    relay: Arc<dyn ClientRelay>,
    model_id: String,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: Arc<AgentRegistry>,
        relay: Arc<dyn ClientRelay>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            registry,
            relay,
            model_id: model_id.into(),
        }
    }

    /// Drive one request to a terminal outcome. Never returns an error:
    /// upstream faults surface as an `Error` client event plus the apology
    /// fallback.
    #[instrument(skip(self, history), fields(run_id = %Uuid::new_v4(), agent_type = %requested_agent_type))]
    pub async fn run(
        &self,
        requested_agent_type: &str,
        history: ConversationHistory,
        connection_id: &str,
    ) -> FinalAnswer {
        match self.run_inner(requested_agent_type, history, connection_id).await {
            Ok(answer) => {
                info!(outcome = ?answer.outcome, steps = answer.steps_taken, "run terminated");
                answer
            }
            Err(fault) => {
                warn!("run ended on gateway fault: {fault}");
                self.notify(connection_id, ClientEvent::error(fault.client_message())).await;
                FinalAnswer {
                    text: prompts::APOLOGY.to_string(),
                    outcome: RunOutcome::ExhaustedFallback,
                    steps_taken: 0,
                }
            }
        }
    }

    async fn run_inner(
        &self,
        requested_agent_type: &str,
        mut history: ConversationHistory,
        connection_id: &str,
    ) -> Result<FinalAnswer, GatewayError> {
        // Caller-supplied history only; runs once, before classification.
        sanitize_history(&mut history);

        let classifier = match self.registry.resolve(requested_agent_type) {
            Some(spec) => spec.clone(),
            None => {
                warn!("unknown requested agent type {requested_agent_type}");
                let mut state = RunState {
                    iteration: 0,
                    current_agent: AgentSpec {
                        name: requested_agent_type.to_string(),
                        system_prompt: String::new(),
                        output_tag: None,
                        output_tag_list: None,
                    },
                    history,
                };
                return Ok(self.unknown_agent_fallback(&mut state, connection_id).await);
            }
        };

        self.notify(connection_id, ClientEvent::progress("Hang in there, generating results", false))
            .await;

        let label = self.classify(&classifier, &history).await?;
        let current_agent = match self.registry.resolve(&label) {
            Some(spec) => spec.clone(),
            None => {
                let mut state = RunState { iteration: 0, current_agent: classifier, history };
                return Ok(self.unknown_agent_fallback(&mut state, connection_id).await);
            }
        };
        self.notify(
            connection_id,
            ClientEvent::progress(format!("Hang in there, current agent: {}", current_agent.name), false),
        )
        .await;

        let mut state = RunState { iteration: 0, current_agent, history };

        while state.iteration < MAX_PLAN_STEPS {
            let step = state.iteration;
            // Sent before blocking on the model; the only user-visible
            // signal during a long step.
            self.notify(
                connection_id,
                ClientEvent::progress(
                    format!("Hang in there, current agent: {}, step: {step}", state.current_agent.name),
                    false,
                ),
            )
            .await;

            let raw = self
                .gateway
                .invoke(ModelRequest::new(
                    &state.current_agent.system_prompt,
                    state.history.clone(),
                    &self.model_id,
                ))
                .await?;
            debug!(step, agent = %state.current_agent.name, "step output: {raw}");

            // Interpreted against the history prior to this call.
            let decision = interpret_step(&raw, &state.history);
            state
                .history
                .push(ConversationTurn::assistant(decision.assistant_append.clone()));

            if !decision.done {
                if let Some(question) = &decision.clarifying_prompt {
                    state
                        .history
                        .push(ConversationTurn::user(vec![ContentBlock::text(question.clone())]));
                    self.notify(connection_id, ClientEvent::progress("Working on it", false)).await;

                    let reply = self
                        .stream_to_client(
                            prompts::can_answer_request(&state.history, &self.model_id),
                            connection_id,
                        )
                        .await?;
                    if let Some(answer) = interpreter::extract_tag(&reply, interpreter::CAN_ANSWER_TAG)
                    {
                        // The orchestrator can answer directly; bypass
                        // further iteration even though the step was not
                        // done.
                        let answer = answer.trim().to_string();
                        state
                            .history
                            .push(ConversationTurn::assistant(vec![ContentBlock::text(answer.clone())]));
                        self.notify(connection_id, ClientEvent::prompt_flow(&state.history, true)).await;
                        return Ok(FinalAnswer {
                            text: answer,
                            outcome: RunOutcome::AnsweredDirectly,
                            steps_taken: step + 1,
                        });
                    }
                }
            }

            if decision.done {
                if decision.contains_artifact {
                    self.notify(connection_id, ClientEvent::progress("Artifact created ..", true)).await;
                }
                let text = decision
                    .user_visible_reply
                    .unwrap_or_else(|| raw.trim().to_string());
                self.notify(connection_id, ClientEvent::text(text.clone())).await;
                self.notify(connection_id, ClientEvent::prompt_flow(&state.history, true)).await;
                let outcome = if step == 0 {
                    RunOutcome::AnsweredDirectly
                } else {
                    RunOutcome::AnsweredAfterSteps
                };
                return Ok(FinalAnswer { text, outcome, steps_taken: step + 1 });
            }

            // Reclassify over the whole accumulated history; the agent may
            // change on every iteration.
            let label = self.classify(&classifier, &state.history).await?;
            match self.registry.resolve(&label) {
                None => {
                    warn!(step, "classification returned unknown agent {label}");
                    state.iteration = step + 1;
                    return Ok(self.unknown_agent_fallback(&mut state, connection_id).await);
                }
                Some(next) => {
                    state.current_agent = next.clone();
                    self.notify(
                        connection_id,
                        ClientEvent::progress(
                            format!("Hang in there, next agent: {} assigned", next.name),
                            false,
                        ),
                    )
                    .await;
                }
            }

            if let Some(last) = state.history.last_mut() {
                last.content.push(ContentBlock::text(prompts::CONTINUATION_NUDGE));
            }

            state.iteration = step + 1;
        }

        // Budget spent without a terminal step.
        state
            .history
            .push(ConversationTurn::assistant(vec![ContentBlock::text(prompts::APOLOGY)]));
        self.notify(connection_id, ClientEvent::prompt_flow(&state.history, true)).await;
        Ok(FinalAnswer {
            text: prompts::APOLOGY.to_string(),
            outcome: RunOutcome::ExhaustedFallback,
            steps_taken: MAX_PLAN_STEPS,
        })
    }

    /// Classification call: non-streaming, label extracted through the
    /// classifier's output tags.
    async fn classify(
        &self,
        classifier: &AgentSpec,
        history: &ConversationHistory,
    ) -> Result<String, GatewayError> {
        let raw = self
            .gateway
            .invoke(ModelRequest::new(
                &classifier.system_prompt,
                history.clone(),
                &self.model_id,
            ))
            .await?;
        Ok(extract_label(&raw, classifier))
    }

    /// Terminal path for an unrecognized agent name. Salvages an embedded
    /// function result from the most recent user turn when one exists;
    /// otherwise the fixed apology stands in as the answer.
    async fn unknown_agent_fallback(&self, state: &mut RunState, connection_id: &str) -> FinalAnswer {
        let salvaged = state
            .history
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .and_then(|turn| {
                interpreter::extract_tag(&turn.joined_text(), interpreter::FUNCTION_RESULT_TAG)
            })
            .map(|text| text.trim().to_string());

        let text = match salvaged {
            Some(answer) => {
                debug!("salvaged function result as final answer");
                state
                    .history
                    .push(ConversationTurn::assistant(vec![ContentBlock::text(answer.clone())]));
                answer
            }
            None => {
                state
                    .history
                    .push(ConversationTurn::assistant(vec![ContentBlock::text(prompts::APOLOGY)]));
                prompts::APOLOGY.to_string()
            }
        };

        self.notify(connection_id, ClientEvent::text(text.clone())).await;
        self.notify(connection_id, ClientEvent::prompt_flow(&state.history, true)).await;
        FinalAnswer {
            text,
            outcome: RunOutcome::UnknownAgentFallback,
            steps_taken: state.iteration,
        }
    }

    /// Streaming side invocation: fragments are forwarded to the client in
    /// arrival order and collected for interpretation.
    async fn stream_to_client(
        &self,
        request: ModelRequest,
        connection_id: &str,
    ) -> Result<String, GatewayError> {
        let mut stream = self.gateway.invoke_streaming(request).await?;
        let mut collected = String::new();
        while let Some(fragment) = stream.next().await {
            match fragment {
                Fragment::Text(text) => {
                    self.notify(connection_id, ClientEvent::text(text.clone())).await;
                    collected.push_str(&text);
                }
                Fragment::EndOfMessage => {
                    self.notify(connection_id, ClientEvent::text(END_OF_MESSAGE_ACK)).await;
                    break;
                }
            }
        }
        Ok(collected)
    }

    /// Best-effort relay; delivery failures are the relay's problem.
    async fn notify(&self, connection_id: &str, event: ClientEvent) {
        self.relay.notify(connection_id, event).await;
    }
}

/// Resolve a classification output to a label: the configured output tag
/// first, then each fallback tag, then the trimmed raw text.
fn extract_label(raw: &str, classifier: &AgentSpec) -> String {
    if let Some(tag) = &classifier.output_tag {
        if let Some(label) = interpreter::extract_tag(raw, tag) {
            return label.trim().to_string();
        }
    }
    if let Some(tags) = &classifier.output_tag_list {
        for tag in tags {
            if let Some(label) = interpreter::extract_tag(raw, tag) {
                return label.trim().to_string();
            }
        }
    }
    raw.trim().to_string()
}
