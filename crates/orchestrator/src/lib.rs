//! Agent orchestration core
//!
//! Classifies a user request into a named agent role, drives the bounded
//! planning loop against the model gateway, and streams progress back to the
//! client through the relay. All raw-text marker scanning lives in
//! [`interpreter`] and [`sanitize`]; the loop itself only sees typed
//! decisions.

pub mod interpreter;
pub mod prompts;
pub mod registry;
pub mod run_loop;
pub mod sanitize;

pub use interpreter::{interpret_step, StepDecision};
pub use registry::{AgentRegistry, AgentSpec};
pub use run_loop::{FinalAnswer, Orchestrator, RunOutcome};
