//! Domain errors surfaced through `color_eyre::Report`.
//!
//! Callers that need to branch on the failure kind can
//! `report.downcast_ref::<AssistantError>()`.

use crate::openai::api::RunStatus;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// The assistant asked for a tool that is not in the registry.
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),

    /// The argument payload could not be parsed or lacks a usable `issue`.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The run reached a terminal state other than `completed`.
    #[error("run {run_id} ended with status {status}: {reason}")]
    RunEnded {
        run_id: String,
        status: RunStatus,
        reason: String,
    },

    #[error("run {run_id} did not complete within {polls} polls")]
    PollLimitExceeded { run_id: String, polls: u32 },

    /// `requires_action` was reported without any pending tool calls.
    #[error("run {0} requires action but carried no tool calls")]
    MissingRequiredAction(String),
}
