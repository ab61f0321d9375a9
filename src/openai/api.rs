//! Remote Assistants API seam.
//!
//! The rest of the crate talks to the hosted assistant only through
//! [`AssistantApi`], using the small domain types below. The production
//! implementation lives in `openai::client`; tests plug in scripted fakes.

use async_trait::async_trait;
use color_eyre::Result;
use serde_json::Value;
use std::fmt::{self, Display};

/// Function schema advertised to the assistant (name, description, JSON Schema).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Everything needed to create the remote assistant configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<FunctionSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        }
    }

    /// Terminal states other than `completed`: the run will never produce an answer.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled | RunStatus::Failed | RunStatus::Incomplete | RunStatus::Expired
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == RunStatus::Completed || self.is_failure()
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pending tool call reported by a run in `requires_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Raw JSON argument payload as sent by the assistant.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Point-in-time view of a remote run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    /// Pending invocations; only populated in `requires_action`.
    pub tool_calls: Vec<ToolInvocation>,
    pub last_error: Option<String>,
}

impl RunSnapshot {
    pub fn new(id: impl Into<String>, thread_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            status,
            tool_calls: Vec::new(),
            last_error: None,
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolInvocation>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_last_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => f.write_str("user"),
            MessageRole::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub role: MessageRole,
    pub text: String,
    /// Unix timestamp (seconds) as reported by the API.
    pub created_at: i64,
}

/// Ids returned by `Session::start_conversation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub thread_id: String,
    pub run_id: String,
}

/// Operations consumed from the hosted Assistants API.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Returns the new assistant id.
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String>;

    /// Creates a thread seeded with one user message; returns the thread id.
    async fn create_thread(&self, user_text: &str) -> Result<String>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunSnapshot>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunSnapshot>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunSnapshot>;

    /// All messages of the thread. Order is not guaranteed; the renderer sorts.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
