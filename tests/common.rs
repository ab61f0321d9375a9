#![allow(dead_code)]

use assistant_gpt::openai::{
    AssistantApi, AssistantSpec, MessageRole, RunSnapshot, RunStatus, ThreadMessage, ToolInvocation,
    ToolOutput,
};
use async_trait::async_trait;
use color_eyre::Result;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, Once};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static START: Once = Once::new();
static _GUARD: Lazy<Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Initialize test environment: dotenv and tracing (stderr + file).
/// Idempotent: safe to call multiple times.
pub fn init() {
    START.call_once(|| {
        let _ = dotenvy::dotenv();
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("debug"))
            .expect("env filter");

        let file_appender = rolling::daily("logs", "tests.log");
        let (file_nb, guard) = tracing_appender::non_blocking(file_appender);
        *_GUARD.lock().unwrap() = Some(guard);

        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_test_writer();

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .with_writer(file_nb);

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init();

        tracing::info!(target: "test_init", "Test tracing initialized (stderr + rotating file)");
    });
}

/// Stand-in for the hosted API that plays one research conversation:
/// the first poll asks for the queued tool calls, once outputs arrive the run
/// completes and the assistant reply is `answer(outputs)`.
pub struct FakeAssistantApi {
    pub tool_calls: Vec<ToolInvocation>,
    pub answer: fn(&[ToolOutput]) -> String,
    pub state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub assistants_created: Vec<AssistantSpec>,
    pub threads: Vec<String>,
    pub runs_created: usize,
    pub polls: usize,
    pub submissions: Vec<Vec<ToolOutput>>,
    pub polls_at_submission: Vec<usize>,
    pub messages_listed: usize,
}

impl FakeAssistantApi {
    pub fn new(tool_calls: Vec<ToolInvocation>, answer: fn(&[ToolOutput]) -> String) -> Self {
        Self { tool_calls, answer, state: Arc::new(Mutex::new(FakeState::default())) }
    }

    fn snapshot(&self, status: RunStatus) -> RunSnapshot {
        let state = self.state.lock().unwrap();
        RunSnapshot::new(format!("run_{}", state.runs_created), format!("thread_{}", state.threads.len()), status)
    }
}

#[async_trait]
impl AssistantApi for FakeAssistantApi {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        self.state.lock().unwrap().assistants_created.push(spec.clone());
        Ok("asst_fake".into())
    }

    async fn create_thread(&self, user_text: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.threads.push(user_text.to_string());
        Ok(format!("thread_{}", state.threads.len()))
    }

    async fn create_run(&self, _thread_id: &str, _assistant_id: &str) -> Result<RunSnapshot> {
        {
            let mut state = self.state.lock().unwrap();
            state.runs_created += 1;
            state.submissions.clear();
        }
        Ok(self.snapshot(RunStatus::Queued))
    }

    async fn retrieve_run(&self, _thread_id: &str, _run_id: &str) -> Result<RunSnapshot> {
        let (answered, tool_calls) = {
            let mut state = self.state.lock().unwrap();
            state.polls += 1;
            (!state.submissions.is_empty() || self.tool_calls.is_empty(), self.tool_calls.clone())
        };
        if answered {
            Ok(self.snapshot(RunStatus::Completed))
        } else {
            Ok(self.snapshot(RunStatus::RequiresAction).with_tool_calls(tool_calls))
        }
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunSnapshot> {
        {
            let mut state = self.state.lock().unwrap();
            let polls = state.polls;
            state.polls_at_submission.push(polls);
            state.submissions.push(outputs);
        }
        Ok(self.snapshot(RunStatus::Queued))
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut state = self.state.lock().unwrap();
        state.messages_listed += 1;
        let question = state.threads.last().cloned().unwrap_or_default();
        let outputs: Vec<ToolOutput> = state.submissions.iter().flatten().cloned().collect();
        // newest first, like the API's default ordering
        Ok(vec![
            ThreadMessage { role: MessageRole::Assistant, text: (self.answer)(&outputs), created_at: 1_700_000_010 },
            ThreadMessage { role: MessageRole::User, text: question, created_at: 1_700_000_000 },
        ])
    }
}

pub fn invocation(id: &str, name: &str, issue: &str) -> ToolInvocation {
    ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::json!({ "issue": issue }).to_string(),
    }
}
