//! Run poller: drives a remote run to `completed`, answering tool calls on the way.
//!
//! Status is re-fetched after a fixed delay. `requires_action` is answered
//! with one batch holding an output for every pending invocation. Failure
//! states (`failed`, `expired`, `cancelled`, `incomplete`) and the poll bound
//! end the loop with an [`AssistantError`].

use crate::config::Config;
use crate::error::AssistantError;
use crate::openai::api::{AssistantApi, Conversation, RunSnapshot, RunStatus, ToolOutput};
use crate::openai::tools::ToolRegistry;
use color_eyre::Result;
use std::fmt::{self, Display};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Progress reported to the caller while polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Status { poll: u32, status: RunStatus },
    ToolCalled { name: String, arguments: String },
    OutputsSubmitted { count: usize },
    Completed { polls: u32 },
}

impl Display for PollEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollEvent::Status { poll, status } => write!(f, "Poll #{poll}: {status}"),
            PollEvent::ToolCalled { name, arguments } => {
                write!(f, "Calling function: {name} with arg {arguments}")
            }
            PollEvent::OutputsSubmitted { count } => write!(f, "Submitted {count} tool output(s)"),
            PollEvent::Completed { polls } => write!(f, "Run completed after {polls} poll(s)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPoller {
    interval: Duration,
    max_polls: u32,
}

impl RunPoller {
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self { interval, max_polls }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval(), config.max_polls)
    }

    /// Poll until the run completes. Returns the final snapshot.
    #[instrument(name = "wait_for_completion", skip(self, api, registry, observer), fields(run_id = %conversation.run_id))]
    pub async fn wait_for_completion<A>(
        &self,
        api: &A,
        registry: &ToolRegistry,
        conversation: &Conversation,
        observer: &mut dyn FnMut(&PollEvent),
    ) -> Result<RunSnapshot>
    where
        A: AssistantApi + ?Sized,
    {
        let Conversation { thread_id, run_id } = conversation;
        let mut polls: u32 = 1;
        let mut run = api.retrieve_run(thread_id, run_id).await?;

        loop {
            debug!(target: "openai", poll = polls, status = %run.status, "run_status");
            observer(&PollEvent::Status { poll: polls, status: run.status });

            match run.status {
                status if status.is_terminal() => return finish(run, polls, observer),
                RunStatus::RequiresAction => {
                    let outputs = self.collect_outputs(registry, &run, observer).await?;
                    let count = outputs.len();
                    api.submit_tool_outputs(thread_id, run_id, outputs).await?;
                    info!(target: "openai", count, "tool_outputs_submitted");
                    observer(&PollEvent::OutputsSubmitted { count });
                }
                _ => {}
            }

            if polls >= self.max_polls {
                return Err(AssistantError::PollLimitExceeded {
                    run_id: run_id.clone(),
                    polls,
                }
                .into());
            }
            tokio::time::sleep(self.interval).await;
            run = api.retrieve_run(thread_id, run_id).await?;
            polls += 1;
        }
    }

    /// One output per pending invocation, in invocation order. Any failure aborts the batch.
    async fn collect_outputs(
        &self,
        registry: &ToolRegistry,
        run: &RunSnapshot,
        observer: &mut dyn FnMut(&PollEvent),
    ) -> Result<Vec<ToolOutput>> {
        if run.tool_calls.is_empty() {
            return Err(AssistantError::MissingRequiredAction(run.id.clone()).into());
        }
        let mut outputs = Vec::with_capacity(run.tool_calls.len());
        for call in &run.tool_calls {
            observer(&PollEvent::ToolCalled {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });
            outputs.push(registry.invoke(call).await?);
        }
        Ok(outputs)
    }
}

fn finish(run: RunSnapshot, polls: u32, observer: &mut dyn FnMut(&PollEvent)) -> Result<RunSnapshot> {
    if run.status == RunStatus::Completed {
        info!(target: "openai", polls, "run_completed");
        observer(&PollEvent::Completed { polls });
        return Ok(run);
    }
    warn!(target: "openai", status = %run.status, last_error = ?run.last_error, "run_ended_without_answer");
    Err(AssistantError::RunEnded {
        reason: run.last_error.unwrap_or_else(|| "no error reported".to_string()),
        run_id: run.id,
        status: run.status,
    }
    .into())
}
