//! `AssistantApi` backed by the hosted OpenAI Assistants API (async-openai).

use crate::openai::api::{
    AssistantApi, AssistantSpec, FunctionSchema, MessageRole, RunSnapshot, RunStatus,
    ThreadMessage, ToolInvocation, ToolOutput,
};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AssistantTools, AssistantToolsFunction, CreateAssistantRequestArgs, CreateMessageRequestArgs,
    CreateRunRequestArgs, CreateThreadRequestArgs, FunctionObject, MessageContent, MessageObject,
    MessageRole as ApiMessageRole, RunObject, RunStatus as ApiRunStatus,
    SubmitToolOutputsRunRequest, ToolsOutputs,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use color_eyre::{Result, eyre::WrapErr};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Assistants API クライアント。API キーはここにだけ保持する。
#[derive(Clone)]
pub struct OpenAIAssistantApi {
    client: Client<OpenAIConfig>,
}

impl std::fmt::Debug for OpenAIAssistantApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIAssistantApi").finish_non_exhaustive()
    }
}

impl OpenAIAssistantApi {
    pub fn new(api_key: &str) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_key(api_key))
    }

    /// 各リクエストは一度だけ送信する (5xx / 429 でも再送しない)。
    pub fn with_config(config: OpenAIConfig) -> Self {
        let client = Client::with_config(config).with_backoff(single_attempt());
        Self { client }
    }
}

fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

fn function_object(schema: &FunctionSchema) -> FunctionObject {
    FunctionObject {
        name: schema.name.clone(),
        description: Some(schema.description.clone()),
        parameters: Some(schema.parameters.clone()),
        strict: None,
    }
}

fn run_status(status: &ApiRunStatus) -> RunStatus {
    match status {
        ApiRunStatus::Queued => RunStatus::Queued,
        ApiRunStatus::InProgress => RunStatus::InProgress,
        ApiRunStatus::RequiresAction => RunStatus::RequiresAction,
        ApiRunStatus::Cancelling => RunStatus::Cancelling,
        ApiRunStatus::Cancelled => RunStatus::Cancelled,
        ApiRunStatus::Failed => RunStatus::Failed,
        ApiRunStatus::Completed => RunStatus::Completed,
        ApiRunStatus::Incomplete => RunStatus::Incomplete,
        ApiRunStatus::Expired => RunStatus::Expired,
    }
}

fn run_snapshot(run: RunObject) -> RunSnapshot {
    let tool_calls = run
        .required_action
        .map(|action| {
            action
                .submit_tool_outputs
                .tool_calls
                .into_iter()
                .map(|call| ToolInvocation {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect()
        })
        .unwrap_or_default();

    RunSnapshot {
        status: run_status(&run.status),
        id: run.id,
        thread_id: run.thread_id,
        tool_calls,
        last_error: run.last_error.map(|e| e.message),
    }
}

fn thread_message(message: MessageObject) -> ThreadMessage {
    let role = match message.role {
        ApiMessageRole::User => MessageRole::User,
        ApiMessageRole::Assistant => MessageRole::Assistant,
    };
    // Text parts only; image/refusal parts have nothing to print.
    let text = message
        .content
        .into_iter()
        .filter_map(|part| match part {
            MessageContent::Text(t) => Some(t.text.value),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");
    ThreadMessage {
        role,
        text,
        created_at: i64::from(message.created_at),
    }
}

#[async_trait]
impl AssistantApi for OpenAIAssistantApi {
    #[instrument(name = "create_assistant", skip(self, spec), fields(model = %spec.model, tools = spec.tools.len()))]
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        let tools: Vec<AssistantTools> = spec
            .tools
            .iter()
            .map(|schema| AssistantTools::Function(AssistantToolsFunction { function: function_object(schema) }))
            .collect();

        let req = CreateAssistantRequestArgs::default()
            .name(spec.name.as_str())
            .instructions(spec.instructions.as_str())
            .model(spec.model.as_str())
            .tools(tools)
            .build()?;

        let assistant = self
            .client
            .assistants()
            .create(req)
            .await
            .wrap_err("creating assistant")?;
        info!(target: "openai", assistant_id = %assistant.id, "assistant_created");
        Ok(assistant.id)
    }

    #[instrument(name = "create_thread", skip(self, user_text), fields(len = user_text.len()))]
    async fn create_thread(&self, user_text: &str) -> Result<String> {
        let message = CreateMessageRequestArgs::default()
            .role(ApiMessageRole::User)
            .content(user_text.to_string())
            .build()?;
        let req = CreateThreadRequestArgs::default()
            .messages(vec![message])
            .build()?;

        let thread = self
            .client
            .threads()
            .create(req)
            .await
            .wrap_err("creating thread")?;
        debug!(target: "openai", thread_id = %thread.id, "thread_created");
        Ok(thread.id)
    }

    #[instrument(name = "create_run", skip(self))]
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunSnapshot> {
        let req = CreateRunRequestArgs::default()
            .assistant_id(assistant_id)
            .build()?;
        let run = self
            .client
            .threads()
            .runs(thread_id)
            .create(req)
            .await
            .wrap_err("creating run")?;
        Ok(run_snapshot(run))
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunSnapshot> {
        let run = self
            .client
            .threads()
            .runs(thread_id)
            .retrieve(run_id)
            .await
            .wrap_err_with(|| format!("retrieving run {run_id}"))?;
        Ok(run_snapshot(run))
    }

    #[instrument(name = "submit_tool_outputs", skip(self, outputs), fields(count = outputs.len()))]
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunSnapshot> {
        let req = SubmitToolOutputsRunRequest {
            tool_outputs: outputs
                .into_iter()
                .map(|o| ToolsOutputs {
                    tool_call_id: Some(o.tool_call_id),
                    output: Some(o.output),
                })
                .collect(),
            stream: None,
        };
        let run = self
            .client
            .threads()
            .runs(thread_id)
            .submit_tool_outputs(run_id, req)
            .await
            .wrap_err_with(|| format!("submitting tool outputs for run {run_id}"))?;
        Ok(run_snapshot(run))
    }

    #[instrument(name = "list_messages", skip(self))]
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let resp = self
            .client
            .threads()
            .messages(thread_id)
            .list(&[("order", "asc"), ("limit", "100")])
            .await
            .wrap_err("listing thread messages")?;
        debug!(target: "openai", count = resp.data.len(), has_more = resp.has_more, "messages_listed");
        Ok(resp.data.into_iter().map(thread_message).collect())
    }
}
