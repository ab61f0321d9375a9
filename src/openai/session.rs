//! Assistant session: one cached assistant, one fresh thread + run per query.

use crate::config::{ASSISTANT_INSTRUCTIONS, ASSISTANT_NAME, Config};
use crate::openai::api::{AssistantApi, AssistantSpec, Conversation};
use crate::openai::poller::{PollEvent, RunPoller};
use crate::openai::render::render_messages;
use crate::openai::tools::ToolRegistry;
use color_eyre::Result;
use tracing::{info, instrument};

/// セッション単位の状態。アシスタントは初回だけ作成し、以降は再利用する。
pub struct Session<A: AssistantApi> {
    api: A,
    registry: ToolRegistry,
    poller: RunPoller,
    model: String,
    assistant_id: Option<String>,
}

impl<A: AssistantApi> Session<A> {
    pub fn new(api: A, registry: ToolRegistry, config: &Config) -> Self {
        Self {
            api,
            registry,
            poller: RunPoller::from_config(config),
            model: config.model.clone(),
            assistant_id: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Cached assistant id, if one has been created in this session.
    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    pub fn assistant_spec(&self) -> AssistantSpec {
        AssistantSpec {
            name: ASSISTANT_NAME.to_string(),
            instructions: ASSISTANT_INSTRUCTIONS.to_string(),
            model: self.model.clone(),
            tools: self.registry.schemas(),
        }
    }

    pub async fn get_or_create_assistant(&mut self) -> Result<String> {
        if let Some(id) = &self.assistant_id {
            return Ok(id.clone());
        }
        let id = self.api.create_assistant(&self.assistant_spec()).await?;
        info!(target: "openai", assistant_id = %id, "assistant_cached");
        self.assistant_id = Some(id.clone());
        Ok(id)
    }

    /// New thread seeded with `user_text`, plus a run of the cached assistant on it.
    #[instrument(name = "start_conversation", skip(self, user_text), fields(len = user_text.len()))]
    pub async fn start_conversation(&mut self, user_text: &str) -> Result<Conversation> {
        let assistant_id = self.get_or_create_assistant().await?;
        let thread_id = self.api.create_thread(user_text).await?;
        let run = self.api.create_run(&thread_id, &assistant_id).await?;
        info!(target: "openai", thread_id = %thread_id, run_id = %run.id, "conversation_started");
        Ok(Conversation { thread_id, run_id: run.id })
    }

    /// Full round trip for one query: start, poll to completion, render the thread.
    pub async fn research(
        &mut self,
        user_text: &str,
        observer: &mut dyn FnMut(&PollEvent),
    ) -> Result<Vec<String>> {
        let conversation = self.start_conversation(user_text).await?;
        self.poller
            .wait_for_completion(&self.api, &self.registry, &conversation, observer)
            .await?;
        let messages = self.api.list_messages(&conversation.thread_id).await?;
        Ok(render_messages(messages))
    }
}
