//! Assistants API 連携のモジュール

pub mod api;
pub mod client;
pub mod poller;
pub mod render;
pub mod session;
pub mod tools;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// 代表的な公開APIを再エクスポート
pub use api::{
	AssistantApi,
	AssistantSpec,
	Conversation,
	FunctionSchema,
	MessageRole,
	RunSnapshot,
	RunStatus,
	ThreadMessage,
	ToolInvocation,
	ToolOutput,
};
pub use client::OpenAIAssistantApi;
pub use poller::{PollEvent, RunPoller};
pub use render::{escape_markup, render_message, render_messages};
pub use session::Session;
pub use tools::{LookupService, ToolDefinition, ToolKind, ToolRegistry};
pub use worker::{ResearchEvent, spawn_research_worker, start_research_worker};
