//! Tool registry: advertised schemas and the name → handler dispatch table.
//!
//! Both views are derived from the same `ToolDefinition` list, so a tool is
//! either advertised *and* dispatchable or neither.

use crate::config::Config;
use crate::error::AssistantError;
use crate::openai::api::{FunctionSchema, ToolInvocation, ToolOutput};
use crate::openai::tools::core::{ToolDefinition, ToolKind};
use crate::openai::tools::ddg::{DuckDuckGoSearch, build_ddg_issue_tool};
use crate::openai::tools::lookup::LookupService;
use crate::openai::tools::wikipedia::{WikipediaSearch, build_wikipedia_issue_tool};
use color_eyre::{Result, eyre::WrapErr};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Wire the two issue tools to the given lookup services.
    pub fn new(web_search: Arc<dyn LookupService>, reference: Arc<dyn LookupService>) -> Self {
        Self {
            tools: vec![
                build_ddg_issue_tool(web_search),
                build_wikipedia_issue_tool(reference),
            ],
        }
    }

    /// Production wiring: DuckDuckGo + Wikipedia over HTTPS.
    pub fn with_http_services(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(DuckDuckGoSearch::new()?),
            Arc::new(WikipediaSearch::new(&config.wikipedia_lang)?),
        ))
    }

    /// Schema list advertised when the assistant is created.
    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn get(&self, kind: ToolKind) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.kind == kind)
    }

    /// Look up the named tool and parse its JSON payload.
    pub fn resolve(&self, invocation: &ToolInvocation) -> Result<(ToolDefinition, Value), AssistantError> {
        let kind: ToolKind = invocation.name.parse()?;
        let tool = self
            .get(kind)
            .cloned()
            .ok_or_else(|| AssistantError::UnknownTool(invocation.name.clone()))?;
        let args: Value = serde_json::from_str(&invocation.arguments).map_err(|e| {
            AssistantError::InvalidArguments {
                tool: invocation.name.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok((tool, args))
    }

    /// Run one invocation to completion on the blocking pool.
    #[instrument(name = "invoke_tool", skip(self, invocation), fields(tool = %invocation.name, call_id = %invocation.id))]
    pub async fn invoke(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let (tool, args) = self.resolve(invocation)?;
        info!(target: "tools", args = %invocation.arguments, "tool_invoked");

        let output = tokio::task::spawn_blocking(move || tool.execute(&args))
            .await
            .wrap_err("tool task did not finish")?
            .wrap_err_with(|| format!("tool {} failed", invocation.name))?;

        debug!(target: "tools", len = output.len(), "tool_output");
        Ok(ToolOutput {
            tool_call_id: invocation.id.clone(),
            output,
        })
    }
}
