//! Core tool definitions: `ToolDefinition`, `ToolKind`, JSON Schema builder.

use crate::error::AssistantError;
use crate::openai::api::FunctionSchema;
use color_eyre::Result;
use serde_json::{Map, Value, json};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

/// ランタイムで実行するツール関数の型。
/// 引数(JSON)を受け取り、アシスタントへ返すテキストを返す。
pub type ToolHandler = Arc<dyn Fn(&Value) -> Result<String> + Send + Sync + 'static>;

/// The fixed set of tools the assistant may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    IssueFromDdg,
    IssueFromWikipedia,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::IssueFromDdg, ToolKind::IssueFromWikipedia];

    /// Name advertised to the assistant and used in tool calls.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::IssueFromDdg => "get_issue_from_ddg",
            ToolKind::IssueFromWikipedia => "get_issue_from_wikipedia",
        }
    }
}

impl Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AssistantError::UnknownTool(s.to_string()))
    }
}

/// JSON Schema for a tool's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameters(Value);

impl ToolParameters {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Builder for `{"type": "object", ...}` parameter schemas.
#[derive(Debug, Default)]
pub struct ToolParametersBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolParametersBuilder {
    pub fn new_object() -> Self {
        Self::default()
    }

    pub fn add_string(mut self, name: &str, description: Option<&str>) -> Self {
        let mut prop = json!({ "type": "string" });
        if let Some(d) = description {
            prop["description"] = json!(d);
        }
        self.properties.insert(name.to_string(), prop);
        self
    }

    pub fn required(mut self, name: &str) -> Self {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn build(self) -> ToolParameters {
        ToolParameters(json!({
            "type": "object",
            "properties": Value::Object(self.properties),
            "required": self.required,
        }))
    }
}

/// アシスタントに公開するメタデータと実行ハンドラをまとめた定義。
#[derive(Clone)]
pub struct ToolDefinition {
    pub kind: ToolKind,
    pub description: &'static str,
    pub parameters: ToolParameters,
    handler: ToolHandler,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl ToolDefinition {
    pub fn new(
        kind: ToolKind,
        description: &'static str,
        parameters: ToolParameters,
        handler: ToolHandler,
    ) -> Self {
        Self { kind, description, parameters, handler }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Schema entry advertised to the assistant.
    pub fn schema(&self) -> FunctionSchema {
        FunctionSchema {
            name: self.name().to_string(),
            description: self.description.to_string(),
            parameters: self.parameters.as_value().clone(),
        }
    }

    /// ツールを実行
    pub fn execute(&self, args: &Value) -> Result<String> {
        (self.handler)(args)
    }
}

/// Extracts the `issue` string from a tool's argument object.
pub fn issue_argument<'a>(tool: ToolKind, args: &'a Value) -> std::result::Result<&'a str, AssistantError> {
    match args.get("issue").and_then(|v| v.as_str()) {
        Some(issue) if !issue.trim().is_empty() => Ok(issue),
        Some(_) => Err(AssistantError::InvalidArguments {
            tool: tool.name().to_string(),
            reason: "issue is empty".to_string(),
        }),
        None => Err(AssistantError::InvalidArguments {
            tool: tool.name().to_string(),
            reason: "issue must be a string".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_kind_round_trips_through_name() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.name().parse::<ToolKind>(), Ok(kind));
        }
        assert_eq!(
            "get_issue_from_bing".parse::<ToolKind>(),
            Err(AssistantError::UnknownTool("get_issue_from_bing".into()))
        );
    }

    #[test]
    fn builder_produces_object_schema() {
        let params = ToolParametersBuilder::new_object()
            .add_string("issue", Some("The name of the issue"))
            .required("issue")
            .required("issue")
            .build();
        let v = params.as_value();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["issue"]["type"], "string");
        assert_eq!(v["properties"]["issue"]["description"], "The name of the issue");
        assert_eq!(v["required"], json!(["issue"]));
        assert!(v.get("additionalProperties").is_none());
    }

    #[test]
    fn issue_argument_rejects_missing_and_empty() {
        let kind = ToolKind::IssueFromDdg;
        assert_eq!(issue_argument(kind, &json!({"issue": "Tesla"})), Ok("Tesla"));
        assert!(matches!(
            issue_argument(kind, &json!({"topic": "Tesla"})),
            Err(AssistantError::InvalidArguments { .. })
        ));
        assert!(matches!(
            issue_argument(kind, &json!({"issue": "  "})),
            Err(AssistantError::InvalidArguments { .. })
        ));
        assert!(matches!(
            issue_argument(kind, &json!({"issue": 5})),
            Err(AssistantError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn tool_definition_executes_closure() -> Result<()> {
        let tool = ToolDefinition::new(
            ToolKind::IssueFromDdg,
            "echo",
            ToolParametersBuilder::new_object().build(),
            Arc::new(|v| Ok(format!("got {}", v["issue"]))),
        );
        assert_eq!(tool.execute(&json!({"issue": "x"}))?, "got \"x\"");
        assert_eq!(tool.schema().name, "get_issue_from_ddg");
        Ok(())
    }
}
