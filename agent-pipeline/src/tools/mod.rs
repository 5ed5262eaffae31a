mod find_case;
mod find_toxic;
mod simulate_dispute;
mod web_search;

pub use find_case::FindCaseTool;
pub use find_toxic::FindToxicClausesTool;
pub use simulate_dispute::SimulateDisputeTool;
pub use web_search::WebSearchTool;

use std::path::PathBuf;
use std::sync::Arc;

use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info};

use common::error::AppError;

/// Request-scoped data injected into tool invocations. The session's
/// contract file is injected for file-requiring tools regardless of what the
/// router placed in the arguments.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub file_path: Option<PathBuf>,
}

#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments, for the router's tool
    /// declarations.
    fn parameters(&self) -> Value;

    fn requires_file(&self) -> bool {
        false
    }

    async fn invoke(&self, args: &Value, ctx: &ToolContext) -> Result<Value, AppError>;
}

/// Declares the tool set to the router and dispatches calls by name.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn AgentTool>>) -> Self {
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name().to_string(),
                    description: Some(tool.description().to_string()),
                    parameters: Some(tool.parameters()),
                    strict: None,
                },
            })
            .collect()
    }

    /// One line per tool for the selection prompt, with the file note the
    /// router is told about.
    pub fn descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|tool| {
                let file_note = if tool.requires_file() {
                    " (참고: 이 도구는 업로드된 계약서 파일이 필요합니다)"
                } else {
                    ""
                };
                format!("- {}: {}{}", tool.name(), tool.description(), file_note)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Dispatches one tool call. Unknown names are logged and skipped
    /// (`None`); failures are downgraded to the tool-specific stub so the
    /// trail always carries a tool message.
    pub async fn dispatch(&self, name: &str, args: &Value, ctx: &ToolContext) -> Option<String> {
        let tool = self.tools.iter().find(|tool| tool.name() == name);

        let Some(tool) = tool else {
            error!(tool = %name, "tool not found");
            return None;
        };

        if tool.requires_file() && ctx.file_path.is_none() {
            return Some(failure_stub(
                name,
                &AppError::Validation(
                    "계약서 파일이 제공되지 않았습니다. 파일을 업로드하세요.".into(),
                ),
            ));
        }

        info!(tool = %name, "executing tool");
        match tool.invoke(args, ctx).await {
            Ok(result) => Some(result.to_string()),
            Err(err) => {
                error!(tool = %name, error = %err, "tool execution failed");
                Some(failure_stub(name, &err))
            }
        }
    }
}

/// The degraded output recorded when a tool fails.
pub fn failure_stub(tool_name: &str, err: &AppError) -> String {
    match tool_name {
        "simulate_dispute_tool" => json!({
            "simulations": [
                format!("계약서 분석 중 오류가 발생했습니다: {err}"),
                "파일이 올바르게 업로드되었는지 확인하시고, 다시 시도해 주세요."
            ]
        })
        .to_string(),
        "find_toxic_clauses_tool" => {
            json!([{ "error": format!("독소조항 분석 중 오류가 발생했습니다: {err}") }]).to_string()
        }
        _ => format!("Error: {err}"),
    }
}

/// Pulls the `query` argument the router passed, with a tool-specific
/// default when it was omitted.
pub(crate) fn query_argument(args: &Value, fallback: &str) -> String {
    args.get("query")
        .and_then(Value::as_str)
        .filter(|query| !query.is_empty())
        .map_or_else(|| fallback.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl AgentTool for EchoTool {
        fn name(&self) -> &'static str {
            "echo_tool"
        }

        fn description(&self) -> &str {
            "echoes the query"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"query": {"type": "string"}}})
        }

        async fn invoke(&self, args: &Value, _ctx: &ToolContext) -> Result<Value, AppError> {
            Ok(json!({"echo": query_argument(args, "default")}))
        }
    }

    struct NeedsFileTool;

    #[async_trait]
    impl AgentTool for NeedsFileTool {
        fn name(&self) -> &'static str {
            "simulate_dispute_tool"
        }

        fn description(&self) -> &str {
            "needs a file"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        fn requires_file(&self) -> bool {
            true
        }

        async fn invoke(&self, _args: &Value, ctx: &ToolContext) -> Result<Value, AppError> {
            assert!(ctx.file_path.is_some());
            Ok(json!({"simulations": ["상황: ok\n사용자: u\n상담원: a"]}))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(vec![Arc::new(EchoTool), Arc::new(NeedsFileTool)])
    }

    #[tokio::test]
    async fn dispatch_runs_the_named_tool() {
        let output = registry()
            .dispatch("echo_tool", &json!({"query": "판례"}), &ToolContext::default())
            .await
            .expect("output");
        assert_eq!(output, json!({"echo": "판례"}).to_string());
    }

    #[tokio::test]
    async fn unknown_tool_is_skipped() {
        let output = registry()
            .dispatch("missing_tool", &json!({}), &ToolContext::default())
            .await;
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn file_requiring_tool_without_file_gets_the_stub() {
        let output = registry()
            .dispatch("simulate_dispute_tool", &json!({}), &ToolContext::default())
            .await
            .expect("stub output");
        let parsed: Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed["simulations"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn file_requiring_tool_receives_the_injected_path() {
        let ctx = ToolContext {
            file_path: Some(PathBuf::from("/tmp/contract.pdf")),
        };
        let output = registry()
            .dispatch("simulate_dispute_tool", &json!({}), &ctx)
            .await
            .expect("output");
        assert!(output.contains("simulations"));
    }

    #[test]
    fn definitions_cover_every_tool() {
        let defs = registry().definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].function.name, "echo_tool");
    }

    #[test]
    fn descriptions_flag_file_requiring_tools() {
        let text = registry().descriptions();
        assert!(text.contains("echo_tool"));
        assert!(text.contains("계약서 파일이 필요합니다"));
    }

    #[test]
    fn plain_tools_fail_with_error_string() {
        let stub = failure_stub("web_search_tool", &AppError::Validation("없음".into()));
        assert!(stub.starts_with("Error:"));
    }
}
