use serde_json::Value;

/// One tool invocation requested by the router model.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The orchestrator's message trail. Tool outputs are kept as the JSON text
/// the tool produced; the response extractor walks this trail newest first.
#[derive(Debug, Clone)]
pub enum AgentMessage {
    Assistant {
        content: String,
        tool_calls: Vec<ToolCallRecord>,
    },
    Tool {
        name: String,
        content: String,
    },
}

impl AgentMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            name: name.into(),
            content: content.into(),
        }
    }
}
