use serde_json::{json, Value};

use super::types::McpTool;
use super::ToolSession;
use crate::error::Result;

/// Read-only snapshot of the tool provider's capabilities.
///
/// Discovered once at session start; the provider is not re-queried
/// mid-conversation, so the schema handed to the model is stable for
/// the life of the session.
pub struct ToolRegistry {
    tools: Vec<McpTool>,
}

impl ToolRegistry {
    pub async fn discover(session: &dyn ToolSession) -> Result<Self> {
        let tools = session.list_tools().await?;
        Ok(Self { tools })
    }

    pub fn from_tools(tools: Vec<McpTool>) -> Self {
        Self { tools }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Render the registry in the function-calling shape the chat
    /// completions API expects.
    pub fn schema(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description.as_deref().unwrap_or(""),
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect()
    }
}
