pub mod client;
pub mod registry;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::{McpTool, McpToolCall, McpToolResult};

pub use client::McpClient;
pub use registry::ToolRegistry;

/// The live connection to a tool provider.
///
/// One session exists per running chatbot; the registry snapshots
/// `list_tools` once at startup and the orchestrator routes every
/// model-requested call through `call_tool`. Mocked in tests so the
/// loop can run without a child process.
#[async_trait]
pub trait ToolSession: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<McpTool>>;
    async fn call_tool(&self, call: &McpToolCall) -> Result<McpToolResult>;
}
