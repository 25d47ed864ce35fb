use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::Message;

/// One chat completion call against the model backend.
///
/// Returns the raw response body; `api::response` accessors pull out
/// content and tool calls. Scripted in tests so the orchestrator can be
/// exercised without a network.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<Value>;
}
