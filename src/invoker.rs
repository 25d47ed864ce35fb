use serde_json::Value;

use crate::error::Result;
use crate::mcp::types::McpToolCall;
use crate::mcp::ToolSession;

/// Dispatch one tool call through the session and flatten the result
/// into the single text payload the model sees. Dispatch errors are
/// propagated; the orchestrator decides how to fold them into the
/// conversation.
pub async fn invoke_tool(session: &dyn ToolSession, call: &McpToolCall) -> Result<String> {
    let result = session.call_tool(call).await?;
    Ok(normalize_content(&result.content))
}

/// Flattening policy for provider results. A content-item array
/// concatenates the `text` of every item that has one, in order, with
/// no separator; textless items are skipped. A bare string is passed
/// through. Anything else gets its JSON rendering.
pub fn normalize_content(content: &Value) -> String {
    match content {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_content;
    use serde_json::json;

    #[test]
    fn test_normalize_concatenates_text_items_in_order() {
        let content = json!([
            {"type": "text", "text": "first"},
            {"type": "text", "text": "second"},
            {"type": "text", "text": "third"}
        ]);
        assert_eq!(normalize_content(&content), "firstsecondthird");
    }

    #[test]
    fn test_normalize_skips_textless_items() {
        let content = json!([
            {"type": "text", "text": "a"},
            {"type": "image", "data": "base64..."},
            {"type": "text", "text": "b"}
        ]);
        assert_eq!(normalize_content(&content), "ab");
    }

    #[test]
    fn test_normalize_plain_string_passes_through() {
        let content = json!("already text");
        assert_eq!(normalize_content(&content), "already text");
    }

    #[test]
    fn test_normalize_scalar_coerced_to_text() {
        assert_eq!(normalize_content(&json!(42)), "42");
        assert_eq!(normalize_content(&json!({"ok": true})), "{\"ok\":true}");
    }

    #[test]
    fn test_normalize_empty_array() {
        assert_eq!(normalize_content(&json!([])), "");
    }
}
