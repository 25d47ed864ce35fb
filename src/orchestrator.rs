use colored::*;
use serde_json::Value;

use crate::api::response::{extract_content, parse_tool_calls};
use crate::api::ModelBackend;
use crate::error::{PaperChatError, Result};
use crate::invoker::invoke_tool;
use crate::mcp::types::McpToolCall;
use crate::mcp::{ToolRegistry, ToolSession};
use crate::models::{FunctionCall, Message, ToolCall};
use crate::ui::{display_content, display_tool_call, display_tool_error, display_tool_result};

pub struct ChatSettings {
    pub system_prompt: Option<String>,
    pub max_rounds: u32,
    pub verbose: bool,
}

/// One tool call of a round, as it will be answered. `reject` carries
/// the pre-dispatch failure text for entries that arrived malformed.
struct RoundEntry {
    call: ToolCall,
    reject: Option<String>,
}

/// Resolve one user query: alternate between asking the model and
/// executing the tool calls it requests until a response arrives with
/// no tool calls. That response's text is the final answer.
///
/// Each query owns a fresh conversation seeded with the query itself;
/// nothing carries over between queries. Tool calls within a round run
/// sequentially in the order the model emitted them, and their result
/// messages are appended only after the whole round finishes.
pub async fn run_query(
    backend: &dyn ModelBackend,
    session: &dyn ToolSession,
    registry: &ToolRegistry,
    settings: &ChatSettings,
    query: &str,
) -> Result<String> {
    let mut messages = Vec::new();
    if let Some(prompt) = &settings.system_prompt {
        messages.push(Message::system(prompt.clone()));
    }
    messages.push(Message::user(query));

    // Empty registry degrades to a plain, tool-free completion.
    let schema = if registry.is_empty() {
        None
    } else {
        Some(registry.schema())
    };

    let mut rounds = 0u32;
    loop {
        if settings.verbose {
            eprintln!("{}", "[ai] Requesting completion...".dimmed());
        }
        let response = backend.complete(&messages, schema.as_deref()).await?;

        match parse_tool_calls(&response)? {
            Some(tool_calls) if !tool_calls.is_empty() => {
                rounds += 1;
                if rounds > settings.max_rounds {
                    return Err(PaperChatError::RoundLimit(settings.max_rounds));
                }

                let content = extract_content(&response)?;
                let round = prepare_round(&tool_calls);

                // The assistant message lists exactly the calls this
                // round answers; each tool result below correlates to
                // one of these entries by id.
                messages.push(Message::assistant(
                    content,
                    Some(round.iter().map(|entry| entry.call.clone()).collect()),
                ));

                // Staged: a failed or cancelled round leaves no partial
                // tool results in the conversation.
                let results = execute_round(session, &round, settings).await;
                messages.extend(results);
            }
            _ => {
                let content = extract_content(&response)?.unwrap_or_default();
                display_content(&content);
                messages.push(Message::assistant(Some(content.clone()), None));
                return Ok(content);
            }
        }
    }
}

/// Leniently type every raw tool-call entry of a round. Entries with
/// missing pieces are kept, with the absent fields synthesized, and
/// marked for an error answer rather than dropped: dropping one would
/// leave its tool result without a matching request in the transcript.
fn prepare_round(tool_calls: &[Value]) -> Vec<RoundEntry> {
    tool_calls
        .iter()
        .map(|raw| {
            let (id, mut reject) = match raw.get("id").and_then(|i| i.as_str()) {
                Some(id) => (id.to_string(), None),
                None => {
                    eprintln!("{}", "Warning: Tool call missing 'id' field".yellow());
                    let temp_id = format!(
                        "error_{}",
                        std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_nanos()
                    );
                    (
                        temp_id,
                        Some("Error: Tool call missing required 'id' field".to_string()),
                    )
                }
            };

            let tool_type = raw
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("function")
                .to_string();
            let function = raw.get("function");
            let name = function.and_then(|f| f.get("name")).and_then(|n| n.as_str());
            let arguments = function
                .and_then(|f| f.get("arguments"))
                .and_then(|a| a.as_str());

            if reject.is_none() && (name.is_none() || arguments.is_none()) {
                eprintln!(
                    "{}",
                    format!("Warning: Tool call {} is malformed", id).yellow()
                );
                reject = Some(
                    "Error: Tool call missing required 'function.name' or 'function.arguments' field"
                        .to_string(),
                );
            }

            RoundEntry {
                call: ToolCall {
                    id,
                    tool_type,
                    function: FunctionCall {
                        name: name.unwrap_or_default().to_string(),
                        arguments: arguments.unwrap_or_default().to_string(),
                    },
                },
                reject,
            }
        })
        .collect()
}

/// Execute every tool call of one round, in order. Nothing here aborts
/// the query: malformed entries, unknown tools, bad arguments, and
/// provider failures all become tool-result messages so the model can
/// see and react to them in the next round.
async fn execute_round(
    session: &dyn ToolSession,
    round: &[RoundEntry],
    settings: &ChatSettings,
) -> Vec<Message> {
    let mut tool_results = Vec::new();

    for entry in round {
        let id = entry.call.id.clone();

        if let Some(error_text) = &entry.reject {
            tool_results.push(Message::tool_result(id, error_text.clone()));
            continue;
        }

        let name = entry.call.function.name.as_str();
        let arguments_str = entry.call.function.arguments.as_str();

        display_tool_call(name, arguments_str);

        let arguments: Value = match serde_json::from_str(arguments_str) {
            Ok(args) => args,
            Err(err) => {
                let error_text =
                    format!("Error: failed to parse arguments for tool '{}': {}", name, err);
                display_tool_error(name, &error_text);
                tool_results.push(Message::tool_result(id, error_text));
                continue;
            }
        };

        let call = McpToolCall {
            name: name.to_string(),
            arguments,
        };

        match invoke_tool(session, &call).await {
            Ok(result_text) => {
                display_tool_result(name, &result_text);
                tool_results.push(Message::tool_result(id, result_text));
            }
            Err(e) => {
                let error_text = format!("Error: {}", e);
                display_tool_error(name, &error_text);
                tool_results.push(Message::tool_result(id, error_text));
            }
        }

        if settings.verbose {
            eprintln!(
                "{}",
                format!("[ai] Tool '{}' round entry recorded", name).dimmed()
            );
        }
    }

    tool_results
}
