use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use colored::*;
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use super::types::{InitializeResult, McpTool, McpToolCall, McpToolResult, ServerInfo, ToolListResponse};
use super::ToolSession;
use crate::error::{PaperChatError, Result};

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const CLIENT_NAME: &str = "paperchat";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stdio JSON-RPC client for a single MCP tool server.
///
/// The server process is owned for the life of the session: spawned and
/// initialized in `connect`, torn down in `shutdown`. Wire access is
/// serialized through a mutex so overlapping callers cannot interleave
/// request/response frames. The tool list is a one-shot snapshot taken
/// during `connect` and never mutated afterwards.
pub struct McpClient {
    server: Mutex<ServerProcess>,
    tools: Vec<McpTool>,
    server_info: ServerInfo,
    tool_timeout: u64,
    verbose: bool,
}

struct ServerProcess {
    child: Child,
    channel: RpcChannel<ChildStdout, ChildStdin>,
}

/// Line-delimited JSON-RPC framing over any byte channel.
///
/// A request future can be dropped at any await point (cancellation,
/// timeouts). Dropping during the read side is harmless: responses are
/// matched by id, so a stale answer is skipped by the next request.
/// Dropping mid-write leaves a partial frame on the wire, after which
/// no request can be framed correctly; `wire_ok` tracks that window and
/// fails fast instead of garbling the next call.
struct RpcChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    next_id: u64,
    wire_ok: bool,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> RpcChannel<R, W> {
    fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            next_id: 1,
            wire_ok: true,
        }
    }

    async fn write_frame(&mut self, frame: &Value) -> Result<()> {
        if !self.wire_ok {
            return Err(PaperChatError::SessionError(
                "tool server connection desynchronized by an interrupted request".to_string(),
            ));
        }
        let mut frame_str = serde_json::to_string(frame)?;
        frame_str.push('\n');
        self.wire_ok = false;
        self.writer.write_all(frame_str.as_bytes()).await?;
        self.writer.flush().await?;
        self.wire_ok = true;
        Ok(())
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params.unwrap_or(json!({}))
        });
        self.write_frame(&request).await?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                return Err(PaperChatError::SessionError(
                    "tool server closed the connection".to_string(),
                ));
            }
            if line.trim().is_empty() {
                continue;
            }

            let response: Value = serde_json::from_str(&line)?;
            if response.get("id") == Some(&json!(id)) {
                if let Some(result) = response.get("result") {
                    return Ok(result.clone());
                } else if let Some(error) = response.get("error") {
                    return Err(PaperChatError::SessionError(format!("MCP error: {}", error)));
                }
            }
            // Notifications and responses to other ids are skipped.
        }
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params.unwrap_or(json!({}))
        });
        self.write_frame(&notification).await
    }
}

impl McpClient {
    /// Spawn the tool server, run the initialize handshake, and take a
    /// one-time snapshot of its tool list.
    pub async fn connect(
        command: &str,
        args: &[String],
        env_vars: HashMap<String, String>,
        tool_timeout: u64,
        verbose: bool,
    ) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Env var values are never logged, even in verbose mode.
        for (key, value) in env_vars {
            if verbose {
                eprintln!("{}", format!("[mcp] Setting env var: {} (value hidden)", key).dimmed());
            }
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            PaperChatError::SessionError(format!("failed to start tool server '{}': {}", command, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PaperChatError::SessionError("tool server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PaperChatError::SessionError("tool server stdout unavailable".to_string()))?;

        let mut server = ServerProcess {
            child,
            channel: RpcChannel::new(stdout, stdin),
        };

        let init_params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": CLIENT_VERSION
            }
        });

        let response = server.channel.request("initialize", Some(init_params)).await?;
        let init_result: InitializeResult = serde_json::from_value(response)?;

        if verbose {
            eprintln!(
                "{}",
                format!(
                    "[mcp] Connected to server: {} v{}",
                    init_result.server_info.name, init_result.server_info.version
                )
                .dimmed()
            );
        }

        server.channel.notify("notifications/initialized", None).await?;

        let response = server.channel.request("tools/list", None).await?;
        let tool_list: ToolListResponse = serde_json::from_value(response)?;

        if verbose {
            for tool in &tool_list.tools {
                eprintln!(
                    "{}",
                    format!(
                        "[mcp]   Tool: {} - {}",
                        tool.name,
                        tool.description.as_deref().unwrap_or("")
                    )
                    .dimmed()
                );
            }
        }

        Ok(Self {
            server: Mutex::new(server),
            tools: tool_list.tools,
            server_info: init_result.server_info,
            tool_timeout,
            verbose,
        })
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn get_tool(&self, name: &str) -> Option<&McpTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    fn validate_arguments(tool: &McpTool, arguments: &Value) -> std::result::Result<(), String> {
        let schema = match JSONSchema::compile(&tool.input_schema) {
            Ok(s) => s,
            Err(e) => return Err(format!("Invalid tool schema: {}", e)),
        };

        if let Err(errors) = schema.validate(arguments) {
            let error_messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(error_messages.join("; "));
        }

        Ok(())
    }

    async fn call_tool_internal(&self, call: &McpToolCall) -> Result<McpToolResult> {
        let params = json!({
            "name": call.name,
            "arguments": call.arguments,
        });

        let mut server = self.server.lock().await;
        let response = server.channel.request("tools/call", Some(params)).await?;
        let result: McpToolResult = serde_json::from_value(response)?;
        Ok(result)
    }

    /// Best-effort teardown: politely ask the server to stop, then kill
    /// the child. Safe to call on any exit path.
    pub async fn shutdown(&self) {
        let mut server = self.server.lock().await;
        let _ = timeout(
            Duration::from_secs(2),
            server.channel.request("shutdown", None),
        )
        .await;
        let _ = server.child.kill().await;
        if self.verbose {
            eprintln!("{}", "[mcp] Tool server stopped".dimmed());
        }
    }
}

#[async_trait]
impl ToolSession for McpClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, call: &McpToolCall) -> Result<McpToolResult> {
        // Unknown tools are rejected before any wire traffic.
        let tool = self.get_tool(&call.name).ok_or_else(|| {
            PaperChatError::ToolError(format!("Tool '{}' not found", call.name))
        })?;

        if let Err(validation_errors) = Self::validate_arguments(tool, &call.arguments) {
            return Err(PaperChatError::ToolError(format!(
                "Tool '{}' argument validation failed: {}",
                call.name, validation_errors
            )));
        }

        match timeout(
            Duration::from_secs(self.tool_timeout),
            self.call_tool_internal(call),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PaperChatError::ToolError(format!(
                "Tool '{}' execution timed out after {} seconds",
                call.name, self.tool_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RpcChannel;
    use crate::error::PaperChatError;
    use serde_json::json;
    use tokio::io::{split, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_request_matches_response_by_id() {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = split(client_io);
        let (mut server_read, mut server_write) = split(server_io);

        let mut channel = RpcChannel::new(client_read, client_write);

        let server = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = server_read.read(&mut buf).await.unwrap();
            let request: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(request.get("method").and_then(|m| m.as_str()), Some("tools/list"));
            let id = request.get("id").cloned().unwrap();
            // A stale answer for some other id arrives first and must
            // be skipped.
            let stale = json!({"jsonrpc": "2.0", "id": 999, "result": {"tools": []}});
            let reply = json!({"jsonrpc": "2.0", "id": id, "result": {"tools": [{"name": "t", "inputSchema": {}}]}});
            server_write
                .write_all(format!("{}\n{}\n", stale, reply).as_bytes())
                .await
                .unwrap();
        });

        let result = channel.request("tools/list", None).await.unwrap();
        let tools = result.get("tools").and_then(|t| t.as_array()).unwrap();
        assert_eq!(tools.len(), 1);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_response_surfaces_as_session_error() {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = split(client_io);
        let (mut server_read, mut server_write) = split(server_io);

        let mut channel = RpcChannel::new(client_read, client_write);

        let server = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = server_read.read(&mut buf).await.unwrap();
            let request: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
            let id = request.get("id").cloned().unwrap();
            let reply = json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "no such method"}});
            server_write
                .write_all(format!("{}\n", reply).as_bytes())
                .await
                .unwrap();
        });

        let result = channel.request("nope", None).await;
        assert!(matches!(result, Err(PaperChatError::SessionError(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_interrupted_write_poisons_the_channel() {
        // A tiny pipe that nobody drains: the frame write blocks, the
        // request future is dropped mid-write, and the channel must
        // refuse further traffic instead of framing onto the partial
        // leftovers.
        let (client_io, _server_io) = tokio::io::duplex(16);
        let (client_read, client_write) = split(client_io);
        let mut channel = RpcChannel::new(client_read, client_write);

        let big = json!({"payload": "x".repeat(4096)});
        let interrupted = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            channel.request("tools/call", Some(big)),
        )
        .await;
        assert!(interrupted.is_err());

        let result = channel.request("tools/list", None).await;
        match result {
            Err(PaperChatError::SessionError(msg)) => {
                assert!(msg.contains("desynchronized"));
            }
            other => panic!("expected session error, got {:?}", other.map(|_| ())),
        }
    }
}
