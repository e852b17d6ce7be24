//! MCP tool server: newline-delimited JSON-RPC 2.0 over a byte stream.
//!
//! Supported methods: `initialize`, `ping`, `tools/list`, `tools/call`.
//! Notifications (requests without an `id`) are accepted and never answered.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use qbridge_core::{DEFAULT_SHOTS, Dispatcher, FunctionCall, Operation};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "qbridge";
pub const INSTRUCTIONS: &str =
    "A quantum computing API that allows you to create and execute quantum circuits.";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

/// Tool server over any line-oriented transport.
#[derive(Debug, Clone)]
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve requests until `reader` reaches end of file.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server ready");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }
        info!("MCP input closed");
        Ok(())
    }

    /// Handle one line. Returns the response to write, if any.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("unparsable MCP message: {e}");
                return Some(error_response(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };
        let id_hint = value.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(error_response(
                    id_hint,
                    RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
                ));
            }
        };

        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        debug!(method = %request.method, "request");
        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tool_definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => error_response(id, error),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
            "instructions": INSTRUCTIONS,
        })
    }

    /// The four tools with their input schemas.
    pub fn tool_definitions(&self) -> Vec<Value> {
        Operation::ALL
            .into_iter()
            .map(|op| {
                json!({
                    "name": op.tool_name(),
                    "description": op.description(),
                    "inputSchema": self.input_schema(op),
                })
            })
            .collect()
    }

    fn input_schema(&self, op: Operation) -> Value {
        match op {
            Operation::ListBackends | Operation::CreateBellCircuit => {
                json!({ "type": "object", "properties": {} })
            }
            Operation::CreateCustomCircuit => json!({
                "type": "object",
                "properties": {
                    "instructions": {
                        "type": "string",
                        "description": "OpenQASM 2.0 source; the header may be omitted",
                    },
                },
                "required": ["instructions"],
            }),
            Operation::ExecuteCircuit => json!({
                "type": "object",
                "properties": {
                    "qasm_code": { "type": "string" },
                    "shots": { "type": "integer", "default": DEFAULT_SHOTS, "minimum": 1 },
                    "backend": { "type": "string", "default": self.dispatcher.default_backend() },
                },
                "required": ["qasm_code"],
            }),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let call: ToolCall = serde_json::from_value(params)
            .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))?;

        if !Operation::ALL.iter().any(|op| op.tool_name() == call.name) {
            return Err(RpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {}", call.name),
            ));
        }

        let call = FunctionCall::new(call.name, call.arguments.unwrap_or_default());
        Ok(match self.dispatcher.dispatch(&call).await {
            Ok(response) => match serde_json::to_string_pretty(&response) {
                Ok(text) => tool_result(text, false),
                Err(e) => tool_result(format!("Error encoding result: {e}"), true),
            },
            Err(e) => tool_result(e.to_string(), true),
        })
    }
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": error })
}

/// Serve on the process's stdin and stdout.
pub async fn serve_stdio(server: &McpServer) -> std::io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout()).await
}
