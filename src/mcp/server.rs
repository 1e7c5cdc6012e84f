//! MCP request dispatch

use std::io::{BufRead, Write};
use std::time::Instant;

use serde_json::{json, Map, Value};

use super::protocol::{
    CallToolParams, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use super::transport::{McpError, StdioTransport};
use crate::input::InputError;
use crate::tools::{Registry, ToolContext, ToolError};

pub struct McpServer {
    registry: Registry,
    ctx: ToolContext,
    name: String,
    initialized: bool,
}

impl McpServer {
    pub fn new(registry: Registry, ctx: ToolContext, name: impl Into<String>) -> Self {
        Self {
            registry,
            ctx,
            name: name.into(),
            initialized: false,
        }
    }

    /// Whether the client has sent `notifications/initialized`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serve requests until the input closes
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        transport: &mut StdioTransport<R, W>,
    ) -> Result<(), McpError> {
        tracing::info!(name = %self.name, protocol = MCP_PROTOCOL_VERSION, "MCP server listening on stdio");
        loop {
            let response = match transport.read_message() {
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => break,
                Err(McpError::InvalidUtf8(e)) => {
                    tracing::warn!(error = %e, "undecodable message");
                    Some(JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::parse_error(e),
                    ))
                }
                Err(e) => return Err(e),
            };
            if let Some(response) = response {
                transport.write_message(&response)?;
            }
        }
        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one raw line; `None` when no response is due
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable message");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(e),
                ));
            }
        };

        let Value::Object(obj) = &value else {
            tracing::warn!("message is not a JSON object");
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("expected a single JSON object"),
            ));
        };

        // replies to server-initiated requests; this server never sends any
        if !obj.contains_key("method")
            && (obj.contains_key("result") || obj.contains_key("error"))
        {
            tracing::debug!("ignoring client response message");
            return None;
        }

        let id = obj.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) if request.jsonrpc == JSONRPC_VERSION => self.handle(request),
            Ok(request) => {
                tracing::warn!(version = %request.jsonrpc, "unsupported jsonrpc version");
                Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!(
                        "jsonrpc must be \"{}\"",
                        JSONRPC_VERSION
                    )),
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed request");
                Some(JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e)))
            }
        }
    }

    /// Dispatch a decoded request
    pub fn handle(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.notification(&request.method);
            return None;
        };
        tracing::info!(method = %request.method, id = %id, "request");

        let started = Instant::now();
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(&request.params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(&request.params),
            other => Err(JsonRpcError::method_not_found(other)),
        };
        tracing::debug!(
            method = %request.method,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "request handled"
        );

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::warn!(method = %request.method, code = error.code, message = %error.message, "request failed");
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    fn notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                self.initialized = true;
                tracing::info!("client initialized");
            }
            other => tracing::debug!(method = other, "notification ignored"),
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        if let Some(requested) = params.get("protocolVersion").and_then(Value::as_str) {
            if requested != MCP_PROTOCOL_VERSION {
                tracing::info!(requested, offered = MCP_PROTOCOL_VERSION, "protocol version differs");
            }
        }
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": self.name,
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self.registry.tools().iter().map(|t| t.descriptor()).collect();
        json!({ "tools": tools })
    }

    fn call_tool(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams =
            serde_json::from_value(params.clone()).map_err(JsonRpcError::invalid_params)?;
        let empty = Map::new();
        let args = match &params.arguments {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(JsonRpcError::invalid_params("arguments must be an object")),
        };

        let started = Instant::now();
        let output = self
            .registry
            .call(&params.name, args, &self.ctx)
            .map_err(rpc_error)?;
        tracing::debug!(
            tool = %params.name,
            args = args.len(),
            is_error = output.is_error,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "tool call"
        );

        serde_json::to_value(CallToolResult::text(output.text, output.is_error))
            .map_err(JsonRpcError::internal)
    }
}

fn rpc_error(err: ToolError) -> JsonRpcError {
    match err {
        ToolError::UnknownTool(name) => JsonRpcError::new(
            super::protocol::error_codes::METHOD_NOT_FOUND,
            format!("Unknown tool: {}", name),
        ),
        ToolError::Input(InputError::InvalidArguments { field, reason }) => {
            JsonRpcError::invalid_params(format!("{}: {}", field, reason))
        }
        other => JsonRpcError::internal(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::io::Cursor;

    fn server() -> McpServer {
        let ctx = ToolContext::new(Catalog::embedded().unwrap(), false);
        McpServer::new(Registry::new().unwrap(), ctx, "Test Fab")
    }

    fn send(server: &mut McpServer, message: Value) -> Option<JsonRpcResponse> {
        server.handle_line(&message.to_string())
    }

    #[test]
    fn test_initialize_handshake() {
        let mut s = server();
        let resp = send(
            &mut s,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                   "params": {"protocolVersion": "2024-11-05", "capabilities": {}}}),
        )
        .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "Test Fab");
        assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));

        assert!(!s.is_initialized());
        let none = send(
            &mut s,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        );
        assert!(none.is_none());
        assert!(s.is_initialized());
    }

    #[test]
    fn test_ping_and_unknown_method() {
        let mut s = server();
        let pong = send(&mut s, json!({"jsonrpc": "2.0", "id": "a", "method": "ping"})).unwrap();
        assert_eq!(pong.result, Some(json!({})));
        assert_eq!(pong.id, json!("a"));

        let err = send(&mut s, json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}))
            .unwrap()
            .error
            .unwrap();
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_tools_list() {
        let mut s = server();
        let resp = send(&mut s, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"})).unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 16);
        assert_eq!(tools[0]["name"], "analyze_spc_data");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[test]
    fn test_tools_call_success_and_input_error() {
        let mut s = server();
        let resp = send(
            &mut s,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "get_standard_recipe",
                "arguments": {"process_type": "etch", "layer": "metal"}
            }}),
        )
        .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert!(result["content"][0]["text"].as_str().unwrap().contains("Standard recipe"));

        let resp = send(
            &mut s,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {
                "name": "analyze_spc_data", "arguments": {}
            }}),
        )
        .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("Input error"));
    }

    #[test]
    fn test_tools_call_error_codes() {
        let mut s = server();
        let unknown = send(
            &mut s,
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call",
                   "params": {"name": "calibrate_laser", "arguments": {}}}),
        )
        .unwrap();
        assert_eq!(unknown.error.unwrap().code, -32601);

        let invalid = send(
            &mut s,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {
                "name": "analyze_spc_data",
                "arguments": {"data_points": "1, 2, x", "spec_limits": {"usl": 5, "lsl": 1}}
            }}),
        )
        .unwrap();
        assert_eq!(invalid.error.unwrap().code, -32602);

        let no_name = send(
            &mut s,
            json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call", "params": {}}),
        )
        .unwrap();
        assert_eq!(no_name.error.unwrap().code, -32602);
    }

    #[test]
    fn test_malformed_messages() {
        let mut s = server();
        let parse = s.handle_line("{not json").unwrap();
        assert_eq!(parse.error.unwrap().code, -32700);
        assert_eq!(parse.id, Value::Null);

        let invalid = send(&mut s, json!({"jsonrpc": "2.0", "id": 9})).unwrap();
        assert_eq!(invalid.error.unwrap().code, -32600);
        assert_eq!(invalid.id, json!(9));

        let batch = s.handle_line("[]").unwrap();
        assert_eq!(batch.error.unwrap().code, -32600);

        assert!(send(&mut s, json!({"jsonrpc": "2.0", "id": 1, "result": {}})).is_none());
    }

    #[test]
    fn test_run_over_transport() {
        crate::core::logging::init_test();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n"
        );
        let mut transport = StdioTransport::new(Cursor::new(input), Vec::new());
        server().run(&mut transport).unwrap();
        let out = String::from_utf8(transport.into_writer()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"protocolVersion\":\"2025-03-26\""));
        assert_eq!(lines[1], r#"{"jsonrpc":"2.0","id":2,"result":{}}"#);
    }

    #[test]
    fn test_run_survives_invalid_utf8() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
        input.push(b'\n');
        let mut transport = StdioTransport::new(Cursor::new(input), Vec::new());
        server().run(&mut transport).unwrap();
        let out = String::from_utf8(transport.into_writer()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], Value::Null);
        assert_eq!(first["error"]["code"], -32700);
        assert_eq!(lines[1], r#"{"jsonrpc":"2.0","id":3,"result":{}}"#);
    }
}
