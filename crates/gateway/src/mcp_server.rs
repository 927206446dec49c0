//! MCP server.
//!
//! Newline-delimited JSON-RPC 2.0 in front of the [`Gateway`]. Every
//! registered calendar tool is exposed through `tools/list` and `tools/call`;
//! agent branches are managed through the `sessions/*` methods.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use agentcal_tools::{ToolAnnotations, ToolSchema};

use crate::config::GatewayConfig;
use crate::dispatcher::{Gateway, GatewayError, ToolCall, IMPLICIT_MODEL};
use crate::session::{SessionError, ViewTarget};

/// MCP Protocol version
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC error codes.
pub mod error_codes {
    /// Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Not a request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Bad method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Server-side failure, such as a failed save
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Session already open or missing
    pub const SESSION_ERROR: i32 = -32000;
}

/// Tool definition for MCP protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Input schema for the tool
    pub input_schema: Value,
    /// Behaviour hints
    pub annotations: ToolAnnotations,
}

impl From<&ToolSchema> for McpTool {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            name: schema.name.clone(),
            description: schema.description.clone(),
            input_schema: schema.input_schema(),
            annotations: schema.annotations,
        }
    }
}

/// MCP Request message.
#[derive(Debug, Clone, PartialEq)]
pub enum McpRequest {
    /// Initialize request
    Initialize {
        /// Version the client asked for
        protocol_version: Option<String>,
    },
    /// List tools request
    ToolsList,
    /// Call tool request
    ToolsCall(ToolCall),
    /// Ping request
    Ping,
    /// Open an agent session
    SessionsCreate {
        /// Agent identifier
        agent_id: String,
        /// Model driving the agent
        model_name: String,
    },
    /// List open sessions
    SessionsList,
    /// Diff an agent's branch
    SessionsPreview(String),
    /// Merge an agent's branch into main
    SessionsMerge(String),
    /// Drop an agent's branch
    SessionsDiscard(String),
    /// Switch the view used by calls without an agent
    SessionsCheckout(ViewTarget),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentParams {
    agent_id: String,
    #[serde(default)]
    model_name: Option<String>,
}

fn decode_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, McpError> {
    serde_json::from_value(params)
        .map_err(|e| McpError::new(error_codes::INVALID_PARAMS, format!("Invalid params: {}", e)))
}

impl McpRequest {
    /// Interpret a method and its params.
    pub fn parse(method: &str, params: Value) -> Result<Self, McpError> {
        match method {
            "initialize" => Ok(McpRequest::Initialize {
                protocol_version: params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            "tools/list" => Ok(McpRequest::ToolsList),
            "tools/call" => decode_params(params).map(McpRequest::ToolsCall),
            "ping" => Ok(McpRequest::Ping),
            "sessions/create" => {
                let p: AgentParams = decode_params(params)?;
                Ok(McpRequest::SessionsCreate {
                    agent_id: p.agent_id,
                    model_name: p.model_name.unwrap_or_else(|| IMPLICIT_MODEL.to_string()),
                })
            }
            "sessions/list" => Ok(McpRequest::SessionsList),
            "sessions/preview" => {
                decode_params::<AgentParams>(params).map(|p| McpRequest::SessionsPreview(p.agent_id))
            }
            "sessions/merge" => {
                decode_params::<AgentParams>(params).map(|p| McpRequest::SessionsMerge(p.agent_id))
            }
            "sessions/discard" => {
                decode_params::<AgentParams>(params).map(|p| McpRequest::SessionsDiscard(p.agent_id))
            }
            "sessions/checkout" => decode_params(params).map(McpRequest::SessionsCheckout),
            other => Err(McpError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// MCP Response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    /// Always `2.0`
    pub jsonrpc: String,
    /// Request id, `null` when it could not be read
    pub id: Value,
    /// Result data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// MCP Error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    /// JSON-RPC error code
    pub code: i32,
    /// Message
    pub message: String,
    /// Extra data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<SessionError> for McpError {
    fn from(e: SessionError) -> Self {
        McpError::new(error_codes::SESSION_ERROR, e.to_string())
    }
}

impl From<GatewayError> for McpError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Session(e) => e.into(),
            GatewayError::Storage(e) => McpError::new(error_codes::INTERNAL_ERROR, e.to_string()),
        }
    }
}

impl McpError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// agentcal MCP server.
pub struct McpServer {
    config: GatewayConfig,
    gateway: Arc<Gateway>,
}

impl McpServer {
    /// Serve `gateway`.
    pub fn new(config: GatewayConfig, gateway: Arc<Gateway>) -> Self {
        Self { config, gateway }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Tool definitions, in registration order.
    pub fn tools(&self) -> Vec<McpTool> {
        self.gateway
            .registry()
            .schemas()
            .into_iter()
            .map(McpTool::from)
            .collect()
    }

    /// Handle one line. Notifications get no response.
    pub async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Some(McpResponse::err(
                    Value::Null,
                    McpError::new(error_codes::PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };
        let request: RawRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return Some(McpResponse::err(
                    Value::Null,
                    McpError::new(error_codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
                ));
            }
        };

        let Some(id) = request.id else {
            debug!("Notification: {}", request.method);
            return None;
        };

        let result = match McpRequest::parse(&request.method, request.params) {
            Ok(parsed) => self.handle_request(parsed).await,
            Err(e) => Err(e),
        };
        Some(match result {
            Ok(value) => McpResponse::ok(id, value),
            Err(e) => McpResponse::err(id, e),
        })
    }

    /// Handle an MCP request.
    async fn handle_request(&self, request: McpRequest) -> Result<Value, McpError> {
        let sessions = self.gateway.sessions();
        Ok(match request {
            McpRequest::Initialize { protocol_version } => {
                debug!("MCP Initialize request - version: {:?}", protocol_version);
                json!({
                    "protocolVersion": protocol_version.unwrap_or_else(|| MCP_VERSION.to_string()),
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": self.config.server_name,
                        "version": self.config.version,
                    }
                })
            }
            McpRequest::ToolsList => json!({ "tools": self.tools() }),
            McpRequest::ToolsCall(call) => {
                debug!("Tool call: {} with args: {}", call.name, call.arguments);
                let (body, is_error) = match self.gateway.call(call).await {
                    Ok(result) => (result, false),
                    Err(e) => (e.to_envelope(), true),
                };
                json!({
                    "content": [{ "type": "text", "text": body.to_string() }],
                    "structuredContent": body,
                    "isError": is_error,
                })
            }
            McpRequest::Ping => json!({}),
            McpRequest::SessionsCreate { agent_id, model_name } => {
                let session = sessions.create_session(&agent_id, &model_name).await?;
                json!({ "session": session })
            }
            McpRequest::SessionsList => {
                let open = sessions.list_active().await;
                let active = sessions.active_view().await;
                json!({
                    "sessions": open,
                    "activeView": active,
                    "recentActivity": self.gateway.has_recent_activity(),
                })
            }
            McpRequest::SessionsPreview(agent_id) => {
                let diff = sessions.preview(&agent_id).await?;
                json!({ "summary": diff.summary(), "diff": diff })
            }
            McpRequest::SessionsMerge(agent_id) => {
                let outcome = self.gateway.merge(&agent_id).await?;
                json!({ "summary": outcome.diff.summary(), "outcome": outcome })
            }
            McpRequest::SessionsDiscard(agent_id) => {
                sessions.discard(&agent_id).await?;
                json!({ "discarded": agent_id })
            }
            McpRequest::SessionsCheckout(view) => {
                sessions.checkout(view.clone()).await?;
                json!({ "activeView": view })
            }
        })
    }

    /// Serve requests from `reader` until it closes.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
        Ok(())
    }

    /// Serve over stdin/stdout.
    pub async fn start(&self) -> std::io::Result<()> {
        info!("Starting agentcal MCP Server v{} (stdio transport)", self.config.version);
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
        info!("MCP Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcal_core::User;
    use agentcal_storage::{CalendarData, SnapshotStorage};

    fn server() -> McpServer {
        let data = CalendarData::new(vec![], vec![User::new("1", "Ann")]);
        McpServer::new(GatewayConfig::default(), Arc::new(Gateway::new(data)))
    }

    async fn roundtrip(server: &McpServer, input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        server.serve(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_tools_list_exposes_every_tool() {
        let server = server();
        let responses = roundtrip(&server, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n").await;
        let tools = responses[0]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 16);
        let delete = tools.iter().find(|t| t["name"] == "calendar_delete_event").unwrap();
        assert_eq!(delete["annotations"]["destructiveHint"], true);
        assert_eq!(delete["inputSchema"]["required"], json!(["eventId"]));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();
        let input = concat!(
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"resources/list\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/call\",\"params\":{}}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"ping\"}\n",
        );
        let responses = roundtrip(&server, input).await;
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], -32601);
        assert_eq!(responses[2]["error"]["code"], -32602);
        assert_eq!(responses[3]["id"], 4);
        assert!(responses[3].get("error").is_none());
    }

    #[tokio::test]
    async fn test_tool_call_results() {
        let server = server();
        let create = json!({
            "jsonrpc": "2.0",
            "id": "a",
            "method": "tools/call",
            "params": {
                "name": "calendar_create_event",
                "agentId": "alice",
                "arguments": {
                    "title": "Sync",
                    "description": "",
                    "startDate": "2025-01-01T09:00Z",
                    "endDate": "2025-01-01T09:30Z",
                    "color": "blue",
                    "userId": "1"
                }
            }
        });
        let missing = json!({
            "jsonrpc": "2.0",
            "id": "b",
            "method": "tools/call",
            "params": { "name": "calendar_get_event", "arguments": { "eventId": 1 } }
        });
        let input = format!("{}\n{}\n", create, missing);
        let responses = roundtrip(&server, &input).await;

        assert_eq!(responses[0]["result"]["isError"], false);
        assert_eq!(responses[0]["result"]["structuredContent"]["event"]["title"], "Sync");
        assert_eq!(responses[1]["result"]["isError"], true);
        assert_eq!(responses[1]["result"]["structuredContent"]["error"]["kind"], "NotFound");
        assert_eq!(server.gateway.sessions().main_store().event_count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_over_duplex() {
        let server = server();
        let (client, server_end) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_end);
        let handle = tokio::spawn(async move {
            server.serve(BufReader::new(server_read), server_write).await.unwrap();
        });

        let (client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{\"protocolVersion\":\"2024-11-05\"}}\n")
            .await
            .unwrap();
        let mut lines = BufReader::new(client_read).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["result"]["serverInfo"]["name"], "agentcal");
        assert_eq!(response["result"]["protocolVersion"], MCP_VERSION);

        drop(client_write);
        drop(lines);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sessions_over_duplex() {
        let storage = Arc::new(agentcal_storage::MemoryStorage::new());
        let data = CalendarData::new(vec![], vec![User::new("1", "Ann")]);
        let gateway = Arc::new(Gateway::new(data).with_storage(storage.clone()));
        let server = McpServer::new(GatewayConfig::default(), gateway.clone());

        let (client, server_end) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_end);
        let handle = tokio::spawn(async move {
            server.serve(BufReader::new(server_read), server_write).await.unwrap();
        });
        let (client_read, mut client_write) = tokio::io::split(client);
        let mut lines = BufReader::new(client_read).lines();

        let requests = [
            json!({ "jsonrpc": "2.0", "id": 1, "method": "sessions/create",
                    "params": { "agentId": "alice", "modelName": "claude" } }),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                    "params": { "name": "calendar_create_event", "agentId": "alice", "arguments": {
                        "title": "Sync", "description": "", "startDate": "2025-01-01T09:00Z",
                        "endDate": "2025-01-01T09:30Z", "color": "blue", "userId": "1" } } }),
            json!({ "jsonrpc": "2.0", "id": 3, "method": "sessions/list" }),
            json!({ "jsonrpc": "2.0", "id": 4, "method": "sessions/preview", "params": { "agentId": "alice" } }),
            json!({ "jsonrpc": "2.0", "id": 5, "method": "sessions/merge", "params": { "agentId": "alice" } }),
            json!({ "jsonrpc": "2.0", "id": 6, "method": "sessions/checkout",
                    "params": { "view": "agent", "agentId": "alice" } }),
            json!({ "jsonrpc": "2.0", "id": 7, "method": "sessions/discard", "params": { "agentId": "bob" } }),
            json!({ "jsonrpc": "2.0", "id": 8, "method": "sessions/create", "params": {} }),
        ];
        let mut responses = Vec::new();
        for request in &requests {
            client_write.write_all(format!("{}\n", request).as_bytes()).await.unwrap();
            let line = lines.next_line().await.unwrap().unwrap();
            responses.push(serde_json::from_str::<Value>(&line).unwrap());
        }

        assert_eq!(responses[0]["result"]["session"]["branch"], "agent/alice");
        assert_eq!(responses[1]["result"]["isError"], false);
        assert_eq!(responses[2]["result"]["sessions"][0]["modelName"], "claude");
        assert_eq!(responses[2]["result"]["activeView"], json!({ "view": "main" }));
        assert_eq!(responses[3]["result"]["summary"], "1 added, 0 modified, 0 removed");
        assert_eq!(responses[4]["result"]["outcome"]["conflicts"], json!([]));
        assert_eq!(responses[5]["error"]["code"], error_codes::SESSION_ERROR);
        assert_eq!(responses[6]["error"]["message"], "No active session for agent bob");
        assert_eq!(responses[7]["error"]["code"], error_codes::INVALID_PARAMS);

        assert_eq!(gateway.sessions().main_store().event_count(), 1);
        assert_eq!(storage.history().await.unwrap()[0].message, "Merge agent/alice");

        drop(client_write);
        drop(lines);
        handle.await.unwrap();
    }

    #[test]
    fn test_checkout_params() {
        let main = McpRequest::parse("sessions/checkout", json!({ "view": "main" })).unwrap();
        assert_eq!(main, McpRequest::SessionsCheckout(ViewTarget::Main));
        let create = McpRequest::parse("sessions/create", json!({ "agentId": "carol" })).unwrap();
        assert_eq!(
            create,
            McpRequest::SessionsCreate {
                agent_id: "carol".to_string(),
                model_name: IMPLICIT_MODEL.to_string(),
            }
        );
    }
}
