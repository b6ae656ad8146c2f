//! rmcp handler exposing the tool executor

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
    InitializeResult, JsonObject, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;

use crate::error::{Error, ToolError};
use crate::tools::{ToolCall, ToolDefinition, ToolExecutor};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "School Tools";

/// Answered when the client asks for a version we do not know
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Versions echoed back to the client; none of them use JSON-RPC batches
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 2] = ["2024-11-05", "2025-06-18"];

/// Serves the tools of an executor
///
/// Cheap to clone; every connection gets its own copy.
#[derive(Clone)]
pub struct SchoolServer {
    executor: Arc<ToolExecutor>,
}

impl SchoolServer {
    pub fn new(executor: ToolExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.executor.list_tools().len()
    }
}

/// Echo a supported version, otherwise fall back to the default
fn negotiate(requested: &ProtocolVersion) -> ProtocolVersion {
    let requested = serde_json::to_value(requested).ok();
    let version = match requested.as_ref().and_then(Value::as_str) {
        Some(version) if SUPPORTED_PROTOCOL_VERSIONS.contains(&version) => version,
        Some(version) => {
            tracing::info!(
                "Client asked for protocol {}, answering {}",
                version,
                DEFAULT_PROTOCOL_VERSION
            );
            DEFAULT_PROTOCOL_VERSION
        }
        None => DEFAULT_PROTOCOL_VERSION,
    };
    serde_json::from_value(Value::String(version.to_string()))
        .unwrap_or(ProtocolVersion::V_2024_11_05)
}

fn to_mcp_tool(definition: ToolDefinition) -> McpTool {
    let schema: JsonObject = match definition.input_schema {
        Value::Object(schema) => schema,
        _ => serde_json::Map::new(),
    };
    McpTool::new(definition.name, definition.description, Arc::new(schema))
}

impl ServerHandler for SchoolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        let mut info = self.get_info();
        info.protocol_version = negotiate(&request.protocol_version);
        Ok(info)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self
            .executor
            .get_tool_definitions()
            .into_iter()
            .map(to_mcp_tool)
            .collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = Value::Object(request.arguments.unwrap_or_default());

        match self.executor.execute(ToolCall::new(request.name, arguments)).await {
            Ok(result) if result.success => {
                Ok(CallToolResult::success(vec![Content::text(result.content)]))
            }
            Ok(result) => Ok(CallToolResult::error(vec![Content::text(result.content)])),
            Err(Error::Tool(ToolError::NotFound { name })) => Err(McpError::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            )),
            Err(e) => Err(McpError::internal_error(e.to_string(), None)),
        }
    }
}
