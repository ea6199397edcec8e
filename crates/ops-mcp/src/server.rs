//! MCP server handler
//!
//! rmcp の ServerHandler を ToolManager の上に実装します。

use std::sync::Arc;

use rmcp::{
    ErrorData, RoleServer, ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
        ToolAnnotations,
    },
    service::RequestContext,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use ops_core::{Error, ToolDefinition, ToolManager};

const SERVER_NAME: &str = "ops-bridge";

/// MCP server over a shared tool catalog
#[derive(Clone)]
pub struct OpsServer {
    tools: Arc<ToolManager>,
    instructions: String,
}

impl OpsServer {
    pub fn new(tools: Arc<ToolManager>, instructions: impl Into<String>) -> Self {
        Self {
            tools,
            instructions: instructions.into(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Catalog entries converted to MCP tool descriptors
    pub fn tool_list(&self) -> Vec<Tool> {
        self.tools.definitions().into_iter().map(to_mcp_tool).collect()
    }

    /// Run one tool call
    ///
    /// Unknown names are a protocol error; everything else, failures
    /// included, comes back as a tool result.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let input = arguments.map(JsonValue::Object).unwrap_or(JsonValue::Null);
        debug!(tool = %name, "Calling tool");

        match self.tools.execute(name, input).await {
            Ok(result) if result.is_error => {
                warn!(tool = %name, "Tool returned an error");
                Ok(CallToolResult::error(vec![Content::text(result.output)]))
            }
            Ok(result) => {
                info!(tool = %name, "Tool completed");
                Ok(CallToolResult::success(vec![Content::text(result.output)]))
            }
            Err(Error::UnknownTool(name)) => Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            )),
            Err(e) => Err(ErrorData::internal_error(e.to_string(), None)),
        }
    }
}

fn to_mcp_tool(def: ToolDefinition) -> Tool {
    let schema = match def.input_schema {
        JsonValue::Object(map) => map,
        _ => JsonObject::new(),
    };
    let mut tool = Tool::new(def.name, def.description, Arc::new(schema));
    let mut annotations = ToolAnnotations::default();
    annotations.read_only_hint = Some(!def.mutating);
    tool.annotations = Some(annotations);
    tool
}

impl ServerHandler for OpsServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = Implementation::default();
        implementation.name = SERVER_NAME.to_string();
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = implementation;
        info.instructions = Some(self.instructions.clone());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.dispatch(&request.name, request.arguments).await
    }
}
