//! ops-mcp: MCP (Model Context Protocol) server
//!
//! ToolManager に登録されたツールを MCP の tools/list と tools/call として公開します。

pub mod instructions;
pub mod server;
pub mod transport;

pub use instructions::server_instructions;
pub use server::OpsServer;
pub use transport::{MCP_PATH, http_router, serve_http, serve_stdio};
