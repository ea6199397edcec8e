//! ops-core: shared contract layer for ops-bridge
//!
//! エラー分類、HTTP の共通処理、ツール契約、設定読み込みを提供します。
//! The three platform crates build on these pieces; the MCP crate exposes
//! the resulting [`ToolManager`].

pub mod config;
pub mod error;
pub mod http;
pub mod tool;

pub use config::{Config, GitHubConfig, SlackConfig, ZentaoConfig};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use tool::{SchemaBuilder, Tool, ToolDefinition, ToolManager, ToolResult};
