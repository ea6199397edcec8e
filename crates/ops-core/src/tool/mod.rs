//! Tool contract shared by every platform catalog
//!
//! A tool is one named, independently invokable operation. Each platform
//! crate implements [`Tool`] for its catalog entries and registers them with
//! the [`ToolManager`], which is the dispatcher the MCP server talks to.

pub mod definition;
pub mod manager;
pub mod params;
pub mod traits;

pub use definition::{SchemaBuilder, ToolDefinition};
pub use manager::ToolManager;
pub use params::{parse_args, split_csv, to_json};
pub use traits::{Tool, ToolResult};
