//! Tool manager for registering and dispatching tools

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::tool::{Tool, ToolDefinition, ToolResult};
use crate::{Error, Result};

/// Manager for registered tools
///
/// Built once at startup, then shared read-only by every in-flight call.
pub struct ToolManager {
    /// Registered tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolManager {
    /// Create a new empty tool manager
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All registered tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| {
                ToolDefinition::new(t.name(), t.description(), t.input_schema(), t.is_mutating())
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool by name
    ///
    /// # Errors
    /// Returns [`Error::UnknownTool`] if no tool has that name. Failures of
    /// the tool itself come back as an error [`ToolResult`].
    pub async fn execute(&self, name: &str, input: JsonValue) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;
        debug!(tool = name, "Dispatching tool call");
        Ok(tool.execute(input).await)
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back"
        }

        fn input_schema(&self) -> JsonValue {
            json!({"type": "object"})
        }

        async fn execute(&self, input: JsonValue) -> ToolResult {
            ToolResult::success(input.to_string())
        }
    }

    struct WriteTool;

    #[async_trait]
    impl Tool for WriteTool {
        fn name(&self) -> &str {
            "write"
        }

        fn description(&self) -> &str {
            "Pretend to write"
        }

        fn input_schema(&self) -> JsonValue {
            json!({"type": "object"})
        }

        fn is_mutating(&self) -> bool {
            true
        }

        async fn execute(&self, _input: JsonValue) -> ToolResult {
            ToolResult::success("{}")
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut manager = ToolManager::new();
        assert!(manager.is_empty());

        manager.register(Arc::new(WriteTool));
        manager.register(Arc::new(EchoTool));
        manager.register(Arc::new(EchoTool));

        assert_eq!(manager.len(), 2);
        assert!(manager.contains("echo"));
        assert_eq!(manager.tool_names(), vec!["echo", "write"]);

        let defs = manager.definitions();
        assert_eq!(defs[0].name, "echo");
        assert!(!defs[0].mutating);
        assert!(defs[1].mutating);
    }

    #[test]
    fn test_execute_dispatches() {
        let mut manager = ToolManager::new();
        manager.register(Arc::new(EchoTool));

        let result = tokio_test::block_on(manager.execute("echo", json!({"x": 1}))).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.json().unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let manager = ToolManager::default();
        let err = manager.execute("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(name) if name == "nope"));
    }
}
