//! Tool trait definition
//!
//! Defines the core trait for implementing tools that can be invoked by the
//! calling agent.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::ApiError;

/// Tool execution result
///
/// `output` is always JSON text: the normalized record(s) on success, or the
/// structured `{"ok": false, "error": {...}}` object on failure.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// JSON output from tool execution
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }

    /// Render a typed adapter failure as a structured result
    pub fn from_api_error(err: &ApiError) -> Self {
        Self::error(pretty(&err.to_json()))
    }

    /// Convert the outcome of a catalog entry into what the agent receives
    pub fn from_outcome<T: Serialize>(outcome: Result<T, ApiError>) -> Self {
        match outcome {
            Ok(value) => match serde_json::to_value(&value) {
                Ok(json) => Self::success(pretty(&json)),
                Err(e) => Self::from_api_error(&ApiError::upstream(
                    None,
                    format!("failed to encode result: {}", e),
                )),
            },
            Err(err) => Self::from_api_error(&err),
        }
    }

    /// Parse the output back into JSON
    pub fn json(&self) -> Option<JsonValue> {
        serde_json::from_str(&self.output).ok()
    }
}

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Tool trait
///
/// Implement this trait to expose an operation to the calling agent.
/// `execute` never fails at the Rust level: typed adapter errors are caught
/// inside and returned as structured failure results.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable external identifier
    fn name(&self) -> &str;

    /// Natural-language description read by the agent when choosing tools
    fn description(&self) -> &str;

    /// JSON schema for the tool's input parameters
    fn input_schema(&self) -> JsonValue;

    /// Whether calling the tool changes remote state
    fn is_mutating(&self) -> bool {
        false
    }

    /// Execute the tool with the given input
    async fn execute(&self, input: JsonValue) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_outcome_success() {
        let result = ToolResult::from_outcome(Ok(json!({"number": 7, "title": "登录失败"})));
        assert!(!result.is_error);
        // non-ASCII stays readable
        assert!(result.output.contains("登录失败"));
        assert_eq!(result.json().unwrap()["number"], json!(7));
    }

    #[test]
    fn test_from_outcome_failure() {
        let result = ToolResult::from_outcome::<JsonValue>(Err(ApiError::not_found("no such repo")));
        assert!(result.is_error);
        let value = result.json().unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["error"]["kind"], json!("not_found"));
    }
}
