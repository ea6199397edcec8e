//! Tool definition helpers
//!
//! Provides the catalog-facing [`ToolDefinition`] and a small builder for
//! parameter schemas.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

/// Tool definition as advertised to the calling agent
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
    /// Calling the tool changes remote state
    pub mutating: bool,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: JsonValue,
        mutating: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            mutating,
        }
    }
}

/// Builder for object parameter schemas
///
/// # Example
/// ```
/// use ops_core::SchemaBuilder;
/// use serde_json::json;
///
/// let schema = SchemaBuilder::new()
///     .required("repo", "string", "Repository, owner/repo or short name")
///     .with_default("per_page", "integer", "Page size", json!(20))
///     .build();
/// assert_eq!(schema["required"], json!(["repo"]));
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    properties: Map<String, JsonValue>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required property
    pub fn required(mut self, name: &str, type_str: &str, description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({"type": type_str, "description": description}),
        );
        self.required.push(name.to_string());
        self
    }

    /// Add an optional property without a default
    pub fn optional(mut self, name: &str, type_str: &str, description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({"type": type_str, "description": description}),
        );
        self
    }

    /// Add an optional property with a default value
    pub fn with_default(
        mut self,
        name: &str,
        type_str: &str,
        description: &str,
        default: JsonValue,
    ) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({"type": type_str, "description": description, "default": default}),
        );
        self
    }

    /// Add an optional string property restricted to `values`
    pub fn string_enum(
        mut self,
        name: &str,
        values: &[&str],
        description: &str,
        default: Option<&str>,
    ) -> Self {
        let mut prop = json!({"type": "string", "enum": values, "description": description});
        if let Some(default) = default {
            prop["default"] = json!(default);
        }
        self.properties.insert(name.to_string(), prop);
        self
    }

    pub fn build(self) -> JsonValue {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }
}
