//! Tool definition types for LLM tool use

use crate::{LLMError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest tool name accepted by function-calling APIs
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Tool definition for LLM provider
///
/// This describes a tool that the LLM can use, including its name,
/// description, and input schema in JSON Schema format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in ToolRegistry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Check the definition against the constraints function-calling APIs enforce
    ///
    /// Names must be 1-64 characters of `[A-Za-z0-9_-]`; the schema must be a
    /// JSON object schema whose `properties` is an object and whose `required`
    /// entries are strings.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| LLMError::InvalidTool {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() || self.name.len() > MAX_TOOL_NAME_LEN {
            return Err(invalid("name must be 1-64 characters"));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("name may only contain letters, digits, '_' and '-'"));
        }

        let Some(schema) = self.input_schema.as_object() else {
            return Err(invalid("input schema must be a JSON object"));
        };
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(invalid("input schema type must be \"object\""));
        }
        if let Some(properties) = schema.get("properties") {
            if !properties.is_object() {
                return Err(invalid("\"properties\" must be an object"));
            }
        }
        if let Some(required) = schema.get("required") {
            let all_strings = required
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !all_strings {
                return Err(invalid("\"required\" must be an array of strings"));
            }
        }

        Ok(())
    }
}

/// Helper module to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use crew_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "query": schema::string("Search query"),
    ///         "limit": schema::integer("Maximum results"),
    ///     }),
    ///     vec!["query"],
    /// );
    /// assert_eq!(schema["required"][0], "query");
    /// ```
    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }
}
