//! Tool trait definition

use async_trait::async_trait;
use crew_core::{Error, Result};
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Tools are invoked only through the model: the agent advertises each tool's
/// name, description and schema, and executes it when the model asks.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the arguments the model produced
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match input_schema)
    ///
    /// # Returns
    ///
    /// Tool output as text, fed back to the model verbatim
    async fn execute(&self, params: Value) -> Result<String>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry; this is the name config files use.
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    fn input_schema(&self) -> Value;
}

/// Read a required string argument from a tool payload
pub fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::Processing(format!("missing required string argument '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_str() {
        let params = json!({"query": "naval exercises", "blank": "  ", "n": 3});
        assert_eq!(required_str(&params, "query").unwrap(), "naval exercises");
        assert!(required_str(&params, "blank").is_err());
        assert!(required_str(&params, "n").is_err());
        assert!(required_str(&params, "missing").is_err());
    }
}
