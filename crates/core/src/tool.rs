//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to look things up: evaluate
//! arithmetic, search, query weather or the business database.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool answered the request (false for descriptive misses
    /// such as an unknown city, which still produce helpful output)
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn miss(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// The core Tool trait.
///
/// Each tool implements this trait and is registered in the [`ToolRegistry`]
/// that the agent loops share.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loops use this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Invoke tools when the LLM requests them
///
/// Tools are keyed by name in sorted order, so definitions are stable
/// across calls.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool with raw JSON arguments as emitted by the model.
    ///
    /// Never fails: unknown tools, malformed arguments and tool errors all
    /// come back as `Error: ...` text the model can read and correct.
    pub async fn invoke(&self, name: &str, arguments: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            let err = ToolError::NotFound {
                name: name.to_string(),
                available: self.names().into_iter().map(str::to_string).collect(),
            };
            tracing::warn!(tool = %name, "Model requested unknown tool");
            return format!("Error: {err}");
        };

        let args = if arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            match serde_json::from_str::<serde_json::Value>(arguments) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "Malformed tool arguments");
                    return format!("Error: invalid arguments for {name}: {e}");
                }
            }
        };

        match tool.execute(args).await {
            Ok(result) => {
                tracing::debug!(tool = %name, success = result.success, "Tool executed");
                result.output
            }
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool failed");
                format!("Error: {e}")
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a required string argument.
pub fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> std::result::Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<ToolResult, ToolError> {
            let text = required_str(&arguments, "text")?;
            Ok(ToolResult::ok(text))
        }
    }

    struct AlphaTool;

    #[async_trait]
    impl Tool for AlphaTool {
        fn name(&self) -> &str {
            "alpha"
        }
        fn description(&self) -> &str {
            "First in order"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
        ) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult::ok("alpha"))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(AlphaTool));
        registry
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = registry();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let defs: Vec<crate::ToolDefinition> = registry().definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "echo"]);
    }

    #[tokio::test]
    async fn invoke_returns_tool_output() {
        let out = registry().invoke("echo", r#"{"text": "hello world"}"#).await;
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn invoke_unknown_tool_lists_valid_names() {
        let out = registry().invoke("shell", "{}").await;
        assert_eq!(out, "Error: shell is not a valid tool, try one of [alpha, echo].");
    }

    #[tokio::test]
    async fn invoke_malformed_arguments_is_text() {
        let out = registry().invoke("echo", "{not json").await;
        assert!(out.starts_with("Error: invalid arguments for echo"));
    }

    #[tokio::test]
    async fn invoke_tool_error_is_text() {
        let out = registry().invoke("echo", "").await;
        assert_eq!(out, "Error: Invalid tool arguments: Missing 'text' argument");
    }
}
