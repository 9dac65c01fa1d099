//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get back a
//! [`Generation`]: either final text or a batch of tool-call requests.
//!
//! Implementations: OpenAI-compatible endpoints (OpenAI, Ollama) and
//! scripted mocks in tests.

use crate::error::{DecodeError, ProviderError};
use crate::message::{Message, MessageToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini", "llama3.1")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A named JSON Schema for structured output requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// What the model produced for one call.
///
/// Whether tool calls are pending is always answered by the variant, never
/// by probing an optional field. `ToolCalls` always carries at least one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generation {
    Text {
        content: String,
    },
    ToolCalls {
        calls: Vec<MessageToolCall>,
        #[serde(default)]
        content: String,
    },
}

impl Generation {
    /// Build a generation from raw parts, collapsing an empty call list to text.
    pub fn from_parts(content: String, calls: Vec<MessageToolCall>) -> Self {
        if calls.is_empty() {
            Generation::Text { content }
        } else {
            Generation::ToolCalls { calls, content }
        }
    }

    /// The text content, possibly empty.
    pub fn content(&self) -> &str {
        match self {
            Generation::Text { content } | Generation::ToolCalls { content, .. } => content,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        matches!(self, Generation::ToolCalls { .. })
    }

    /// Convert into the assistant message that records this generation.
    pub fn into_message(self) -> Message {
        match self {
            Generation::Text { content } => Message::assistant(content),
            Generation::ToolCalls { calls, content } => {
                Message::assistant_with_tool_calls(content, calls)
            }
        }
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// What the model produced
    pub output: Generation,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The model to use for embeddings (e.g., "text-embedding-3-small").
    pub model: String,

    /// The texts to embed.
    pub inputs: Vec<String>,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vectors, one per input text.
    pub embeddings: Vec<Vec<f32>>,

    /// Which model was used.
    pub model: String,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loops go through
/// [`crate::ModelGateway`] and never know which backend is answering.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Ask for a JSON document conforming to `schema`.
    ///
    /// Default implementation reports that structured output isn't supported.
    async fn complete_structured(
        &self,
        _request: ProviderRequest,
        _schema: &OutputSchema,
    ) -> std::result::Result<serde_json::Value, DecodeError> {
        Err(DecodeError::Unsupported(format!(
            "Provider '{}' does not support structured output",
            self.name()
        )))
    }

    /// Generate embeddings for the given texts.
    ///
    /// Default implementation returns an error indicating embeddings aren't supported.
    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Provider '{}' does not support embeddings",
            self.name()
        )))
    }

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_call_list_collapses_to_text() {
        let g = Generation::from_parts("hi".into(), vec![]);
        assert_eq!(g, Generation::Text { content: "hi".into() });
        assert!(!g.has_tool_calls());
    }

    #[test]
    fn tool_calls_become_assistant_message() {
        let g = Generation::from_parts(
            String::new(),
            vec![MessageToolCall::new("c1", "calculator", r#"{"expression":"1+1"}"#)],
        );
        assert!(g.has_tool_calls());
        let msg = g.into_message();
        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls[0].name, "calculator");
    }

    #[test]
    fn generation_serializes_with_kind_tag() {
        let json = serde_json::to_value(Generation::Text { content: "ok".into() }).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["content"], "ok");
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "calculator".into(),
            description: "计算数学表达式".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "expression": { "type": "string" }
                },
                "required": ["expression"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("calculator"));
        assert!(json.contains("expression"));
    }
}
