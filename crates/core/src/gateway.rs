//! The language-model gateway every loop talks to.
//!
//! Wraps one [`Provider`] with the configured model parameters and exposes
//! the three operations the agent core needs: free generation with an
//! optional tool set, structured generation decoded into a Rust type, and
//! embeddings for retrieval.

use crate::error::{DecodeError, ProviderError};
use crate::message::Message;
use crate::provider::{
    EmbeddingRequest, Generation, OutputSchema, Provider, ProviderRequest, ToolDefinition,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub struct ModelGateway {
    provider: Arc<dyn Provider>,
    model: String,
    embedding_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            embedding_model: String::new(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn request(&self, messages: &[Message], tools: &[ToolDefinition]) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        }
    }

    /// Send `messages` with an optional tool set and return what the model produced.
    pub async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Generation, ProviderError> {
        tracing::debug!(
            provider = %self.provider.name(),
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Generating"
        );
        let response = self.provider.complete(self.request(messages, tools)).await?;
        Ok(response.output)
    }

    /// Ask for output matching `schema` and decode it into `T`.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
    ) -> Result<T, DecodeError> {
        let value = self
            .provider
            .complete_structured(self.request(messages, &[]), schema)
            .await?;
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    /// Embed a batch of texts, one vector per input.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: texts,
            })
            .await?;
        if response.embeddings.len() != expected {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: format!(
                    "expected {expected} embeddings, got {}",
                    response.embeddings.len()
                ),
            });
        }
        Ok(response.embeddings)
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| ProviderError::Network("empty embedding response".into()))
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .finish()
    }
}
