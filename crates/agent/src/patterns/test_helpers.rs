//! Shared test helpers for pattern tests.

use smartflow_core::error::{DecodeError, ProviderError};
use smartflow_core::message::MessageToolCall;
use smartflow_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Generation, OutputSchema, Provider, ProviderRequest,
    ProviderResponse,
};
use smartflow_core::{ModelGateway, ToolRegistry};
use smartflow_memory::SessionStore;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply to a `complete` call.
pub enum Scripted {
    Reply(Generation),
    Fail(ProviderError),
}

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` pops the next scripted reply; structured calls pop
/// from a separate queue and report `Unsupported` once it is empty. Every
/// request is recorded in call order. Panics if more completions are
/// requested than were scripted.
pub struct SequentialMockProvider {
    replies: Mutex<VecDeque<Scripted>>,
    structured: Mutex<VecDeque<Result<serde_json::Value, DecodeError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            structured: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider answering each call with the next text.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| text(t)).collect())
    }

    /// Queue results for `complete_structured`.
    pub fn with_structured(self, results: Vec<Result<serde_json::Value, DecodeError>>) -> Self {
        *self.structured.lock().unwrap() = results.into();
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(output)) => Ok(ProviderResponse {
                output,
                usage: None,
                model: "mock-model".into(),
            }),
            Some(Scripted::Fail(e)) => Err(e),
            None => panic!("SequentialMockProvider: no more responses (call #{call})"),
        }
    }

    async fn complete_structured(
        &self,
        request: ProviderRequest,
        _schema: &OutputSchema,
    ) -> Result<serde_json::Value, DecodeError> {
        self.requests.lock().unwrap().push(request);
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DecodeError::Unsupported("sequential_mock".into())))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|_| vec![1.0, 0.0]).collect(),
            model: request.model,
        })
    }
}

pub fn text(content: &str) -> Scripted {
    Scripted::Reply(Generation::Text {
        content: content.to_string(),
    })
}

pub fn tool_calls(calls: Vec<MessageToolCall>, content: &str) -> Scripted {
    Scripted::Reply(Generation::from_parts(content.to_string(), calls))
}

pub fn failure() -> Scripted {
    Scripted::Fail(ProviderError::Network("connection refused".into()))
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall::new(format!("call_{name}"), name, args.to_string())
}

pub fn gateway(provider: &Arc<SequentialMockProvider>) -> Arc<ModelGateway> {
    Arc::new(ModelGateway::new(provider.clone(), "mock-model"))
}

pub fn registry() -> Arc<ToolRegistry> {
    Arc::new(smartflow_tools::default_registry())
}

pub fn sessions() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(20))
}
