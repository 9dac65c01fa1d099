//! Provider selection: builds the one backend the config asks for.

use crate::openai_compat::OpenAiCompatProvider;
use smartflow_config::AppConfig;
use smartflow_core::ModelGateway;
use smartflow_core::provider::Provider;
use std::sync::Arc;
use tracing::{info, warn};

/// Construct the provider named by `config.llm_provider`.
///
/// Unknown names fall back to OpenAI; `AppConfig::validate` rejects them earlier.
pub fn build_provider(config: &AppConfig) -> Arc<dyn Provider> {
    match config.llm_provider.as_str() {
        "ollama" => Arc::new(OpenAiCompatProvider::ollama(&config.ollama.base_url)),
        other => {
            if other != "openai" {
                warn!(provider = other, "Unknown LLM provider, using openai");
            }
            let api_key = config.openai.api_key.clone().unwrap_or_default();
            if api_key.is_empty() {
                warn!("No OpenAI API key configured; requests will be rejected");
            }
            Arc::new(OpenAiCompatProvider::openai(
                &config.openai.base_url,
                api_key,
            ))
        }
    }
}

/// Build the model gateway with the configured model parameters.
pub fn build_gateway(config: &AppConfig) -> ModelGateway {
    let provider = build_provider(config);
    info!(
        provider = %provider.name(),
        model = %config.active_model(),
        "Model gateway ready"
    );
    ModelGateway::new(provider, config.active_model())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_embedding_model(config.active_embedding_model())
}
