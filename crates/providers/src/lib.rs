//! LLM provider implementations for SmartFlow.
//!
//! All providers implement the `smartflow_core::Provider` trait.
//! The router builds the configured one and wraps it in a `ModelGateway`.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_gateway, build_provider};
