//! # SmartFlow Core
//!
//! Domain types, traits, and error definitions for the SmartFlow agent
//! orchestration service. This crate has **no framework dependencies**; it
//! defines the domain model that all other crates implement against.
//!
//! ## Seams
//!
//! Every external capability is a trait here:
//! - [`Provider`] is a chat/embedding backend, wrapped by [`ModelGateway`]
//! - [`Tool`] is a callable capability, collected in a [`ToolRegistry`]
//! - [`VectorStore`] holds embedded fragments grouped by collection
//!
//! Implementations live in their respective crates, so the agent loops can
//! be exercised against scripted mocks.

pub mod agent;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentMode, AgentOutcome, IntermediateStep};
pub use error::{DecodeError, Error, Result};
pub use gateway::ModelGateway;
pub use memory::{CollectionInfo, Fragment, FragmentMetadata, VectorRecord, VectorStore};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{
    Generation, OutputSchema, Provider, ProviderRequest, ProviderResponse, ToolDefinition,
};
pub use tool::{Tool, ToolRegistry, ToolResult};
