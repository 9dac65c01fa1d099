//! Memory for SmartFlow: session history, vector stores, document
//! chunking and retrieval.

pub mod chunker;
pub mod document;
pub mod file_backend;
pub mod in_memory;
pub mod retriever;
pub mod session;
pub mod vector;

pub use chunker::{Chunker, ChunkingConfig};
pub use document::{ALLOWED_EXTENSIONS, DocumentProcessor};
pub use file_backend::FileVectorStore;
pub use in_memory::InMemoryVectorStore;
pub use retriever::{KnowledgeBase, Retriever, format_context};
pub use session::SessionStore;
pub use vector::{cosine_similarity, nearest};
