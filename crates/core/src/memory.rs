//! Vector store trait: embedded knowledge fragments grouped in collections.
//!
//! The retrieval stack adds chunked documents to a named collection and
//! queries the nearest fragments for a user question. Querying a
//! collection that does not exist is an empty result, not an error.

use crate::error::MemoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a fragment came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    /// Origin identifier (usually the uploaded filename)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// 1-based page number for paginated documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl FragmentMetadata {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            page: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A piece of text with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub content: String,
    #[serde(default)]
    pub metadata: FragmentMetadata,
}

impl Fragment {
    pub fn new(content: impl Into<String>, metadata: FragmentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A fragment stored together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique ID within the collection
    pub id: String,

    pub fragment: Fragment,

    pub embedding: Vec<f32>,
}

/// Name and size of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: usize,
}

/// The core VectorStore trait.
///
/// Implementations: in-memory (default), JSONL files under a persist directory.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Append records to a collection, creating it on demand. Returns how
    /// many records were stored.
    async fn add(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> std::result::Result<usize, MemoryError>;

    /// The `k` fragments nearest to `embedding`, best first.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<Fragment>, MemoryError>;

    /// Whether a collection exists.
    async fn contains(&self, collection: &str) -> std::result::Result<bool, MemoryError>;

    /// All collections with their record counts, sorted by name.
    async fn list_collections(&self) -> std::result::Result<Vec<CollectionInfo>, MemoryError>;

    /// Drop a collection. Returns whether it existed.
    async fn delete_collection(&self, collection: &str) -> std::result::Result<bool, MemoryError>;
}
