//! Knowledge base and retrieval over a [`VectorStore`].
//!
//! The knowledge base owns the embedding step: uploads are embedded in one
//! batch before storage, queries are embedded once per search. The
//! retriever formats the nearest fragments into the context block that the
//! agent loops append to their system prompts.

use smartflow_core::error::MemoryError;
use smartflow_core::gateway::ModelGateway;
use smartflow_core::memory::{CollectionInfo, Fragment, VectorRecord, VectorStore};
use std::sync::Arc;
use tracing::{debug, info};

pub struct KnowledgeBase {
    store: Arc<dyn VectorStore>,
    gateway: Arc<ModelGateway>,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn VectorStore>, gateway: Arc<ModelGateway>) -> Self {
        Self { store, gateway }
    }

    /// Embed and store chunks in `collection`, creating it on demand.
    /// Returns the number of chunks indexed.
    pub async fn add_documents(
        &self,
        chunks: Vec<Fragment>,
        collection: &str,
    ) -> Result<usize, MemoryError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self
            .gateway
            .embed(texts)
            .await
            .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;

        let offset = self.count(collection).await?;
        let records = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (fragment, embedding))| VectorRecord {
                id: format!("{collection}_{}", offset + i),
                fragment,
                embedding,
            })
            .collect();

        let added = self.store.add(collection, records).await?;
        info!(collection, added, store = self.store.name(), "Documents indexed");
        Ok(added)
    }

    /// The `k` fragments nearest to `query`. A missing collection is an
    /// empty result and costs no embedding call.
    pub async fn similarity_search(
        &self,
        query: &str,
        collection: &str,
        k: usize,
    ) -> Result<Vec<Fragment>, MemoryError> {
        if !self.store.contains(collection).await? {
            debug!(collection, "Search against missing collection");
            return Ok(Vec::new());
        }
        let embedding = self
            .gateway
            .embed_one(query)
            .await
            .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;
        self.store.query(collection, &embedding, k).await
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>, MemoryError> {
        self.store.list_collections().await
    }

    pub async fn delete_collection(&self, collection: &str) -> Result<bool, MemoryError> {
        self.store.delete_collection(collection).await
    }

    async fn count(&self, collection: &str) -> Result<usize, MemoryError> {
        Ok(self
            .store
            .list_collections()
            .await?
            .into_iter()
            .find(|c| c.name == collection)
            .map(|c| c.count)
            .unwrap_or(0))
    }
}

pub struct Retriever {
    knowledge_base: Arc<KnowledgeBase>,
    top_k: usize,
}

impl Retriever {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self {
            knowledge_base,
            top_k: top_k.max(1),
        }
    }

    pub async fn retrieve(&self, query: &str, collection: &str) -> Result<Vec<Fragment>, MemoryError> {
        self.knowledge_base
            .similarity_search(query, collection, self.top_k)
            .await
    }

    /// Retrieve and format as a prompt block; empty when nothing matched.
    pub async fn retrieve_as_context(&self, query: &str, collection: &str) -> Result<String, MemoryError> {
        let fragments = self.retrieve(query, collection).await?;
        debug!(collection, hits = fragments.len(), "Retrieved context");
        Ok(format_context(&fragments))
    }
}

/// Render fragments as numbered, source-tagged blocks.
pub fn format_context(fragments: &[Fragment]) -> String {
    if fragments.is_empty() {
        return String::new();
    }

    let mut parts = vec!["以下是从知识库中检索到的相关内容:\n".to_string()];
    for (i, fragment) in fragments.iter().enumerate() {
        let source = fragment.metadata.source.as_deref().unwrap_or("未知");
        let reference = match fragment.metadata.page {
            Some(page) => format!("[来源: {source}, 第{page}页]"),
            None => format!("[来源: {source}]"),
        };
        parts.push(format!(
            "--- 片段 {} {reference} ---\n{}\n",
            i + 1,
            fragment.content
        ));
    }
    parts.join("\n")
}
