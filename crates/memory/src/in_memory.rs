//! In-memory vector store: the default when no persist directory is set.

use crate::vector::nearest;
use async_trait::async_trait;
use smartflow_core::error::MemoryError;
use smartflow_core::memory::{CollectionInfo, Fragment, VectorRecord, VectorStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collections held in a map of record lists.
/// Contents are lost when the process exits.
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<BTreeMap<String, Vec<VectorRecord>>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<usize, MemoryError> {
        let added = records.len();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(records);
        Ok(added)
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Fragment>, MemoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| nearest(records, embedding, k))
            .unwrap_or_default())
    }

    async fn contains(&self, collection: &str) -> Result<bool, MemoryError> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, MemoryError> {
        Ok(self
            .collections
            .read()
            .await
            .iter()
            .map(|(name, records)| CollectionInfo {
                name: name.clone(),
                count: records.len(),
            })
            .collect())
    }

    async fn delete_collection(&self, collection: &str) -> Result<bool, MemoryError> {
        Ok(self.collections.write().await.remove(collection).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartflow_core::memory::FragmentMetadata;

    fn record(id: &str, content: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            fragment: Fragment::new(content, FragmentMetadata::source("doc.txt")),
            embedding,
        }
    }

    #[tokio::test]
    async fn add_then_query_nearest() {
        let store = InMemoryVectorStore::new();
        let added = store
            .add(
                "faq",
                vec![
                    record("faq_0", "退货", vec![1.0, 0.0]),
                    record("faq_1", "发货", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(added, 2);

        let hits = store.query("faq", &[0.9, 0.1], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "退货");
    }

    #[tokio::test]
    async fn missing_collection_queries_empty() {
        let store = InMemoryVectorStore::new();
        assert!(store.query("nope", &[1.0], 4).await.unwrap().is_empty());
        assert!(!store.contains("nope").await.unwrap());
    }

    #[tokio::test]
    async fn list_and_delete_collections() {
        let store = InMemoryVectorStore::new();
        store.add("b", vec![record("b_0", "x", vec![1.0])]).await.unwrap();
        store.add("a", vec![]).await.unwrap();

        let listed = store.list_collections().await.unwrap();
        assert_eq!(
            listed,
            vec![
                CollectionInfo { name: "a".into(), count: 0 },
                CollectionInfo { name: "b".into(), count: 1 },
            ]
        );

        assert!(store.delete_collection("b").await.unwrap());
        assert!(!store.delete_collection("b").await.unwrap());
        assert_eq!(store.list_collections().await.unwrap().len(), 1);
    }
}
