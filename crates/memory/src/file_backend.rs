//! File-based vector store: persistent JSON-lines storage.
//!
//! Each collection is one `<name>.jsonl` file under the persist directory,
//! one JSON-encoded `VectorRecord` per line. Collections are loaded into
//! memory on creation and written back on every mutation, which gives fast
//! reads with simple, human-inspectable files.

use crate::vector::nearest;
use async_trait::async_trait;
use smartflow_core::error::MemoryError;
use smartflow_core::memory::{CollectionInfo, Fragment, VectorRecord, VectorStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const EXTENSION: &str = "jsonl";

pub struct FileVectorStore {
    dir: PathBuf,
    collections: Arc<RwLock<BTreeMap<String, Vec<VectorRecord>>>>,
}

impl FileVectorStore {
    /// Open (or lazily create) a store rooted at `dir`.
    ///
    /// Existing `*.jsonl` files are loaded; the directory itself is created
    /// on first write.
    pub fn new(dir: PathBuf) -> Self {
        let collections = Self::load_from_disk(&dir);
        debug!(
            dir = %dir.display(),
            collections = collections.len(),
            "File vector store loaded"
        );
        Self {
            dir,
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    fn load_from_disk(dir: &Path) -> BTreeMap<String, Vec<VectorRecord>> {
        let mut collections = BTreeMap::new();
        let Ok(entries) = std::fs::read_dir(dir) else {
            return collections; // Directory doesn't exist yet, start empty
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable collection");
                    continue;
                }
            };
            let records = content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .filter_map(|line| match serde_json::from_str::<VectorRecord>(line) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(collection = %name, error = %e, "Skipping corrupted record");
                        None
                    }
                })
                .collect();
            collections.insert(name.to_string(), records);
        }
        collections
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, MemoryError> {
        let valid = !collection.is_empty()
            && !collection.starts_with('.')
            && !collection.contains(['/', '\\', '\0']);
        if !valid {
            return Err(MemoryError::Storage(format!(
                "Invalid collection name: {collection:?}"
            )));
        }
        Ok(self.dir.join(format!("{collection}.{EXTENSION}")))
    }

    /// Write one collection to disk as JSONL.
    fn flush(&self, collection: &str, records: &[VectorRecord]) -> Result<(), MemoryError> {
        let path = self.collection_path(collection)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MemoryError::Storage(format!("Failed to create vector store directory: {e}"))
        })?;

        let mut content = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| MemoryError::Storage(format!("Failed to serialize record: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&path, &content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write collection file: {e}")))
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<usize, MemoryError> {
        self.collection_path(collection)?;
        let added = records.len();
        let mut collections = self.collections.write().await;
        let mut updated = collections.get(collection).cloned().unwrap_or_default();
        updated.extend(records);
        // Memory only changes once the file write has succeeded.
        self.flush(collection, &updated)?;
        collections.insert(collection.to_string(), updated);
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
        let mut collections = self.collections.write().await;
        if collections.remove(collection).is_none() {
            return Ok(false);
        }
        let path = self.collection_path(collection)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to remove collection file: {e}"
                )));
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartflow_core::memory::FragmentMetadata;
    use std::io::Write;

    fn record(id: &str, content: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            fragment: Fragment::new(content, FragmentMetadata::source("manual.pdf").with_page(2)),
            embedding,
        }
    }

    #[tokio::test]
    async fn add_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().to_path_buf());
        store
            .add("manual", vec![record("manual_0", "保修一年", vec![1.0, 0.0])])
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("manual.jsonl")).unwrap();
        assert!(content.contains("保修一年"));

        let reopened = FileVectorStore::new(dir.path().to_path_buf());
        let hits = reopened.query("manual", &[1.0, 0.0], 4).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.page, Some(2));
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().to_path_buf());
        store.add("tmp", vec![record("tmp_0", "x", vec![1.0])]).await.unwrap();

        assert!(store.delete_collection("tmp").await.unwrap());
        assert!(!dir.path().join("tmp.jsonl").exists());
        assert!(!store.delete_collection("tmp").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().to_path_buf());
        assert!(store.add("../escape", vec![]).await.is_err());
        assert!(store.query("../escape", &[1.0], 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a regular file").unwrap();
        let store = FileVectorStore::new(blocker.join("store"));

        let result = store
            .add("kb", vec![record("kb_0", "orphan", vec![1.0, 0.0])])
            .await;
        assert!(matches!(result, Err(MemoryError::Storage(_))));
        assert!(!store.contains("kb").await.unwrap());
        assert!(store.query("kb", &[1.0, 0.0], 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_append_keeps_previous_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().to_path_buf());
        store.add("kb", vec![record("kb_0", "first", vec![1.0, 0.0])]).await.unwrap();

        // A directory squatting on the collection file makes the rewrite fail.
        std::fs::remove_file(dir.path().join("kb.jsonl")).unwrap();
        std::fs::create_dir(dir.path().join("kb.jsonl")).unwrap();

        let result = store
            .add("kb", vec![record("kb_1", "second", vec![0.0, 1.0])])
            .await;
        assert!(result.is_err());
        let listed = store.list_collections().await.unwrap();
        assert_eq!(listed, vec![CollectionInfo { name: "kb".into(), count: 1 }]);
    }

    #[tokio::test]
    async fn missing_directory_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().join("not-yet"));
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn skips_corrupted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let valid = serde_json::to_string(&record("a_0", "valid", vec![1.0])).unwrap();
        let mut file = std::fs::File::create(dir.path().join("a.jsonl")).unwrap();
        writeln!(file, "{valid}").unwrap();
        writeln!(file, "this is not json").unwrap();

        let store = FileVectorStore::new(dir.path().to_path_buf());
        let listed = store.list_collections().await.unwrap();
        assert_eq!(listed, vec![CollectionInfo { name: "a".into(), count: 1 }]);
    }
}
