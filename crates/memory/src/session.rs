//! Per-session conversation memory with a sliding window.
//!
//! One process-wide store, constructed once and shared by the loops and the
//! HTTP layer. Each session keeps at most `capacity` messages; every append
//! evicts from the front until the log fits again. Individual operations
//! are atomic, but a turn spans several of them and two concurrent turns on
//! the same session may interleave their appends.

use smartflow_core::message::Message;
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::RwLock;

pub struct SessionStore {
    capacity: usize,
    sessions: RwLock<BTreeMap<String, VecDeque<Message>>>,
}

impl SessionStore {
    /// A store whose sessions hold at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The session's messages, oldest first. Creates an empty session on
    /// first access.
    pub async fn get_or_create(&self, session_id: &str) -> Vec<Message> {
        if let Some(log) = self.sessions.read().await.get(session_id) {
            return log.iter().cloned().collect();
        }
        let mut sessions = self.sessions.write().await;
        let log = sessions.entry(session_id.to_string()).or_default();
        log.iter().cloned().collect()
    }

    /// The session's messages without creating it.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append one message, evicting the oldest while over capacity.
    pub async fn append(&self, session_id: &str, message: Message) {
        let mut sessions = self.sessions.write().await;
        let log = sessions.entry(session_id.to_string()).or_default();
        log.push_back(message);
        while log.len() > self.capacity {
            log.pop_front();
        }
    }

    /// Remove a session. Returns whether it existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        let existed = self.sessions.write().await.remove(session_id).is_some();
        tracing::debug!(session_id, existed, "Session cleared");
        existed
    }

    /// IDs of all live sessions, sorted.
    pub async fn list_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(20)
    }
}
