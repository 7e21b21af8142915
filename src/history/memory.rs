//! In-process history store. Each user's sequence is mutated through the
//! map entry API, making prepend-and-truncate atomic per user.

use crate::error::StoreError;
use crate::history::HistoryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;

/// DashMap-backed per-user message store
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    messages: DashMap<String, VecDeque<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with at least one stored message
    pub fn user_count(&self) -> usize {
        self.messages.len()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn read(&self, user_id: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        Ok(self
            .messages
            .get(user_id)
            .map(|entry| entry.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        user_id: &str,
        message: &str,
        max_entries: usize,
    ) -> Result<(), StoreError> {
        let mut entry = self.messages.entry(user_id.to_string()).or_default();
        entry.push_front(message.to_string());
        entry.truncate(max_entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_prepends() {
        let store = MemoryHistoryStore::new();
        store.append("u", "old", 10).await.unwrap();
        store.append("u", "new", 10).await.unwrap();

        let messages = store.read("u", 10).await.unwrap();
        assert_eq!(messages, vec!["new".to_string(), "old".to_string()]);
    }

    #[tokio::test]
    async fn test_append_truncates_to_cap() {
        let store = MemoryHistoryStore::new();
        for i in 0..5 {
            store.append("u", &i.to_string(), 3).await.unwrap();
        }

        let messages = store.read("u", 10).await.unwrap();
        assert_eq!(messages, vec!["4".to_string(), "3".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_read_respects_limit() {
        let store = MemoryHistoryStore::new();
        for i in 0..5 {
            store.append("u", &i.to_string(), 10).await.unwrap();
        }

        let messages = store.read("u", 2).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "4");
    }

    #[tokio::test]
    async fn test_user_count_tracks_distinct_users() {
        let store = MemoryHistoryStore::new();
        store.append("a", "one", 10).await.unwrap();
        store.append("a", "two", 10).await.unwrap();
        store.append("b", "three", 10).await.unwrap();

        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_respect_cap() {
        let store = std::sync::Arc::new(MemoryHistoryStore::new());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append("u", &format!("m{i}"), 10).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let messages = store.read("u", 100).await.unwrap();
        assert_eq!(messages.len(), 10);
    }
}
