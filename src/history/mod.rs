//! # Conversation History
//!
//! Bounded per-user context store with the same soft-failure contract as the
//! cache: an unreachable store reads as empty and drops appends, logged but
//! never surfaced. History exists to improve analysis, so losing it degrades
//! quality, not availability.

pub mod memory;

pub use memory::MemoryHistoryStore;

use crate::config::HistoryConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Per-user ordered message store contract.
///
/// `append` prepends and truncates to `max_entries` as one atomic mutation,
/// so concurrent appends for a user never leave the sequence over-length.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Most recent `limit` messages, most-recent-first
    async fn read(&self, user_id: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    async fn append(
        &self,
        user_id: &str,
        message: &str,
        max_entries: usize,
    ) -> Result<(), StoreError>;
}

/// Policy wrapper applying the bounded-history rules over a store
pub struct ConversationHistory {
    store: Arc<dyn HistoryStore>,
    config: HistoryConfig,
}

impl ConversationHistory {
    pub fn new(store: Arc<dyn HistoryStore>, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    /// The configured number of context messages folded into analysis
    pub fn context_window(&self) -> usize {
        self.config.context_messages
    }

    /// Recent context for analysis, bounded by the configured window.
    /// Store failure degrades to no context.
    pub async fn recent(&self, user_id: &str) -> Vec<String> {
        self.read(user_id, self.config.context_messages).await
    }

    /// Most recent `limit` messages, most-recent-first. Never errors.
    pub async fn read(&self, user_id: &str, limit: usize) -> Vec<String> {
        match self.store.read(user_id, limit).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(user_id, error = %e, "History read failed, continuing without context");
                Vec::new()
            }
        }
    }

    /// Record a message, evicting the oldest beyond the configured cap.
    /// Store failure drops the message.
    pub async fn record(&self, user_id: &str, message: &str) {
        if let Err(e) = self
            .store
            .append(user_id, message, self.config.max_entries)
            .await
        {
            warn!(user_id, error = %e, "History append failed, message not recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnavailableStore;

    #[async_trait]
    impl HistoryStore for UnavailableStore {
        async fn read(&self, _user_id: &str, _limit: usize) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn append(
            &self,
            _user_id: &str,
            _message: &str,
            _max_entries: usize,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn history_over(store: Arc<dyn HistoryStore>) -> ConversationHistory {
        ConversationHistory::new(store, HistoryConfig::default())
    }

    #[tokio::test]
    async fn test_record_then_recent() {
        let history = history_over(Arc::new(MemoryHistoryStore::new()));

        history.record("u1", "first").await;
        history.record("u1", "second").await;
        history.record("u1", "third").await;

        // Default window is two, most-recent-first
        let recent = history.recent("u1").await;
        assert_eq!(recent, vec!["third".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_cap_keeps_most_recent_ten() {
        let history = history_over(Arc::new(MemoryHistoryStore::new()));

        for i in 1..=12 {
            history.record("u1", &format!("message {i}")).await;
        }

        let all = history.read("u1", 100).await;
        assert_eq!(all.len(), 10);
        assert_eq!(all.first().map(String::as_str), Some("message 12"));
        assert_eq!(all.last().map(String::as_str), Some("message 3"));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let history = history_over(Arc::new(MemoryHistoryStore::new()));

        history.record("u1", "mine").await;
        history.record("u2", "theirs").await;

        assert_eq!(history.recent("u1").await, vec!["mine".to_string()]);
        assert_eq!(history.recent("u2").await, vec!["theirs".to_string()]);
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades_silently() {
        let history = history_over(Arc::new(UnavailableStore));

        history.record("u1", "dropped").await;
        assert!(history.recent("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_reads_empty() {
        let history = history_over(Arc::new(MemoryHistoryStore::new()));
        assert!(history.recent("nobody").await.is_empty());
    }
}
