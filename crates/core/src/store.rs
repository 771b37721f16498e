//! Storage traits — agents and their append-only message histories.
//!
//! Implementations: in-memory (tests, ephemeral servers) and SQLite.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentRecord;
use crate::error::StoreError;
use crate::message::Message;

/// Default page size for history reads.
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Traversal direction over an agent's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Oldest first (default)
    #[default]
    Asc,
    /// Newest first
    Desc,
}

/// A bounded, ordered read over one agent's history.
///
/// `after` and `before` are exclusive bounds in `(created_at, insertion)` order
/// and are independent of `order`: `Desc` only changes which end of the
/// bounded interval is returned first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub after: Option<Uuid>,
    pub before: Option<Uuid>,
    pub order: Order,
    pub limit: usize,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            after: None,
            before: None,
            order: Order::Asc,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageQuery {
    /// The newest `limit` messages, newest first.
    pub fn latest(limit: usize) -> Self {
        Self {
            order: Order::Desc,
            limit,
            ..Self::default()
        }
    }
}

/// Persistence for agent records.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    async fn insert_agent(&self, agent: &AgentRecord) -> Result<(), StoreError>;

    async fn get_agent(&self, id: Uuid) -> Result<Option<AgentRecord>, StoreError>;

    /// Number of agents owned by `user_id`.
    async fn count_agents(&self, user_id: &str) -> Result<usize, StoreError>;
}

/// Append-only, per-agent message history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append messages in slice order. Each message's `agent_id` selects its history.
    async fn append(&self, messages: &[Message]) -> Result<(), StoreError>;

    /// Read a bounded page of one agent's history.
    ///
    /// Fails with [`StoreError::CursorNotFound`] when `after` or `before`
    /// does not name a message of this agent.
    async fn read_range(&self, agent_id: Uuid, query: &PageQuery)
    -> Result<Vec<Message>, StoreError>;

    /// Point lookup by `(agent_id, message_id)`.
    async fn get(&self, agent_id: Uuid, message_id: Uuid) -> Result<Option<Message>, StoreError>;

    /// Total messages in one agent's history.
    async fn count(&self, agent_id: Uuid) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.limit, 1000);
        assert_eq!(query.order, Order::Asc);
        assert!(query.after.is_none() && query.before.is_none());
    }

    #[test]
    fn latest_reads_newest_first() {
        let query = PageQuery::latest(20);
        assert_eq!(query.order, Order::Desc);
        assert_eq!(query.limit, 20);
    }

    #[test]
    fn order_deserializes_lowercase() {
        let order: Order = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(order, Order::Desc);
    }
}
