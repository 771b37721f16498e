//! In-memory backend — useful for testing and ephemeral servers.

use std::collections::HashMap;

use assistd_core::agent::AgentRecord;
use assistd_core::error::StoreError;
use assistd_core::message::Message;
use assistd_core::store::{AgentStore, MessageStore, PageQuery};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cursor::paginate;

/// Agents and histories held in process memory.
///
/// Each history is kept sorted by `created_at`; messages with equal
/// timestamps stay in append order.
#[derive(Default)]
pub struct InMemoryStore {
    agents: RwLock<HashMap<Uuid, AgentRecord>>,
    histories: RwLock<HashMap<Uuid, Vec<Message>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert_agent(&self, agent: &AgentRecord) -> Result<(), StoreError> {
        self.agents.write().await.insert(agent.id, agent.clone());
        Ok(())
    }

    async fn get_agent(&self, id: Uuid) -> Result<Option<AgentRecord>, StoreError> {
        Ok(self.agents.read().await.get(&id).cloned())
    }

    async fn count_agents(&self, user_id: &str) -> Result<usize, StoreError> {
        let agents = self.agents.read().await;
        Ok(agents.values().filter(|a| a.user_id == user_id).count())
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, messages: &[Message]) -> Result<(), StoreError> {
        let mut histories = self.histories.write().await;
        for message in messages {
            let history = histories.entry(message.agent_id).or_default();
            let at = history.partition_point(|m| m.created_at <= message.created_at);
            history.insert(at, message.clone());
        }
        Ok(())
    }

    async fn read_range(
        &self,
        agent_id: Uuid,
        query: &PageQuery,
    ) -> Result<Vec<Message>, StoreError> {
        let histories = self.histories.read().await;
        let history = histories.get(&agent_id).map(Vec::as_slice).unwrap_or(&[]);
        paginate(history, agent_id, query)
    }

    async fn get(&self, agent_id: Uuid, message_id: Uuid) -> Result<Option<Message>, StoreError> {
        let histories = self.histories.read().await;
        Ok(histories
            .get(&agent_id)
            .and_then(|h| h.iter().find(|m| m.id == message_id))
            .cloned())
    }

    async fn count(&self, agent_id: Uuid) -> Result<usize, StoreError> {
        Ok(self
            .histories
            .read()
            .await
            .get(&agent_id)
            .map_or(0, Vec::len))
    }
}
