//! Agent allocation, lookup, and the step cycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use assistd_core::agent::{AgentDefaults, AgentRecord};
use assistd_core::error::AgentError;
use assistd_core::message::{Message, Role};
use assistd_core::provider::{PromptMessage, Provider, ProviderRequest, Usage};
use assistd_core::store::{AgentStore, MessageStore, PageQuery};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Creates and resolves agents.
///
/// Cheap to clone; all clones share stores, provider, and per-agent locks.
#[derive(Clone)]
pub struct AgentEngine {
    agents: Arc<dyn AgentStore>,
    messages: Arc<dyn MessageStore>,
    provider: Arc<dyn Provider>,
    defaults: Arc<AgentDefaults>,
    /// One async lock per live agent handle; serializes steps and appends.
    /// Entries die with the last handle and are pruned on the next insert.
    locks: Arc<Mutex<HashMap<Uuid, Weak<tokio::sync::Mutex<()>>>>>,
    /// Held across the quota check and insert in `create_agent`.
    create_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AgentEngine {
    pub fn new(
        agents: Arc<dyn AgentStore>,
        messages: Arc<dyn MessageStore>,
        provider: Arc<dyn Provider>,
        defaults: AgentDefaults,
    ) -> Self {
        Self {
            agents,
            messages,
            provider,
            defaults: Arc::new(defaults),
            locks: Arc::new(Mutex::new(HashMap::new())),
            create_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn defaults(&self) -> &AgentDefaults {
        &self.defaults
    }

    /// Direct access to the message store (read paths that need no lock).
    pub fn messages(&self) -> &Arc<dyn MessageStore> {
        &self.messages
    }

    /// Allocate a new agent owned by `owner` from the engine defaults.
    pub async fn create_agent(&self, owner: &str) -> Result<Agent, AgentError> {
        let _guard = self.create_lock.lock().await;

        let limit = self.defaults.max_agents_per_user;
        if limit > 0 && self.agents.count_agents(owner).await? >= limit {
            warn!(user_id = owner, limit, "Agent quota exceeded");
            return Err(AgentError::QuotaExceeded {
                user_id: owner.to_string(),
                limit,
            });
        }

        let record = AgentRecord::new(owner, &self.defaults);
        self.agents.insert_agent(&record).await?;
        info!(agent_id = %record.id, user_id = owner, "Agent created");
        Ok(self.handle(record))
    }

    /// Look up an agent by id regardless of owner.
    pub async fn get_agent(&self, id: Uuid) -> Result<Agent, AgentError> {
        let record = self
            .agents
            .get_agent(id)
            .await?
            .ok_or(AgentError::NotFound(id))?;
        Ok(self.handle(record))
    }

    /// Look up an agent owned by `owner`. Agents of other users are reported as not found.
    pub async fn load_agent(&self, owner: &str, id: Uuid) -> Result<Agent, AgentError> {
        let agent = self.get_agent(id).await?;
        if agent.record.user_id != owner {
            debug!(agent_id = %id, user_id = owner, "Agent owned by another user");
            return Err(AgentError::NotFound(id));
        }
        Ok(agent)
    }

    fn handle(&self, record: AgentRecord) -> Agent {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = match locks.get(&record.id).and_then(Weak::upgrade) {
            Some(lock) => lock,
            None => {
                locks.retain(|_, weak| weak.strong_count() > 0);
                let lock = Arc::new(tokio::sync::Mutex::new(()));
                locks.insert(record.id, Arc::downgrade(&lock));
                lock
            }
        };
        drop(locks);

        Agent {
            record,
            lock,
            messages: self.messages.clone(),
            provider: self.provider.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

/// What one step produced.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Messages appended by the step, in order
    pub messages: Vec<Message>,
    pub usage: Option<Usage>,
}

/// A resolved agent bound to the engine's stores and provider.
pub struct Agent {
    record: AgentRecord,
    lock: Arc<tokio::sync::Mutex<()>>,
    messages: Arc<dyn MessageStore>,
    provider: Arc<dyn Provider>,
    defaults: Arc<AgentDefaults>,
}

impl Agent {
    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn record(&self) -> &AgentRecord {
        &self.record
    }

    /// Append messages to the history without running a step.
    ///
    /// Returns the messages as stored; their `created_at` may have moved
    /// forward so that nothing lands before the current end of the history.
    pub async fn append_messages(
        &self,
        mut messages: Vec<Message>,
    ) -> Result<Vec<Message>, AgentError> {
        let _guard = self.lock.lock().await;
        self.stamp(&mut messages).await?;
        self.messages.append(&messages).await?;
        debug!(agent_id = %self.record.id, count = messages.len(), "Messages appended");
        Ok(messages)
    }

    /// Clamp timestamps to the newest stored message. Caller holds the agent lock.
    async fn stamp(&self, messages: &mut [Message]) -> Result<(), AgentError> {
        let mut floor = self
            .messages
            .read_range(self.record.id, &PageQuery::latest(1))
            .await?
            .first()
            .map(|m| m.created_at);

        for message in messages.iter_mut() {
            if let Some(floor) = floor {
                message.created_at = message.created_at.max(floor);
            }
            floor = Some(message.created_at);
        }
        Ok(())
    }

    /// Consume pending input and produce the agent's reply.
    pub async fn step(&self, input: Option<Message>) -> Result<StepOutcome, AgentError> {
        let _guard = self.lock.lock().await;
        let agent_id = self.record.id;

        if let Some(mut message) = input {
            self.stamp(std::slice::from_mut(&mut message)).await?;
            self.messages.append(std::slice::from_ref(&message)).await?;
        }

        let mut history = self
            .messages
            .read_range(agent_id, &PageQuery::latest(self.defaults.context_window))
            .await?;
        history.reverse();

        info!(agent_id = %agent_id, context = history.len(), "Running step");

        let mut prompt = Vec::with_capacity(history.len() + 1);
        prompt.push(PromptMessage::new(Role::System, &self.record.system_prompt));
        prompt.extend(
            history
                .iter()
                .map(|m| PromptMessage::new(m.role, m.content.clone())),
        );

        let request = ProviderRequest {
            model: self.record.model.clone(),
            messages: prompt,
            temperature: self.defaults.temperature,
            max_tokens: self.defaults.max_tokens,
        };

        let response = self.provider.complete(request).await.map_err(|source| {
            warn!(agent_id = %agent_id, provider = self.provider.name(), error = %source, "Step failed");
            AgentError::Step { agent_id, source }
        })?;

        let mut reply = Message::assistant(agent_id, &self.record.user_id, response.content);
        // The reply never sorts before the context it answers.
        if let Some(last) = history.last() {
            reply.created_at = reply.created_at.max(last.created_at);
        }
        if !response.model.is_empty() {
            reply
                .metadata
                .insert("model".into(), response.model.clone().into());
        }
        self.messages.append(std::slice::from_ref(&reply)).await?;

        if let Some(usage) = &response.usage {
            debug!(agent_id = %agent_id, total_tokens = usage.total_tokens, "Step usage");
        }

        Ok(StepOutcome {
            messages: vec![reply],
            usage: response.usage,
        })
    }
}
