//! Message domain types.
//!
//! A message belongs to exactly one agent and is never mutated after it is
//! appended to that agent's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message role '{0}'")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            "tool" => Ok(Role::Tool),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A single message in an agent's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// The agent whose history this message belongs to
    pub agent_id: Uuid,

    /// The user that owns the agent
    pub user_id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Creation timestamp; primary ordering key within an agent's history
    pub created_at: DateTime<Utc>,

    /// Optional metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Create a new message for the given agent.
    pub fn new(
        agent_id: Uuid,
        user_id: impl Into<String>,
        role: Role,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            user_id: user_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(agent_id: Uuid, user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, user_id, Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(
        agent_id: Uuid,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(agent_id, user_id, Role::Assistant, content)
    }
}
