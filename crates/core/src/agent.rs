//! Agent configuration and persisted agent records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The single well-known assistant configuration every agent is created from.
pub const DEFAULT_ASSISTANT_ID: &str = "asst_default";

/// Default configuration applied to newly allocated agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    /// Model used for every step of the agent
    pub model: String,

    /// System prompt prepended to each step's context
    pub system_prompt: String,

    /// Sampling temperature
    #[serde(default = "default_temp")]
    pub temperature: f32,

    /// Max tokens per generated reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// How many of the most recent messages are sent to the provider per step
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum agents a single user may own (0 = unlimited)
    #[serde(default)]
    pub max_agents_per_user: usize,
}

fn default_temp() -> f32 {
    0.7
}
fn default_context_window() -> usize {
    50
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".into(),
            system_prompt: "You are a helpful assistant.".into(),
            temperature: default_temp(),
            max_tokens: None,
            context_window: default_context_window(),
            max_agents_per_user: 0,
        }
    }
}

/// The persisted identity and configuration of one agent.
///
/// A thread in the external API is exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: Uuid,

    /// Owning user
    pub user_id: String,

    /// Assistant configuration this agent was created from
    pub assistant_id: String,

    pub model: String,

    pub system_prompt: String,

    pub created_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Allocate a fresh record for `user_id` from the given defaults.
    pub fn new(user_id: impl Into<String>, defaults: &AgentDefaults) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            assistant_id: DEFAULT_ASSISTANT_ID.to_string(),
            model: defaults.model.clone(),
            system_prompt: defaults.system_prompt.clone(),
            created_at: Utc::now(),
        }
    }
}
