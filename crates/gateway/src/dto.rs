//! Wire shapes of the assistants resource API.

use assistd_core::agent::AgentRecord;
use assistd_core::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssistantRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateThreadRequest {
    /// Accepted but not used yet
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Accepted but not used yet
    #[serde(default)]
    pub assistant_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRunRequest {
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub additional_instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Raw list parameters; validated into a `PageQuery` by [`crate::cursor`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMessagesParams {
    pub limit: Option<String>,
    pub order: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub model: String,
    pub instructions: Option<String>,
    pub tools: Vec<Value>,
    pub file_ids: Vec<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub metadata: Metadata,
}

impl From<&AgentRecord> for Thread {
    fn from(agent: &AgentRecord) -> Self {
        Self {
            id: agent.id.to_string(),
            object: "thread".into(),
            created_at: agent.created_at.timestamp(),
            metadata: Metadata::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    pub annotations: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextContent,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: TextContent {
                value: value.into(),
                annotations: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub thread_id: String,
    pub role: String,
    pub content: Vec<MessageContent>,
    pub assistant_id: String,
    pub run_id: Option<String>,
    pub file_ids: Vec<String>,
    pub metadata: Metadata,
}

impl ThreadMessage {
    /// Render a stored message; `assistant_id` comes from the owning agent.
    pub fn from_message(message: &Message, assistant_id: &str) -> Self {
        Self {
            id: message.id.to_string(),
            object: "thread.message".into(),
            created_at: message.created_at.timestamp(),
            thread_id: message.agent_id.to_string(),
            role: message.role.as_str().to_string(),
            content: vec![MessageContent::text(message.content.clone())],
            assistant_id: assistant_id.to_string(),
            run_id: None,
            file_ids: Vec::new(),
            metadata: message.metadata.clone(),
        }
    }

    /// The text of the single content block.
    pub fn text(&self) -> &str {
        self.content
            .first()
            .map(|c| c.text.value.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<ThreadMessage>,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: String,
    pub expires_at: i64,
    pub model: String,
    pub instructions: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
