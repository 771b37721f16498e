//! Error types for the assistd domain, one enum per collaborator.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A pagination cursor names a message that is not part of the agent's history.
    #[error("Cursor message {message_id} not found for agent {agent_id}")]
    CursorNotFound { agent_id: Uuid, message_id: Uuid },
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not found: {0}")]
    NotFound(Uuid),

    #[error("Agent quota exceeded for user {user_id}: limit is {limit}")]
    QuotaExceeded { user_id: String, limit: usize },

    #[error("Step failed for agent {agent_id}: {source}")]
    Step {
        agent_id: Uuid,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
