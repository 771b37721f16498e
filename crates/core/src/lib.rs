//! # assistd Core
//!
//! Domain types, traits, and error definitions for the assistd agent service.
//! This crate carries no web, database, or HTTP-client dependencies; it defines the domain model
//! that all other crates implement against.
//!
//! Every collaborator (LLM provider, agent store, message store) is a trait
//! here. Implementations live in their respective crates, which keeps them
//! swappable via configuration and easy to stub in tests.

pub mod agent;
pub mod context;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefaults, AgentRecord, DEFAULT_ASSISTANT_ID};
pub use context::RequestContext;
pub use error::{AgentError, ProviderError, StoreError};
pub use message::{Message, Role};
pub use provider::{PromptMessage, Provider, ProviderRequest, ProviderResponse, Usage};
pub use store::{AgentStore, MessageStore, Order, PageQuery};
