//! Storage backends for agents and their message histories.

pub mod cursor;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use assistd_config::{StoreBackend, StoreConfig};
use assistd_core::error::StoreError;
use assistd_core::store::{AgentStore, MessageStore};
use tracing::info;

pub use cursor::paginate;
pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// The pair of stores an engine is built on. Both usually point at the same backend.
#[derive(Clone)]
pub struct Stores {
    pub agents: Arc<dyn AgentStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    /// Share one backend for both agents and messages.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: AgentStore + MessageStore + 'static,
    {
        Self {
            agents: store.clone(),
            messages: store,
        }
    }
}

/// Build the configured store backend.
pub async fn build_from_config(config: &StoreConfig) -> Result<Stores, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Stores::shared(Arc::new(InMemoryStore::new())))
        }
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            let store = SqliteStore::new(&config.database_url()).await?;
            Ok(Stores::shared(Arc::new(store)))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => Err(StoreError::Storage(
            "assistd was built without the `sqlite` feature".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_memory_backend() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            database_url: None,
        };
        let stores = build_from_config(&config).await.unwrap();
        assert_eq!(stores.agents.name(), "in_memory");
        assert_eq!(stores.messages.name(), "in_memory");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn builds_sqlite_backend() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            database_url: Some("sqlite::memory:".into()),
        };
        let stores = build_from_config(&config).await.unwrap();
        assert_eq!(stores.agents.name(), "sqlite");
        assert_eq!(stores.messages.name(), "sqlite");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn unreachable_database_is_a_storage_error() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            database_url: Some("sqlite:///nonexistent-dir/assistd/assistd.db".into()),
        };
        assert!(matches!(
            build_from_config(&config).await,
            Err(StoreError::Storage(_))
        ));
    }
}
