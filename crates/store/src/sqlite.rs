//! SQLite backend for agents and message histories.
//!
//! Two tables:
//! - `agents` — one row per allocated agent
//! - `messages` — every agent's history; `seq` records append order and
//!   breaks ties between equal `created_at` values
//!
//! Timestamps are stored as integer microseconds since the Unix epoch.

use std::str::FromStr;

use assistd_core::agent::AgentRecord;
use assistd_core::error::StoreError;
use assistd_core::message::{Message, Role};
use assistd_core::store::{AgentStore, MessageStore, Order, PageQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

const MESSAGE_COLUMNS: &str = "id, agent_id, user_id, role, content, created_at, metadata";

/// SQLite-backed agent and message store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and run migrations.
    ///
    /// Accepts `sqlite://path/to/file.db` or `sqlite::memory:`.
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own database, so the pool
        // must hold exactly one connection for its whole life.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool).await?;
        info!(url, "SQLite store initialized");
        Ok(store)
    }

    /// Wrap an existing pool, running migrations first.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agents (
                id            TEXT PRIMARY KEY NOT NULL,
                user_id       TEXT NOT NULL,
                assistant_id  TEXT NOT NULL,
                model         TEXT NOT NULL,
                system_prompt TEXT NOT NULL,
                created_at    INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("agents table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_agents_user ON agents(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("agents user index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                agent_id    TEXT NOT NULL,
                user_id     TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                metadata    TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_agent_order \
             ON messages(agent_id, created_at, seq)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages order index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Position of a cursor message as `(created_at, seq)`.
    async fn cursor_position(
        &self,
        agent_id: Uuid,
        message_id: Uuid,
    ) -> Result<(i64, i64), StoreError> {
        let row = sqlx::query("SELECT created_at, seq FROM messages WHERE agent_id = ? AND id = ?")
            .bind(agent_id.to_string())
            .bind(message_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("cursor lookup: {e}")))?
            .ok_or(StoreError::CursorNotFound {
                agent_id,
                message_id,
            })?;

        let created_at: i64 = column(&row, "created_at")?;
        let seq: i64 = column(&row, "seq")?;
        Ok((created_at, seq))
    }

    fn row_to_agent(row: &SqliteRow) -> Result<AgentRecord, StoreError> {
        Ok(AgentRecord {
            id: parse_uuid(&column::<String>(row, "id")?)?,
            user_id: column(row, "user_id")?,
            assistant_id: column(row, "assistant_id")?,
            model: column(row, "model")?,
            system_prompt: column(row, "system_prompt")?,
            created_at: from_micros(column(row, "created_at")?)?,
        })
    }

    fn row_to_message(row: &SqliteRow) -> Result<Message, StoreError> {
        let role: String = column(row, "role")?;
        let role = Role::from_str(&role).map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let metadata: String = column(row, "metadata")?;
        let metadata = serde_json::from_str(&metadata)
            .map_err(|e| StoreError::QueryFailed(format!("metadata column: {e}")))?;

        Ok(Message {
            id: parse_uuid(&column::<String>(row, "id")?)?,
            agent_id: parse_uuid(&column::<String>(row, "agent_id")?)?,
            user_id: column(row, "user_id")?,
            role,
            content: column(row, "content")?,
            created_at: from_micros(column(row, "created_at")?)?,
            metadata,
        })
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StoreError::QueryFailed(format!("{name} column: {e}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::QueryFailed(format!("bad uuid '{raw}': {e}")))
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::QueryFailed(format!("timestamp out of range: {micros}")))
}

#[async_trait]
impl AgentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert_agent(&self, agent: &AgentRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO agents (id, user_id, assistant_id, model, system_prompt, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(agent.id.to_string())
        .bind(&agent.user_id)
        .bind(&agent.assistant_id)
        .bind(&agent.model)
        .bind(&agent.system_prompt)
        .bind(agent.created_at.timestamp_micros())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("insert agent: {e}")))?;
        Ok(())
    }

    async fn get_agent(&self, id: Uuid) -> Result<Option<AgentRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, assistant_id, model, system_prompt, created_at \
             FROM agents WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("get agent: {e}")))?;

        row.as_ref().map(Self::row_to_agent).transpose()
    }

    async fn count_agents(&self, user_id: &str) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("count agents: {e}")))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, messages: &[Message]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin append: {e}")))?;

        for message in messages {
            let metadata = serde_json::to_string(&message.metadata)
                .map_err(|e| StoreError::Storage(format!("metadata serialization: {e}")))?;

            sqlx::query(
                "INSERT INTO messages (id, agent_id, user_id, role, content, created_at, metadata) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(message.id.to_string())
            .bind(message.agent_id.to_string())
            .bind(&message.user_id)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(message.created_at.timestamp_micros())
            .bind(metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("insert message: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit append: {e}")))?;

        debug!(count = messages.len(), "Appended messages");
        Ok(())
    }

    async fn read_range(
        &self,
        agent_id: Uuid,
        query: &PageQuery,
    ) -> Result<Vec<Message>, StoreError> {
        let after = match query.after {
            Some(id) => Some(self.cursor_position(agent_id, id).await?),
            None => None,
        };
        let before = match query.before {
            Some(id) => Some(self.cursor_position(agent_id, id).await?),
            None => None,
        };

        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        sql.push(MESSAGE_COLUMNS)
            .push(" FROM messages WHERE agent_id = ")
            .push_bind(agent_id.to_string());

        if let Some((created_at, seq)) = after {
            sql.push(" AND (created_at, seq) > (")
                .push_bind(created_at)
                .push(", ")
                .push_bind(seq)
                .push(")");
        }
        if let Some((created_at, seq)) = before {
            sql.push(" AND (created_at, seq) < (")
                .push_bind(created_at)
                .push(", ")
                .push_bind(seq)
                .push(")");
        }

        let direction = match query.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        sql.push(format_args!(
            " ORDER BY created_at {direction}, seq {direction} LIMIT "
        ))
        .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));

        let rows = sql
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("read range: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn get(&self, agent_id: Uuid, message_id: Uuid) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE agent_id = ? AND id = ?"
        ))
        .bind(agent_id.to_string())
        .bind(message_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("get message: {e}")))?;

        row.as_ref().map(Self::row_to_message).transpose()
    }

    async fn count(&self, agent_id: Uuid) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE agent_id = ?")
            .bind(agent_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("count messages: {e}")))?;
        Ok(count as usize)
    }
}
