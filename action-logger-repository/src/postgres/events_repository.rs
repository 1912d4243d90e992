//! PostgreSQL implementation of the events repository.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`; every operation holds a pooled
//!   connection only for its own duration
//! - Idempotent schema migration issued lazily before the first query
//! - Natural-key deduplication with `ON CONFLICT DO NOTHING`
//!
//! ## Database Tables
//!
//! - `events`: logged actions mirrored from the `EventLogger` contract
use async_trait::async_trait;
use action_logger_shared::types::{encode_address, ActionEvent, NewActionEvent};
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;
use crate::{ColumnInfo, EventsRepository, EventsRepositoryError};

/// Schema statements, shared with the SQLx migrations so tests and the lazy
/// migration create the same table.
const SCHEMA_SQL: &str = include_str!("migrations/0001_create_events.sql");

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    user_address: String,
    action: String,
    created_at: DateTime<Utc>,
    block_timestamp: Option<DateTime<Utc>>,
    tx_hash: Option<String>,
    log_index: Option<i64>,
}

impl From<EventRow> for ActionEvent {
    fn from(row: EventRow) -> Self {
        ActionEvent {
            id: row.id,
            user_address: row.user_address,
            action: row.action,
            created_at: row.created_at,
            block_timestamp: row.block_timestamp,
            tx_hash: row.tx_hash,
            log_index: row.log_index,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
}

/// PostgreSQL implementation of the events repository.
pub struct PostgresEventsRepository {
    pool: sqlx::PgPool,
    schema_ready: OnceCell<()>,
}

impl PostgresEventsRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool; the schema is created on first use
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresEventsRepository)` - Ready-to-use repository instance
    /// * `Err(EventsRepositoryError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, EventsRepositoryError> {
        Ok(Self {
            pool,
            schema_ready: OnceCell::new(),
        })
    }

    async fn apply_schema(&self) -> Result<(), EventsRepositoryError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        debug!("events schema ensured");
        Ok(())
    }

    /// Runs the idempotent schema migration once per repository instance.
    async fn ensure_schema_once(&self) -> Result<(), EventsRepositoryError> {
        self.schema_ready
            .get_or_try_init(|| self.apply_schema())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventsRepository for PostgresEventsRepository {
    async fn recent_events(&self, limit: i64) -> Result<Vec<ActionEvent>, EventsRepositoryError> {
        self.ensure_schema_once().await?;

        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id::BIGINT AS id,
                   COALESCE(user_address, '') AS user_address,
                   COALESCE(action, '') AS action,
                   COALESCE(created_at::TIMESTAMPTZ, NOW()) AS created_at,
                   block_timestamp::TIMESTAMPTZ AS block_timestamp,
                   tx_hash,
                   log_index
            FROM events
            ORDER BY COALESCE(block_timestamp, created_at) DESC NULLS LAST, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActionEvent::from).collect())
    }

    async fn insert_event(&self, event: &NewActionEvent) -> Result<bool, EventsRepositoryError> {
        self.ensure_schema_once().await?;

        let log_index = event
            .log_index
            .map(|index| i64::try_from(index).map_err(|_| EventsRepositoryError::InvalidLogIndex(index)))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO events (user_address, action, created_at, block_timestamp, tx_hash, log_index)
            VALUES ($1, $2, NOW(), $3, $4, $5)
            ON CONFLICT (tx_hash, log_index) WHERE tx_hash IS NOT NULL AND log_index IS NOT NULL
            DO NOTHING
            "#,
        )
        .bind(encode_address(&event.user))
        .bind(&event.action)
        .bind(event.block_timestamp)
        .bind(event.tx_hash.map(|hash| format!("0x{}", hex::encode(hash.as_slice()))))
        .bind(log_index)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ensure_schema(&self) -> Result<(), EventsRepositoryError> {
        self.apply_schema().await
    }

    async fn prune_events_without_block_timestamp(&self) -> Result<u64, EventsRepositoryError> {
        self.ensure_schema_once().await?;

        let result = sqlx::query("DELETE FROM events WHERE block_timestamp IS NULL")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, EventsRepositoryError> {
        let rows = sqlx::query_as::<_, ColumnRow>(
            r#"
            SELECT column_name::TEXT AS column_name, data_type::TEXT AS data_type
            FROM information_schema.columns
            WHERE table_name = 'events'
            ORDER BY ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ColumnInfo {
                column_name: row.column_name,
                data_type: row.data_type,
            })
            .collect())
    }
}
