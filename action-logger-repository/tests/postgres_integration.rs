//! Integration tests for the PostgreSQL events repository.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `cargo test --test postgres_integration`

use action_logger_repository::{EventsRepository, PostgresEventsRepository};
use action_logger_shared::types::NewActionEvent;
use alloy::hex::FromHex;
use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use sqlx::Row;

fn make_user() -> Address {
    Address::from_hex("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").unwrap()
}

fn make_tx_hash() -> TxHash {
    TxHash::from_hex("0x5427daee8d03277f8a30ea881692c04861e692ce5f305b7a689b76248cae63c4").unwrap()
}

fn at(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

// ============================================================================
// Insert Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_then_read_back(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let user = Address::from_hex("0xabc0000000000000000000000000000000001234").unwrap();

    let inserted = repository
        .insert_event(&NewActionEvent::new(user, "Hello Wave 5"))
        .await
        .unwrap();
    assert!(inserted);

    let events = repository.recent_events(50).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_address, "0xabc0000000000000000000000000000000001234");
    assert_eq!(events[0].action, "Hello Wave 5");
    assert!(events[0].block_timestamp.is_none());
    assert!(events[0].tx_hash.is_none());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_stores_lowercase_address(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    repository
        .insert_event(&NewActionEvent::new(make_user(), "gm"))
        .await
        .unwrap();

    let row = sqlx::query("SELECT user_address FROM events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(
        row.get::<String, _>("user_address"),
        "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
    );
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_same_log_key_is_idempotent(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let event = NewActionEvent::new(make_user(), "once")
        .with_block_timestamp(at(1_755_182_913))
        .with_log_key(make_tx_hash(), Some(0));

    assert!(repository.insert_event(&event).await.unwrap());
    assert!(!repository.insert_event(&event).await.unwrap());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_without_log_key_is_never_deduplicated(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let event = NewActionEvent::new(make_user(), "twice");

    assert!(repository.insert_event(&event).await.unwrap());
    assert!(repository.insert_event(&event).await.unwrap());

    let events = repository.recent_events(50).await.unwrap();
    assert_eq!(events.len(), 2);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_same_tx_different_log_index(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let first = NewActionEvent::new(make_user(), "first").with_log_key(make_tx_hash(), Some(0));
    let second = NewActionEvent::new(make_user(), "second").with_log_key(make_tx_hash(), Some(1));

    assert!(repository.insert_event(&first).await.unwrap());
    assert!(repository.insert_event(&second).await.unwrap());
}

// ============================================================================
// Read Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_recent_events_prefers_block_timestamp(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();

    repository
        .insert_event(&NewActionEvent::new(make_user(), "old chain").with_block_timestamp(at(1_000)))
        .await
        .unwrap();
    repository
        .insert_event(&NewActionEvent::new(make_user(), "new chain").with_block_timestamp(at(2_000)))
        .await
        .unwrap();
    repository
        .insert_event(&NewActionEvent::new(make_user(), "no chain"))
        .await
        .unwrap();

    let events = repository.recent_events(50).await.unwrap();
    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
    // Without a chain timestamp the row falls back to NOW(), which is newer than both.
    assert_eq!(actions, vec!["no chain", "new chain", "old chain"]);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_recent_events_respects_limit(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    for i in 0..60 {
        repository
            .insert_event(&NewActionEvent::new(make_user(), format!("action {i}")))
            .await
            .unwrap();
    }

    let events = repository.recent_events(50).await.unwrap();
    assert_eq!(events.len(), 50);
    assert_eq!(events[0].action, "action 59");
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_recent_events_is_stable_between_reads(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    for i in 0..5 {
        repository
            .insert_event(&NewActionEvent::new(make_user(), format!("action {i}")))
            .await
            .unwrap();
    }

    let first = repository.recent_events(50).await.unwrap();
    let second = repository.recent_events(50).await.unwrap();
    assert_eq!(first, second);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_recent_events_on_empty_table(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let events = repository.recent_events(50).await.unwrap();
    assert!(events.is_empty());
}

// ============================================================================
// Schema and Maintenance Tests
// ============================================================================

#[sqlx::test]
async fn test_schema_created_lazily_on_first_read(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let events = repository.recent_events(50).await.unwrap();
    assert!(events.is_empty());

    let columns = repository.describe_columns().await.unwrap();
    assert!(columns.iter().any(|c| c.column_name == "block_timestamp"));
}

#[sqlx::test]
async fn test_schema_adds_missing_columns_to_legacy_table(pool: sqlx::PgPool) {
    sqlx::raw_sql(
        "CREATE TABLE events (
            id SERIAL PRIMARY KEY,
            user_address TEXT NOT NULL,
            action TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO events (user_address, action) VALUES ('0xabc', 'legacy')")
        .execute(&pool)
        .await
        .unwrap();

    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    let events = repository.recent_events(50).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "legacy");

    let names: Vec<String> = repository
        .describe_columns()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.column_name)
        .collect();
    assert!(names.contains(&"block_timestamp".to_string()));
    assert!(names.contains(&"tx_hash".to_string()));
    assert!(names.contains(&"log_index".to_string()));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_ensure_schema_is_idempotent(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    repository.ensure_schema().await.unwrap();
    repository.ensure_schema().await.unwrap();
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_prune_events_without_block_timestamp(pool: sqlx::PgPool) {
    let repository = PostgresEventsRepository::new(pool.clone()).await.unwrap();
    repository
        .insert_event(&NewActionEvent::new(make_user(), "keep").with_block_timestamp(at(1_000)))
        .await
        .unwrap();
    repository
        .insert_event(&NewActionEvent::new(make_user(), "drop 1"))
        .await
        .unwrap();
    repository
        .insert_event(&NewActionEvent::new(make_user(), "drop 2"))
        .await
        .unwrap();

    let deleted = repository.prune_events_without_block_timestamp().await.unwrap();
    assert_eq!(deleted, 2);

    let events = repository.recent_events(50).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "keep");
}
