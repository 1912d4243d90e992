use action_logger_pipeline::feed::MISSING_DATABASE_URL;
use tracing::info;

use crate::config::Dependencies;
use crate::errors::AppError;

/// Brings the events table up to date, prints its columns and optionally
/// deletes rows that carry no chain timestamp.
pub async fn maintenance(deps: &Dependencies, prune: bool) -> Result<(), AppError> {
    let repository = deps
        .repository
        .as_ref()
        .ok_or_else(|| AppError::config(MISSING_DATABASE_URL))?;

    repository.ensure_schema().await?;
    info!("Events schema is up to date");

    println!("Table structure:");
    for column in repository.describe_columns().await? {
        println!("  - {}: {}", column.column_name, column.data_type);
    }

    if prune {
        let deleted = repository.prune_events_without_block_timestamp().await?;
        println!("Deleted {deleted} rows without block_timestamp");
    }
    Ok(())
}
