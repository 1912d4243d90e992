//! Block timestamp lookup for receipts and logs.
use action_logger_shared::types::timestamp_from_unix;
use alloy::eips::BlockNumberOrTag;
use alloy::providers::{DynProvider, Provider};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Resolves the timestamp of the block that holds a log.
///
/// Most nodes leave `blockTimestamp` out of logs and receipts, so when the
/// log carries none the block header is read instead. A failed lookup leaves
/// the timestamp unset.
pub(crate) async fn block_timestamp(
    provider: &DynProvider,
    carried: Option<u64>,
    block_number: Option<u64>,
) -> Option<DateTime<Utc>> {
    if let Some(seconds) = carried {
        return timestamp_from_unix(seconds);
    }
    let number = block_number?;

    match provider
        .get_block_by_number(BlockNumberOrTag::Number(number))
        .await
    {
        Ok(Some(block)) => timestamp_from_unix(block.header.timestamp),
        Ok(None) => {
            warn!(block_number = number, "Block not found while resolving timestamp");
            None
        }
        Err(e) => {
            warn!(block_number = number, error = %e, "Failed to fetch block timestamp");
            None
        }
    }
}
