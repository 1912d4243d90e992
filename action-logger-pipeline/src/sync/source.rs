use action_logger_shared::contract::{ActionLogged, EventLogger};
use alloy::primitives::Address;
use alloy::providers::DynProvider;
use alloy::rpc::types::Log;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

use super::{ActionEventSource, ObservedAction};
use crate::block_time::block_timestamp;
use crate::errors::ChainError;

/// Follows `ActionLogged` logs of one contract through an alloy filter poller.
#[derive(Clone)]
pub struct AlloyEventSource {
    provider: DynProvider,
    address: Address,
}

impl AlloyEventSource {
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }
}

/// Decodes a log, reading the block header when the log has no timestamp.
async fn observe(provider: &DynProvider, event: ActionLogged, log: &Log) -> ObservedAction {
    let mut observed = ObservedAction::from_log(event, log);
    if observed.block_timestamp.is_none() {
        observed.block_timestamp = block_timestamp(provider, None, log.block_number).await;
    }
    observed
}

#[async_trait]
impl ActionEventSource for AlloyEventSource {
    async fn subscribe(
        &self,
    ) -> Result<BoxStream<'static, Result<ObservedAction, ChainError>>, ChainError> {
        let contract = EventLogger::new(self.address, self.provider.clone());
        let poller = contract.ActionLogged_filter().watch().await?;

        let provider = self.provider.clone();
        let stream = poller.into_stream().then(move |item| {
            let provider = provider.clone();
            async move {
                let (event, log) = item.map_err(|e| ChainError::Transport(e.to_string()))?;
                Ok::<_, ChainError>(observe(&provider, event, &log).await)
            }
        });
        Ok(stream.boxed())
    }
}
