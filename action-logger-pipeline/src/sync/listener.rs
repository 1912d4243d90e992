use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{ActionEventSource, ObservedAction};
use crate::errors::{ChainError, SyncError};
use crate::feed::EventFeed;

/// Inserts every observed `ActionLogged` event through the feed.
///
/// At most one subscription is active per listener.
pub struct ActionListener {
    source: Option<Arc<dyn ActionEventSource>>,
    feed: Arc<EventFeed>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl ActionListener {
    /// Creates a stopped listener. `source` is `None` when no contract address is configured.
    pub fn new(source: Option<Arc<dyn ActionEventSource>>, feed: Arc<EventFeed>) -> Self {
        Self {
            source,
            feed,
            active: Mutex::new(None),
        }
    }

    /// Subscribes to contract events.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A new subscription was attached
    /// * `Ok(false)` - A subscription was already active; nothing was attached
    /// * `Err(SyncError)` - No contract configured, or the subscription failed
    pub async fn start(&self) -> Result<bool, SyncError> {
        let source = self.source.as_ref().ok_or(SyncError::ContractNotConfigured)?;

        // Held across the subscribe await so concurrent starts attach once.
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Listener already active");
            return Ok(false);
        }

        let stream = source
            .subscribe()
            .await
            .map_err(|e| SyncError::Subscribe(e.to_string()))?;
        *active = Some(tokio::spawn(forward(stream, Arc::clone(&self.feed))));

        info!("Listening for ActionLogged events");
        Ok(true)
    }

    /// Deregisters the subscription. Returns false when none was active.
    pub async fn stop(&self) -> bool {
        match self.active.lock().await.take() {
            Some(handle) => {
                handle.abort();
                info!("Listener stopped");
                true
            }
            None => false,
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ActionListener {
    fn drop(&mut self) {
        if let Some(handle) = self.active.get_mut().take() {
            handle.abort();
        }
    }
}

async fn forward(
    mut stream: BoxStream<'static, Result<ObservedAction, ChainError>>,
    feed: Arc<EventFeed>,
) {
    while let Some(item) = stream.next().await {
        let observed = match item {
            Ok(observed) => observed,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable log");
                continue;
            }
        };

        let tx_hash = observed.tx_hash;
        match feed.insert(observed.into_new_event()).await {
            Ok(true) => debug!(tx_hash = ?tx_hash, "Stored observed action"),
            Ok(false) => debug!(tx_hash = ?tx_hash, "Observed action already stored"),
            Err(e) => error!(error = %e, tx_hash = ?tx_hash, "Failed to store observed action"),
        }
    }
    info!("Event stream ended");
}
