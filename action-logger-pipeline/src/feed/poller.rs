//! Fixed-interval polling of the event feed.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::EventFeed;
use crate::errors::FeedError;

/// Handle to the polling task. Stopping or dropping it clears the interval.
pub struct FeedPoller {
    handle: Option<JoinHandle<()>>,
}

impl FeedPoller {
    pub(super) fn spawn(feed: Arc<EventFeed>, poll_interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(FeedError::Configuration(reason)) = feed.refresh().await {
                    warn!(reason = %reason, "Feed is not configured, polling stopped");
                    break;
                }
            }
        });

        info!(poll_interval_ms = poll_interval.as_millis() as u64, "Feed polling started");
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for FeedPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
