//! Read path: keeps a render-ready list of the most recent logged actions.
//!
//! [`EventFeed`] publishes a [`FeedState`] through a `watch` channel. A refresh
//! replaces the list wholesale; a failed refresh never blanks out a list that
//! already holds data.
mod poller;

pub use poller::FeedPoller;

use std::sync::Arc;
use std::time::Duration;

use action_logger_repository::EventsRepository;
use action_logger_shared::types::{ActionEvent, NewActionEvent};
use tokio::sync::watch;
use tracing::{debug, error, instrument, warn};

use crate::errors::FeedError;

/// Number of rows a refresh reads.
pub const DEFAULT_FEED_LIMIT: i64 = 50;

/// Delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const MISSING_DATABASE_URL: &str = "Missing DATABASE_URL environment variable";

pub const DATABASE_UNREACHABLE: &str = "Failed to connect to database";

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub limit: i64,
    pub poll_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// What the view layer renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedState {
    pub events: Vec<ActionEvent>,
    pub is_loading: bool,
    pub db_error: Option<String>,
    pub is_connected: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            is_loading: true,
            db_error: None,
            is_connected: false,
        }
    }
}

pub struct EventFeed {
    repository: Option<Arc<dyn EventsRepository>>,
    config: FeedConfig,
    state: watch::Sender<FeedState>,
}

impl EventFeed {
    /// Creates a feed. `repository` is `None` when no connection string is configured.
    pub fn new(repository: Option<Arc<dyn EventsRepository>>, config: FeedConfig) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            repository,
            config,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.repository.is_some()
    }

    /// Reloads the most recent events.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The list was replaced, or the query failed while data was held
    /// * `Err(FeedError::Configuration)` - No connection string; retrying is pointless
    /// * `Err(FeedError::Connection)` - The query failed and there is nothing to show
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), FeedError> {
        let Some(repository) = self.repository.as_ref() else {
            self.state.send_modify(|s| {
                s.events.clear();
                s.is_loading = false;
                s.db_error = Some(MISSING_DATABASE_URL.to_string());
                s.is_connected = false;
            });
            return Err(FeedError::Configuration(MISSING_DATABASE_URL.to_string()));
        };

        match repository.recent_events(self.config.limit).await {
            Ok(events) => {
                debug!(count = events.len(), "Feed refreshed");
                let next = FeedState {
                    events,
                    is_loading: false,
                    db_error: None,
                    is_connected: true,
                };
                self.state.send_if_modified(|s| {
                    if *s == next {
                        return false;
                    }
                    *s = next;
                    true
                });
                Ok(())
            }
            Err(e) => {
                let holds_events = !self.state.borrow().events.is_empty();
                if holds_events {
                    warn!(error = %e, "Feed refresh failed, keeping held events");
                    self.state.send_if_modified(|s| std::mem::replace(&mut s.is_loading, false));
                    return Ok(());
                }

                error!(error = %e, "Feed refresh failed");
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.db_error = Some(DATABASE_UNREACHABLE.to_string());
                    s.is_connected = false;
                });
                Err(FeedError::Connection(e.to_string()))
            }
        }
    }

    /// Appends one event and refreshes right away instead of waiting for the
    /// next poll.
    ///
    /// Returns `false` when the event's natural key was already stored.
    #[instrument(skip(self, event), fields(user = %event.user))]
    pub async fn insert(&self, event: NewActionEvent) -> Result<bool, FeedError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or_else(|| FeedError::Configuration(MISSING_DATABASE_URL.to_string()))?;

        let inserted = repository.insert_event(&event).await.map_err(|e| {
            error!(error = %e, "Failed to insert event");
            FeedError::Connection(e.to_string())
        })?;

        if !inserted {
            debug!(tx_hash = ?event.tx_hash, log_index = ?event.log_index, "Event already stored");
        }

        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Refresh after insert failed");
        }
        Ok(inserted)
    }

    /// Refreshes now and then on every poll interval until the returned poller
    /// is stopped or dropped.
    pub fn spawn_polling(self: &Arc<Self>) -> FeedPoller {
        FeedPoller::spawn(Arc::clone(self), self.config.poll_interval)
    }
}
