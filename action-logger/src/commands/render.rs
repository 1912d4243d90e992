//! Text rendering of feed entries.
use std::collections::HashSet;

use action_logger_pipeline::feed::FeedState;
use action_logger_shared::types::{shorten_address, ActionEvent};
use chrono::{DateTime, Utc};

/// Human distance between `at` and `now`, e.g. "5 minutes ago".
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);
    let minutes = (seconds + 30) / 60;
    let hours = (minutes + 30) / 60;
    let days = (hours + 12) / 24;

    match seconds {
        0..45 => "less than a minute ago".to_string(),
        45..90 => "1 minute ago".to_string(),
        _ if minutes < 45 => format!("{minutes} minutes ago"),
        _ if minutes < 90 => "about 1 hour ago".to_string(),
        _ if hours < 24 => format!("about {hours} hours ago"),
        _ if days <= 1 => "1 day ago".to_string(),
        _ => format!("{days} days ago"),
    }
}

/// One feed line: shortened author, action text and age.
pub fn format_event(event: &ActionEvent, now: DateTime<Utc>) -> String {
    format!(
        "{:<13} {}  ({})",
        shorten_address(&event.user_address),
        event.action,
        relative_time(event.ordering_timestamp(), now)
    )
}

/// Turns successive feed states into the lines that changed.
pub struct FeedPrinter {
    seen: HashSet<i64>,
    primed: bool,
    last_error: Option<String>,
    initial_lines: usize,
}

impl FeedPrinter {
    /// `initial_lines` caps how many entries the first render prints.
    pub fn new(initial_lines: usize) -> Self {
        Self {
            seen: HashSet::new(),
            primed: false,
            last_error: None,
            initial_lines,
        }
    }

    pub fn render(&mut self, state: &FeedState, now: DateTime<Utc>) -> Vec<String> {
        let mut lines = Vec::new();

        if state.db_error != self.last_error {
            match &state.db_error {
                Some(error) => lines.push(format!("! Database: {error}")),
                None if self.last_error.is_some() => lines.push("Database connection restored".to_string()),
                None => {}
            }
            self.last_error = state.db_error.clone();
        }

        let unseen: Vec<&ActionEvent> = state
            .events
            .iter()
            .filter(|event| !self.seen.contains(&event.id))
            .collect();
        let shown = if self.primed {
            unseen.len()
        } else {
            unseen.len().min(self.initial_lines)
        };

        // Events arrive newest first; print oldest first so the newest ends up last.
        lines.extend(
            unseen[..shown]
                .iter()
                .rev()
                .map(|event| format_event(event, now)),
        );

        self.seen.extend(state.events.iter().map(|event| event.id));
        if !state.is_loading {
            self.primed = true;
        }
        lines
    }
}
