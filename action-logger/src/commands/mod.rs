//! Handlers for the CLI subcommands.
//!
//! Command output meant for the user goes to stdout; everything else is
//! logged through `tracing`.
mod deploy;
mod feed;
mod maintenance;
mod render;
mod run;
mod session;
mod write;

pub use deploy::deploy;
pub use feed::feed;
pub use maintenance::maintenance;
pub use render::{format_event, relative_time, FeedPrinter};
pub use run::run;
pub use session::{connect, status};
pub use write::log;
