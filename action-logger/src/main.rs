//! Action Logger Main Entry Point
//!
//! Connects a wallet, logs text actions through the `EventLogger` contract and
//! shows the feed of recent actions mirrored in Postgres.

use std::env;
use std::path::PathBuf;

use action_logger::{commands, AppConfig, AppError, Dependencies};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[clap(rename_all = "kebab-case", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session: log actions from stdin and follow the feed (default)
    Run,
    /// Request wallet authorization and switch to the required network
    Connect,
    /// Log a single action
    Log {
        #[arg(required = true)]
        action: Vec<String>,
    },
    /// Print the most recent actions
    Feed {
        /// Keep polling and print new actions
        #[arg(long)]
        follow: bool,
    },
    /// Show network and database status
    Status,
    /// Deploy a new EventLogger contract
    Deploy {
        /// Compiled artifact with `abi` and `bytecode`
        #[clap(env = "CONTRACT_ARTIFACT", long, default_value = "contracts/EventLogger.json")]
        artifact: PathBuf,
        /// Deploy even if CONTRACT_ADDRESS is set
        #[arg(long)]
        force: bool,
    },
    /// Update the events table schema and show its columns
    Maintenance {
        /// Delete rows without block_timestamp
        #[arg(long)]
        prune: bool,
    },
}

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("action_logger=info,action_logger_pipeline=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    info!(
        service_name = "action-logger",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let deps = match Dependencies::new(config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::run(deps).await,
        Command::Connect => commands::connect(&deps).await,
        Command::Log { action } => commands::log(&deps, &action.join(" ")).await,
        Command::Feed { follow } => commands::feed(&deps, follow).await,
        Command::Status => commands::status(&deps).await,
        Command::Deploy { artifact, force } => commands::deploy(&deps, &artifact, force).await,
        Command::Maintenance { prune } => commands::maintenance(&deps, prune).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}
