//! # Harvest Tracker
//!
//! Command adapter for the Harvest Ledger: owns the tracker, serves
//! JSON-lines commands on stdin/stdout and keeps SQLite in step.
//!
//! ## Module Organization
//! ```text
//! harvest_tracker/
//! ├── lib.rs          ◄─── You are here (startup & shutdown)
//! ├── config.rs       ◄─── tracker.toml + HARVEST_* overrides
//! ├── state/
//! │   └── mod.rs      ◄─── TrackerState (shared tracker handle)
//! ├── commands/       ◄─── One module per ledger area
//! ├── ipc.rs          ◄─── JSON-lines request/response loop
//! ├── dashboard.rs    ◄─── Periodic dashboard refresh from SQLite
//! └── error.rs        ◄─── ApiError, ConfigError
//! ```
//!
//! stdout carries responses only; logs go to stderr.

pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ipc;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use harvest_core::{DerivedUpdate, EventListener, Tracker};
use harvest_db::{Database, SqliteStore};
use tokio::io::BufReader;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::TrackerConfig;
use dashboard::DashboardRefresher;
use state::TrackerState;

/// Logs every derived update the tracker publishes.
pub struct LoggingListener;

impl EventListener for LoggingListener {
    fn on_update(&self, update: &DerivedUpdate) {
        debug!(
            event = %update.event,
            alerts = update.alerts.as_ref().map_or(0, Vec::len),
            revenue = ?update.revenue.as_ref().map(|r| r.total_revenue),
            expenses = ?update.expenses,
            "Ledger event"
        );
    }
}

/// Command-line options.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub help: bool,
    /// Unrecognised arguments, logged once tracing is up.
    pub ignored: Vec<String>,
}

impl CliArgs {
    /// Parses `--config <path>` and `--help`; anything else is collected
    /// into `ignored`.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => parsed.config_path = args.next().map(PathBuf::from),
                "--help" | "-h" => parsed.help = true,
                other => parsed.ignored.push(other.to_string()),
            }
        }
        parsed
    }
}

fn print_help() {
    eprintln!("Harvest Ledger tracker");
    eprintln!();
    eprintln!("Usage: harvest-tracker [OPTIONS]");
    eprintln!();
    eprintln!("Reads one JSON command per line on stdin, writes one JSON response per line.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Config file (default: platform config dir/tracker.toml)");
    eprintln!("  -h, --help            Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  HARVEST_CONFIG, HARVEST_DB_PATH, HARVEST_MIN_MONTHLY_REVENUE,");
    eprintln!("  HARVEST_DASHBOARD_INTERVAL, HARVEST_LOG");
}

/// Runs the tracker until stdin closes or Ctrl+C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Tracing (stderr, HARVEST_LOG / RUST_LOG)                            │
/// │  2. TrackerConfig::load (defaults → file → env)                         │
/// │  3. Database::new (WAL, migrations)                                     │
/// │  4. SqliteStore::open → Tracker::new → subscribe LoggingListener        │
/// │  5. Spawn DashboardRefresher                                            │
/// │  6. ipc::serve(stdin, stdout)                                           │
/// │                                                                         │
/// │  Shutdown: flush writer queue → stop refresher → close pool             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.help {
        print_help();
        return Ok(());
    }

    init_tracing();
    info!("Starting Harvest Ledger tracker");
    for arg in &args.ignored {
        warn!(arg = %arg, "Ignoring unknown argument");
    }

    let config = TrackerConfig::load(args.config_path)?;
    let db_config = config.db_config()?;
    info!(location = ?db_config.location, "Database path determined");

    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let store = SqliteStore::open(&db).await?;
    let mut tracker = Tracker::new(store, config.to_settings())?;
    tracker.subscribe(Arc::new(LoggingListener));
    let state = TrackerState::new(tracker);

    let refresher = DashboardRefresher::spawn(
        db.clone(),
        Duration::from_secs(config.dashboard.refresh_interval_secs),
        config.inventory.default_reorder_level,
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        served = ipc::serve(&state, stdin, stdout) => {
            if let Err(e) = served {
                error!(error = %e, "Command channel failed");
            }
        }
        _ = shutdown_signal() => {
            info!("Interrupted, shutting down");
        }
    }

    if let Err(e) = state.flush().await {
        error!(error = %e, "Some writes did not reach the database");
    }
    refresher.shutdown().await;
    db.close().await;

    info!("Tracker stopped");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `HARVEST_LOG=debug` - Show debug messages
/// - `RUST_LOG=harvest_core=trace` - Used when `HARVEST_LOG` is unset
/// - Default: `info,harvest=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("HARVEST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info,harvest=debug,sqlx=warn"));

    // a second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(?e, "Failed to install Ctrl+C handler");
        // never resolve: stdin EOF still ends the session
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_parsing() {
        let parsed = CliArgs::parse(args(&["harvest-tracker", "--config", "/tmp/t.toml"]));
        assert_eq!(parsed.config_path, Some(PathBuf::from("/tmp/t.toml")));
        assert!(!parsed.help);

        let parsed = CliArgs::parse(args(&["harvest-tracker", "-h"]));
        assert!(parsed.help);

        let parsed = CliArgs::parse(args(&["harvest-tracker", "--config"]));
        assert_eq!(parsed.config_path, None);

        let parsed = CliArgs::parse(args(&["harvest-tracker", "--verbose", "-c", "t.toml", "extra"]));
        assert_eq!(parsed.config_path, Some(PathBuf::from("t.toml")));
        assert_eq!(parsed.ignored, vec!["--verbose".to_string(), "extra".to_string()]);
    }

    #[test]
    fn test_logging_listener_accepts_updates() {
        let update = DerivedUpdate {
            event: harvest_core::LedgerEvent::Sale,
            low_stock: None,
            expenses: None,
            revenue: None,
            financial_analysis: None,
            forecasts: None,
            report: None,
            alerts: Some(Vec::new()),
        };
        LoggingListener.on_update(&update);
    }
}
