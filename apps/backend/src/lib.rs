//! # Freedom POS Backend Library
//!
//! Everything behind the desktop UI: configuration, logging, the command
//! bridge and the receipt printer boundary.
//!
//! ## Module Organization
//! ```text
//! freedom_backend/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── config.rs       ◄─── FREEDOM_* environment configuration
//! ├── state.rs        ◄─── AppState shared by all commands
//! ├── bridge.rs       ◄─── JSON-lines request/response loop
//! ├── printer.rs      ◄─── ReceiptPrinter trait, log and spool printers
//! ├── commands/       ◄─── One module per command group
//! └── error.rs        ◄─── API error type and codes
//! ```

pub mod bridge;
pub mod commands;
pub mod config;
pub mod error;
pub mod printer;
pub mod state;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use freedom_db::Database;
use state::AppState;

/// Runs the backend until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Backend Startup                                   │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • FREEDOM_* environment variables                                   │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  4. Serve Commands ───────────────────────────────────────────────────► │
/// │     • stdin → bridge → stdout                                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Freedom POS backend");

    let config = AppConfig::load()?;
    let receipts = match config.receipt_dir {
        Some(_) => "spool",
        None => "log",
    };
    info!(
        db_path = %config.db_path.display(),
        tax_rate_bps = config.tax_rate.bps(),
        receipts = receipts,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()).await?;
    info!("Database connected and migrations applied");

    let state = AppState::new(db, config);

    bridge::serve(
        &state,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    state.db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=freedom_db=debug` - Statement-level logs for the database only
/// - Default: INFO level
///
/// Logs go to stderr; stdout carries bridge responses only.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
