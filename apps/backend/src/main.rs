//! # Freedom POS Backend Entry Point
//!
//! ## Process Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Freedom POS Desktop                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         UI process                               │  │
//! │  │   • Checkout screen      • Reports                               │  │
//! │  │   • Refunds              • Product catalogue                     │  │
//! │  └───────────────┬──────────────────────────────▲───────────────────┘  │
//! │                  │ stdin: {"command": ...}      │ stdout: {"success":…} │
//! │                  ▼                              │                       │
//! │  ┌──────────────────────────────────────────────┴───────────────────┐  │
//! │  │                  freedom-backend (this binary)                   │  │
//! │  │  main.rs ────► calls freedom_backend::run()                      │  │
//! │  │  lib.rs ─────► logging, config, database, bridge                 │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │              SQLite database (freedom_pos.sqlite, WAL)           │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for better testability
    match freedom_backend::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Backend stopped: {}", e);
            eprintln!("freedom-backend: {}", e);
            ExitCode::FAILURE
        }
    }
}
