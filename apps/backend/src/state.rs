//! # Application State
//!
//! Everything a command handler needs, built once at startup.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool`, which is safe to share. The
//! configuration is read-only after startup. Printers are `Send + Sync`.

use std::sync::Arc;

use freedom_db::Database;

use crate::config::AppConfig;
use crate::printer::{LogPrinter, ReceiptPrinter, SpoolPrinter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub printer: Arc<dyn ReceiptPrinter>,
}

impl AppState {
    /// Picks the printer from the configuration: a spool directory when
    /// `receipt_dir` is set, the log otherwise.
    pub fn new(db: Database, config: AppConfig) -> Self {
        let printer: Arc<dyn ReceiptPrinter> = match &config.receipt_dir {
            Some(dir) => Arc::new(SpoolPrinter::new(dir.clone())),
            None => Arc::new(LogPrinter),
        };
        AppState { db, config, printer }
    }

    pub fn with_printer(mut self, printer: Arc<dyn ReceiptPrinter>) -> Self {
        self.printer = printer;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("config", &self.config)
            .field("printer", &self.printer.name())
            .finish()
    }
}
