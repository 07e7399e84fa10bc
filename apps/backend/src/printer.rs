//! # Receipt Printing
//!
//! The boundary between the backend and whatever produces paper.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale committed ──► invoice ──► render_receipt ──► ReceiptPrinter       │
//! │                                                      │                  │
//! │                                   ┌──────────────────┴───────────┐      │
//! │                                   ▼                              ▼      │
//! │                              LogPrinter                    SpoolPrinter │
//! │                          (tracing, no device)        (receipt_<id>.txt  │
//! │                                                       in a directory a  │
//! │                                                       print agent polls)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed print never undoes a sale: the caller logs the error and
//! reports `receiptPrinted: false`.

use std::path::PathBuf;

use tracing::info;

/// Receipt printing failure.
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("Printer unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write receipt: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can print a rendered receipt.
///
/// `print` may block on files or devices. The sale commands call it on
/// tokio's blocking pool.
pub trait ReceiptPrinter: Send + Sync {
    /// Prints the rendered text of one receipt.
    fn print(&self, sale_id: i64, receipt: &str) -> Result<(), PrintError>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Writes receipts to the log instead of a device.
#[derive(Debug, Default)]
pub struct LogPrinter;

impl ReceiptPrinter for LogPrinter {
    fn print(&self, sale_id: i64, receipt: &str) -> Result<(), PrintError> {
        info!(sale_id = sale_id, lines = receipt.lines().count(), "Receipt\n{}", receipt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Drops each receipt as `receipt_<sale id>.txt` into a spool directory.
#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
}

impl SpoolPrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SpoolPrinter { dir: dir.into() }
    }

    pub fn path_for(&self, sale_id: i64) -> PathBuf {
        self.dir.join(format!("receipt_{}.txt", sale_id))
    }
}

impl ReceiptPrinter for SpoolPrinter {
    fn print(&self, sale_id: i64, receipt: &str) -> Result<(), PrintError> {
        if !self.dir.is_dir() {
            return Err(PrintError::Unavailable(format!(
                "spool directory {} does not exist",
                self.dir.display()
            )));
        }
        std::fs::write(self.path_for(sale_id), receipt)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spool_printer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let printer = SpoolPrinter::new(dir.path());

        printer.print(12, "HELLO\n").unwrap();
        let written = std::fs::read_to_string(printer.path_for(12)).unwrap();
        assert_eq!(written, "HELLO\n");
    }

    #[test]
    fn test_spool_printer_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let printer = SpoolPrinter::new(dir.path().join("offline"));

        let err = printer.print(1, "x").unwrap_err();
        assert!(matches!(err, PrintError::Unavailable(_)));
    }

    #[test]
    fn test_log_printer_always_succeeds() {
        assert!(LogPrinter.print(1, "line\n").is_ok());
    }
}
