//! Backend configuration.
//!
//! Configuration is loaded from `FREEDOM_*` environment variables with
//! fallback to defaults.

use std::env;
use std::path::PathBuf;

use freedom_core::receipt::{BusinessInfo, ReceiptWidth};
use freedom_core::validation::validate_tax_rate_bps;
use freedom_core::{TaxRate, DEFAULT_TAX_RATE_BPS};
use freedom_db::DbConfig;
use serde::Serialize;

/// Backend configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Upper bound on pooled connections
    pub db_max_connections: u32,

    /// Name, address and footer printed on receipts
    pub business: BusinessInfo,

    /// Tax rate applied by the `checkout` command
    pub tax_rate: TaxRate,

    pub receipt_width: ReceiptWidth,

    /// Receipts are written here when set, otherwise logged
    pub receipt_dir: Option<PathBuf>,

    /// Destination for `backup` snapshots
    pub backup_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from("freedom_pos.sqlite"),
            db_max_connections: 5,
            business: BusinessInfo {
                name: "Freedom POS".to_string(),
                address: String::new(),
                guarantee_text: String::new(),
                custom_message: "Thank you for your visit!".to_string(),
            },
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            receipt_width: ReceiptWidth::Mm80,
            receipt_dir: None,
            backup_dir: PathBuf::from("backups"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let db_max_connections = match lookup("FREEDOM_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("FREEDOM_DB_MAX_CONNECTIONS".to_string()))?,
            None => defaults.db_max_connections,
        };

        let tax_rate = match lookup("FREEDOM_TAX_RATE_BPS") {
            Some(raw) => {
                let bps: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("FREEDOM_TAX_RATE_BPS".to_string()))?;
                validate_tax_rate_bps(bps)
                    .map_err(|_| ConfigError::InvalidValue("FREEDOM_TAX_RATE_BPS".to_string()))?;
                TaxRate::from_bps(bps)
            }
            None => defaults.tax_rate,
        };

        let receipt_width = match lookup("FREEDOM_RECEIPT_WIDTH") {
            Some(raw) => raw
                .parse::<ReceiptWidth>()
                .map_err(|_| ConfigError::InvalidValue("FREEDOM_RECEIPT_WIDTH".to_string()))?,
            None => defaults.receipt_width,
        };

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(AppConfig {
            db_path: non_empty("FREEDOM_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            db_max_connections,
            business: BusinessInfo {
                name: non_empty("FREEDOM_BUSINESS_NAME").unwrap_or(defaults.business.name),
                address: lookup("FREEDOM_BUSINESS_ADDRESS").unwrap_or(defaults.business.address),
                guarantee_text: lookup("FREEDOM_GUARANTEE_TEXT")
                    .unwrap_or(defaults.business.guarantee_text),
                custom_message: lookup("FREEDOM_RECEIPT_FOOTER")
                    .unwrap_or(defaults.business.custom_message),
            },
            tax_rate,
            receipt_width,
            receipt_dir: non_empty("FREEDOM_RECEIPT_DIR").map(PathBuf::from),
            backup_dir: non_empty("FREEDOM_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_dir),
        })
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.db_path.clone()).max_connections(self.db_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
