//! # System Commands

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupResponse {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub database: bool,
    pub migrations_total: usize,
    pub migrations_applied: usize,
    pub version: String,
}

/// Snapshots the database into the configured backup directory.
pub async fn backup(state: &AppState) -> Result<BackupResponse, ApiError> {
    let path = state.db.backup(&state.config.backup_dir).await?;
    Ok(BackupResponse {
        path: path.display().to_string(),
    })
}

pub async fn health(state: &AppState) -> Result<HealthResponse, ApiError> {
    let database = state.db.health_check().await;
    let (migrations_total, migrations_applied) = state.db.migration_status().await?;

    Ok(HealthResponse {
        database,
        migrations_total,
        migrations_applied,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
