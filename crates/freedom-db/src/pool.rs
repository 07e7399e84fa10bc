//! # Database Handle
//!
//! One [`Database`] per process, cloned into whatever needs storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        freedom_pos.sqlite (WAL)                         │
//! │                                                                         │
//! │   checkout ──► db.sales().create_sale()  ─┐                             │
//! │   refund   ──► db.refunds().create_refund()├─► one writer at a time     │
//! │   catalogue──► db.products().adjust_stock()┘   (others wait on the     │
//! │                                                 busy timeout)          │
//! │                                                                         │
//! │   reports  ──► db.reports().*  ────────────► readers never block       │
//! │                                                                         │
//! │   db.backup(dir) ──► VACUUM INTO freedom_pos_backup_<stamp>.sqlite     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tests build a private database with [`DbConfig::in_memory`]; nothing is
//! shared between two in-memory handles.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::refund::RefundRepository;
use crate::repository::report::ReportRepository;
use crate::repository::sale::SaleRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how the pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/freedom/freedom_pos.sqlite")
///     .max_connections(4)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Pool size (default 5). A single till rarely has more than a couple
    /// of statements in flight.
    pub max_connections: u32,

    /// Connections kept open while idle (default 1).
    pub min_connections: u32,

    /// How long to wait for a free pooled connection (default 30s).
    pub connect_timeout: Duration,

    /// How long a writer waits on a locked database before failing (default 5s).
    pub busy_timeout: Duration,

    /// Idle connections are closed after this long (default 10 min).
    pub idle_timeout: Duration,

    /// Apply pending migrations in [`Database::new`] (default on).
    pub run_migrations: bool,
}

impl DbConfig {
    /// File database at `path`, created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database for tests.
    ///
    /// Every call yields a fresh, isolated database. The pool holds exactly
    /// one connection that is never recycled, since closing it would drop
    /// the data.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Database
// =============================================================================

/// Pool handle with one accessor per repository.
///
/// Clones share the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    ///
    /// File databases get WAL journaling, `synchronous = NORMAL`, the busy
    /// timeout and enforced foreign keys. In-memory databases get a single
    /// connection that is never recycled.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let pool = if config.is_in_memory() {
            let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(connect_options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            let connect_options = SqliteConnectOptions::new()
                .filename(&config.database_path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                // sale_items -> products must hold; SQLite defaults this off
                .foreign_keys(true)
                .busy_timeout(config.busy_timeout)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(Some(config.idle_timeout))
                .connect_with(connect_options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        };

        info!(
            max_connections = config.max_connections,
            in_memory = config.is_in_memory(),
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Wraps an existing pool. Migrations are not run.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Database { pool }
    }

    /// Applies pending migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        debug!("Schema up to date");
        Ok(())
    }

    /// Raw pool, for tests and ad-hoc queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Returns the sale repository (sale transaction, reads, invoices).
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the refund repository (refund transaction, reads).
    pub fn refunds(&self) -> RefundRepository {
        RefundRepository::new(self.pool.clone())
    }

    /// Returns the read-only reporting queries.
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Writes a consistent copy of the database into `dir`.
    ///
    /// Uses `VACUUM INTO`, which is safe while other connections are
    /// reading or writing. The file is named
    /// `freedom_pos_backup_<YYYYmmdd_HHMMSS_mmm>.sqlite`.
    ///
    /// An in-memory database cannot be snapshotted to disk: SQLite accepts
    /// the statement but writes nothing, so a missing file is an error.
    pub async fn backup(&self, dir: impl AsRef<Path>) -> DbResult<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DbError::Internal(format!("cannot create {}: {}", dir.display(), e)))?;

        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let target = dir.join(format!("freedom_pos_backup_{}.sqlite", stamp));

        info!(target = %target.display(), "Backing up database");

        sqlx::query("VACUUM INTO ?1")
            .bind(target.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;

        if tokio::fs::metadata(&target).await.is_err() {
            return Err(DbError::Internal(format!(
                "backup wrote no file at {}",
                target.display()
            )));
        }

        Ok(target)
    }

    /// Waits for in-flight statements and closes every connection. Later
    /// calls on any clone fail.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// `(total, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
