//! # Storage Errors
//!
//! ```text
//! sqlx::Error ──────┐
//!                   ├──► DbError ──► ApiError (backend)
//! ValidationError ──┘
//! ```
//!
//! An error coming out of `create_sale` or `create_refund` means the
//! transaction rolled back and none of its writes are visible.

use freedom_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The conditional stock decrement matched no row: more requested than
    /// on hand for a product without `allow_negative_stock`, or another
    /// sale took the last units first.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Barcode already in use.
    #[error("{field} '{value}' is already taken")]
    UniqueViolation { field: String, value: String },

    /// Unknown `customer_id` on a sale, or deleting a product that sale
    /// items still reference.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A stored row could not be mapped onto its domain type.
    #[error("Malformed {entity} row: {reason}")]
    MalformedRow { entity: String, reason: String },

    /// Input rejected before any write.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error (CHECK constraint, syntax, I/O).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("No database connection available")]
    PoolExhausted,

    #[error("Database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn malformed(entity: impl Into<String>, reason: impl ToString) -> Self {
        DbError::MalformedRow {
            entity: entity.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => classify_sqlite(db_err.message()),
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::malformed(format!("column {}", index), source)
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("database is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

/// Maps SQLite's constraint messages onto variants. The unique message
/// names the column as `<table>.<column>`.
fn classify_sqlite(message: &str) -> DbError {
    if let Some(column) = message.strip_prefix("UNIQUE constraint failed: ") {
        let field = column.rsplit('.').next().unwrap_or(column);
        return DbError::UniqueViolation {
            field: field.to_string(),
            value: String::new(),
        };
    }
    if message.starts_with("FOREIGN KEY constraint failed") {
        return DbError::ForeignKeyViolation {
            message: message.to_string(),
        };
    }
    DbError::QueryFailed(message.to_string())
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = DbError::InsufficientStock {
            product_id: 7,
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 7: available 0, requested 1"
        );
    }

    #[test]
    fn test_sqlite_messages_are_classified() {
        match classify_sqlite("UNIQUE constraint failed: products.barcode") {
            DbError::UniqueViolation { field, .. } => assert_eq!(field, "barcode"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            classify_sqlite("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            classify_sqlite("CHECK constraint failed: quantity > 0"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
