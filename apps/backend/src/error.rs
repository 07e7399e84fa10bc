//! # API Error Type
//!
//! Unified error type for bridge commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Freedom POS                            │
//! │                                                                         │
//! │  UI process                  Backend                                    │
//! │  ──────────                  ───────                                    │
//! │                                                                         │
//! │  {"command":"createSale",...}                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler → Result<T, ApiError>                           │  │
//! │  │         │                                                        │  │
//! │  │  DbError::InsufficientStock ──┐                                  │  │
//! │  │  DbError::QueryFailed ────────┼──► ApiError { code, message }    │  │
//! │  │  CoreError::Validation ───────┘        (details logged)          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  {"success":false,"code":"INSUFFICIENT_STOCK","message":"..."}          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried. A failed sale or refund was rolled back in full, so
//! the UI can show the message and let the cashier try again.

use serde::Serialize;

use freedom_core::{CoreError, ValidationError};
use freedom_db::DbError;

use crate::printer::PrintError;

/// Failure of a bridge command. Its fields become the failure envelope:
/// ```json
/// {
///   "success": false,
///   "code": "NOT_FOUND",
///   "message": "Sale not found: 42"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Shown to the cashier as-is.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// A sale asked for more than a product has on hand.
    InsufficientStock,
    /// The line was not JSON or not a known command.
    InvalidRequest,
    /// Storage failed; details are in the log only.
    DatabaseError,
    PrinterError,
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

fn insufficient_stock(product_id: i64, available: i64, requested: i64) -> ApiError {
    ApiError::new(
        ErrorCode::InsufficientStock,
        format!(
            "Insufficient stock for product {}: {} available, {} requested",
            product_id, available, requested
        ),
    )
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::InsufficientStock {
                product_id,
                available,
                requested,
            } => insufficient_stock(product_id, available, requested),
            DbError::UniqueViolation { field, value } => ApiError::validation(format!(
                "{} '{}' is already taken",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Validation(e) => ApiError::from(e),
            DbError::MalformedRow { entity, reason } => {
                tracing::error!(entity = %entity, "Malformed row: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Stored data is corrupt")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => insufficient_stock(product_id, available, requested),
            CoreError::SaleTooLarge { .. } | CoreError::DiscountExceedsLine { .. } => {
                ApiError::validation(err.to_string())
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PrintError> for ApiError {
    fn from(err: PrintError) -> Self {
        ApiError::new(ErrorCode::PrinterError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_error_keeps_details() {
        let err = ApiError::from(DbError::InsufficientStock {
            product_id: 7,
            available: 0,
            requested: 2,
        });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("product 7"));
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error at page 12".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let err = ApiError::not_found("Sale", 42);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sale not found: 42");
    }

    #[test]
    fn test_validation_passes_through() {
        let err = ApiError::from(DbError::Validation(ValidationError::Required {
            field: "reason".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
