//! # Error Types
//!
//! Domain-specific error types for freedom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  freedom-core errors (this file)                                       │
//! │  ├── CoreError        - Checkout and pricing failures                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  freedom-db errors (separate crate)                                    │
//! │  └── DbError          - Database and transaction failures              │
//! │                                                                         │
//! │  Backend errors (apps/backend)                                         │
//! │  └── ApiError         - What the command bridge returns                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected before anything touches the database.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A checkout line refers to a product that the caller did not supply.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// The product cannot cover the requested quantity.
    ///
    /// Checkout raises this from the caller's product snapshot; the database
    /// layer raises its own variant from the conditional stock update.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Sale has more line items than allowed.
    #[error("Sale cannot have more than {max} items")]
    SaleTooLarge { max: usize },

    /// A line discount is larger than the line amount.
    #[error("Discount {discount_cents} exceeds line amount {line_cents}")]
    DiscountExceedsLine {
        discount_cents: i64,
        line_cents: i64,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write so that a rejected sale or refund never opens a
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (bad barcode, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
