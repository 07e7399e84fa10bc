//! # freedom-core: Pure Business Logic for Freedom POS
//!
//! Everything in this crate is a pure function or a plain data type.
//! Database access lives in `freedom-db`; the process entry point,
//! configuration and printing live in the backend app.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Freedom POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Desktop UI (out of process)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON command bridge                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Backend (apps/backend)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ freedom-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types · money · checkout · validation · report · receipt     │   │
//! │  │   barcode                                                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  freedom-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Refund, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`checkout`] - Turns priced lines into a `NewSale`
//! - [`report`] - Report periods and aggregate result types
//! - [`receipt`] - Invoice assembly and fixed-width receipt rendering
//! - [`barcode`] - EAN-13 check digits and in-store codes
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use freedom_core::money::Money;
//! use freedom_core::types::TaxRate;
//!
//! let price = Money::from_cents(10000); // $100.00
//! let tax = price.calculate_tax(TaxRate::from_bps(1800)); // 18%
//! assert_eq!(tax.cents(), 1800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod checkout;
pub mod error;
pub mod money;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default low-stock threshold for new products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Default sales tax rate in basis points (18%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of line items in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Highest unit price or line discount accepted, in cents ($10,000,000.00).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_SALE_ITEMS`] this keeps every sale
/// total far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;
