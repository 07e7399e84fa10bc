//! # Domain Types
//!
//! Core domain types used throughout Freedom POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │     Refund      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  price_cents    │◄──│  items[]        │◄──│  sale_id (FK)   │       │
//! │  │  stock          │   │  total_cents    │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  New* types are the insert payloads: no id, optional timestamp.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are SQLite autoincrement integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `18.0`.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Percentage for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Stored as lowercase text in `sales.payment_method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    StoreCredit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::StoreCredit,
    ];

    /// The stored/serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::StoreCredit => "store_credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "store_credit" => Ok(PaymentMethod::StoreCredit),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    /// Barcode (EAN-13 for in-store codes). Unique when present.
    pub barcode: Option<String>,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Quantity on hand. Negative only when `allow_negative_stock` is set.
    pub stock: i64,

    /// At or below this level the product shows up in low-stock listings.
    pub low_stock_threshold: i64,

    pub category: String,

    /// Tax-exempt products get no line tax at checkout.
    pub tax_exempt: bool,

    /// Lets a sale drive stock below zero instead of failing.
    pub allow_negative_stock: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity || self.allow_negative_stock
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }
}

/// Insert payload for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    pub category: String,
    #[serde(default)]
    pub tax_exempt: bool,
    #[serde(default)]
    pub allow_negative_stock: bool,
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl NewProduct {
    /// A taxable product with the default low-stock threshold.
    pub fn new(
        name: impl Into<String>,
        price_cents: i64,
        stock: i64,
        category: impl Into<String>,
    ) -> Self {
        NewProduct {
            name: name.into(),
            barcode: None,
            price_cents,
            stock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            category: category.into(),
            tax_exempt: false,
            allow_negative_stock: false,
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn tax_exempt(mut self, exempt: bool) -> Self {
        self.tax_exempt = exempt;
        self
    }

    pub fn allow_negative_stock(mut self, allow: bool) -> Self {
        self.allow_negative_stock = allow;
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale with its line items in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Current total. Refunds decrement this in place.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Price, discount, tax and the product name are frozen at sale time;
/// later product edits never change a stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Product name at time of sale.
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of sale.
    pub price_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// `price × quantity − discount`.
    pub subtotal_cents: i64,
    /// `subtotal + tax`.
    pub total_cents: i64,
}

/// Insert payload for a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_id: Option<i64>,
    /// Override for the sale timestamp (defaults to now).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<NewSaleItem>,
}

/// Insert payload for one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleItem {
    pub product_id: i64,
    pub quantity: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub subtotal_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Refund
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: i64,
    pub sale_id: i64,
    pub amount_cents: i64,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewRefund {
    pub sale_id: i64,
    pub amount_cents: i64,
    pub reason: String,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewRefund {
    pub fn new(sale_id: i64, amount_cents: i64, reason: impl Into<String>) -> Self {
        NewRefund {
            sale_id,
            amount_cents,
            reason: reason.into(),
            created_at: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
