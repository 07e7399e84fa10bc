//! # Money Module
//!
//! Monetary values are integer cents everywhere: in line items, sale
//! headers, refunds and report aggregates. The storage layer persists the
//! same integers in `*_cents` columns, so a sale read back from SQLite is
//! bit-for-bit what was written.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_cents × quantity − discount_cents = line subtotal               │
//! │  line subtotal × tax rate (bps)          = line tax (rounded half-up)  │
//! │  Σ line subtotal + Σ line tax            = sale total                  │
//! │  sale total − Σ refunds                  = stored sale total           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use freedom_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price * 3;                // $32.97
//! assert_eq!(line.cents(), 3297);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use ts_rs::TS;

use crate::types::TaxRate;

/// A signed amount in cents.
///
/// Refunds can push a stored sale total below zero, so negative values are
/// ordinary. Arithmetic saturates at the `i64` bounds; validation caps
/// prices at [`crate::MAX_PRICE_CENTS`] so real sales never get there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Tax on this amount, rounded half away from zero.
    ///
    /// ```rust
    /// use freedom_core::money::Money;
    /// use freedom_core::types::TaxRate;
    ///
    /// let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.cents(), 83); // 82.5
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128: price × bps overflows i64 long before any real till does
        let scaled = i128::from(self.0) * i128::from(rate.bps());
        let half = if scaled < 0 { -5_000 } else { 5_000 };
        let cents = (scaled + half) / 10_000;
        Money(i64::try_from(cents).unwrap_or(if cents < 0 { i64::MIN } else { i64::MAX }))
    }
}

/// `$10.99`, `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Unit price × quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
