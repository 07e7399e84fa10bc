//! # Checkout
//!
//! Turns products picked at the register into a fully priced [`NewSale`].
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Pricing                                  │
//! │                                                                         │
//! │  add(product, qty) ──► CheckoutLine (price, name, tax flag frozen)     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  subtotal = price × qty − discount                                     │
//! │  tax      = round(subtotal × rate)   (0 when product is tax-exempt)    │
//! │  total    = subtotal + tax                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  into_new_sale(payment) ──► NewSale { Σ subtotal, Σ tax, Σ total }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The header totals are always the sums of the line totals, so a sale
//! built here round-trips through the database unchanged.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewSale, NewSaleItem, PaymentMethod, Product, TaxRate};
use crate::validation::{validate_price_cents, validate_quantity};
use crate::MAX_SALE_ITEMS;

// =============================================================================
// Checkout Line
// =============================================================================

/// One product in the checkout, with its price frozen when it was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price_cents: i64,
    pub tax_exempt: bool,
    pub quantity: i64,
    pub discount_cents: i64,
}

impl CheckoutLine {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CheckoutLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            tax_exempt: product.tax_exempt,
            quantity,
            discount_cents: 0,
        }
    }

    /// `price × quantity − discount`.
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents) * self.quantity
            - Money::from_cents(self.discount_cents)
    }

    pub fn tax(&self, rate: TaxRate) -> Money {
        if self.tax_exempt {
            Money::zero()
        } else {
            self.subtotal().calculate_tax(rate)
        }
    }

    pub fn total(&self, rate: TaxRate) -> Money {
        self.subtotal() + self.tax(rate)
    }

    fn to_new_item(&self, rate: TaxRate) -> NewSaleItem {
        let subtotal = self.subtotal();
        let tax = self.tax(rate);
        NewSaleItem {
            product_id: self.product_id,
            quantity: self.quantity,
            price_cents: self.unit_price_cents,
            discount_cents: self.discount_cents,
            tax_cents: tax.cents(),
            subtotal_cents: subtotal.cents(),
            total_cents: (subtotal + tax).cents(),
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Running totals for display before the sale is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    pub line_count: usize,
    pub unit_count: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// The products being rung up, priced at a single tax rate.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again increases quantity)
/// - Quantity per line is `1..=999`
/// - At most 100 lines
/// - A line's discount never exceeds `price × quantity`
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    tax_rate: TaxRate,
    lines: Vec<CheckoutLine>,
}

impl Checkout {
    pub fn new(tax_rate: TaxRate) -> Self {
        Checkout {
            tax_rate,
            lines: Vec::new(),
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn lines(&self) -> &[CheckoutLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` of `product`, merging with an existing line.
    ///
    /// Stock is checked against the product snapshot passed in. The sale
    /// transaction re-checks it against the database when committing.
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_price_cents(product.price_cents)?;

        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        let new_qty = existing.map_or(0, |i| self.lines[i].quantity) + quantity;

        validate_quantity(new_qty)?;

        if !product.can_sell(new_qty) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                available: product.stock,
                requested: new_qty,
            });
        }

        match existing {
            Some(i) => self.lines[i].quantity = new_qty,
            None => {
                if self.lines.len() >= MAX_SALE_ITEMS {
                    return Err(CoreError::SaleTooLarge {
                        max: MAX_SALE_ITEMS,
                    });
                }
                self.lines.push(CheckoutLine::from_product(product, quantity));
            }
        }
        Ok(())
    }

    /// Sets the discount on a line, in cents off the line amount.
    pub fn set_discount(&mut self, product_id: i64, discount_cents: i64) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CoreError::ProductNotFound(product_id))?;

        let line_cents = line.unit_price_cents * line.quantity;
        if discount_cents < 0 || discount_cents > line_cents {
            return Err(CoreError::DiscountExceedsLine {
                discount_cents,
                line_cents,
            });
        }

        line.discount_cents = discount_cents;
        Ok(())
    }

    pub fn remove(&mut self, product_id: i64) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CoreError::ProductNotFound(product_id));
        }
        Ok(())
    }

    pub fn totals(&self) -> CheckoutTotals {
        let subtotal: Money = self.lines.iter().map(CheckoutLine::subtotal).sum();
        let tax: Money = self.lines.iter().map(|l| l.tax(self.tax_rate)).sum();
        CheckoutTotals {
            line_count: self.lines.len(),
            unit_count: self.lines.iter().map(|l| l.quantity).sum(),
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: (subtotal + tax).cents(),
        }
    }

    /// Produces the insert payload for the sale transaction.
    pub fn into_new_sale(
        self,
        payment_method: PaymentMethod,
        customer_id: Option<i64>,
    ) -> CoreResult<NewSale> {
        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let totals = self.totals();
        let items = self
            .lines
            .iter()
            .map(|l| l.to_new_item(self.tax_rate))
            .collect();

        Ok(NewSale {
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method,
            customer_id,
            created_at: None,
            items,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: format!("Product {}", id),
            barcode: None,
            price_cents,
            stock,
            low_stock_threshold: 10,
            category: "General".to_string(),
            tax_exempt: false,
            allow_negative_stock: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_single_line_eighteen_percent() {
        let mut checkout = Checkout::new(TaxRate::from_bps(1800));
        checkout.add(&product(7, 100, 5), 1).unwrap();

        let sale = checkout.into_new_sale(PaymentMethod::Cash, None).unwrap();
        assert_eq!(sale.subtotal_cents, 100);
        assert_eq!(sale.tax_cents, 18);
        assert_eq!(sale.total_cents, 118);
        assert_eq!(sale.items[0].total_cents, 118);
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut checkout = Checkout::new(TaxRate::zero());
        let p = product(1, 250, 10);
        checkout.add(&p, 2).unwrap();
        checkout.add(&p, 3).unwrap();

        assert_eq!(checkout.lines().len(), 1);
        assert_eq!(checkout.lines()[0].quantity, 5);
        assert_eq!(checkout.totals().subtotal_cents, 1250);
    }

    #[test]
    fn test_discount_and_tax_exempt() {
        let mut checkout = Checkout::new(TaxRate::from_bps(1800));
        let mut bread = product(2, 300, 10);
        bread.tax_exempt = true;

        checkout.add(&product(1, 1000, 10), 2).unwrap();
        checkout.add(&bread, 1).unwrap();
        checkout.set_discount(1, 500).unwrap();

        let totals = checkout.totals();
        assert_eq!(totals.subtotal_cents, 1500 + 300);
        assert_eq!(totals.tax_cents, 270);
        assert_eq!(totals.total_cents, 2070);

        assert!(matches!(
            checkout.set_discount(1, 5000),
            Err(CoreError::DiscountExceedsLine { .. })
        ));
    }

    #[test]
    fn test_snapshot_stock_check() {
        let mut checkout = Checkout::new(TaxRate::zero());
        let p = product(3, 100, 1);
        assert!(matches!(
            checkout.add(&p, 2),
            Err(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        let mut oversellable = p.clone();
        oversellable.allow_negative_stock = true;
        assert!(checkout.add(&oversellable, 2).is_ok());
    }

    #[test]
    fn test_price_above_ceiling_is_rejected() {
        let mut checkout = Checkout::new(TaxRate::from_bps(1800));
        let err = checkout.add(&product(4, i64::MAX / 2 + 1, 10), 2).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(checkout.is_empty());
        assert_eq!(checkout.totals().total_cents, 0);
    }

    #[test]
    fn test_empty_checkout_is_rejected() {
        let checkout = Checkout::new(TaxRate::zero());
        assert!(checkout.into_new_sale(PaymentMethod::Card, None).is_err());
    }

    #[test]
    fn test_remove_line() {
        let mut checkout = Checkout::new(TaxRate::zero());
        checkout.add(&product(1, 100, 10), 1).unwrap();
        checkout.remove(1).unwrap();
        assert!(checkout.is_empty());
        assert!(checkout.remove(1).is_err());
    }
}
