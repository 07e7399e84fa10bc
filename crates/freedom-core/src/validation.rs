//! # Validation Module
//!
//! Input validation for the write paths of Freedom POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command bridge (apps/backend)                                │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rules, checked before a transaction is opened           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK / UNIQUE constraints                             │
//! │  ├── Foreign keys (sale → customer, item → product)                    │
//! │  └── Conditional stock update                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use freedom_core::validation::{validate_new_refund, validate_quantity};
//! use freedom_core::types::NewRefund;
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_new_refund(&NewRefund::new(1, 50, "")).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewCustomer, NewProduct, NewRefund, NewSale};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_BARCODE_LEN: usize = 50;
const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ```rust
/// use freedom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Flat White").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_NAME_LEN)
}

/// Validates a barcode as stored on a product.
///
/// Vendor codes come in many symbologies, so only the character set and
/// length are checked here; EAN-13 checksums live in [`crate::barcode`].
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a refund reason.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    required_text("reason", reason, MAX_REASON_LEN)
}

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ```rust
/// use freedom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    bounded_cents("price", cents)
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

fn bounded_cents(field: &str, value: i64) -> ValidationResult<()> {
    non_negative(field, value)?;
    if value > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a product insert payload.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    if let Some(barcode) = &product.barcode {
        validate_barcode(barcode)?;
    }
    validate_price_cents(product.price_cents)?;
    non_negative("low_stock_threshold", product.low_stock_threshold)?;
    required_text("category", &product.category, MAX_NAME_LEN)?;
    Ok(())
}

/// Validates a customer insert payload.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    required_text("name", &customer.name, MAX_NAME_LEN)
}

/// Validates a sale before the sale transaction opens.
///
/// ## Rules
/// - At least one item, at most MAX_SALE_ITEMS (100)
/// - Every quantity in `1..=999`
/// - Prices and discounts in `0..=MAX_PRICE_CENTS`
///
/// Header totals are taken as given; `checkout` is what computes them.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    if sale.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if sale.items.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    for (idx, item) in sale.items.iter().enumerate() {
        validate_quantity(item.quantity).map_err(|e| indexed(e, idx))?;
        bounded_cents("price_cents", item.price_cents).map_err(|e| indexed(e, idx))?;
        bounded_cents("discount_cents", item.discount_cents).map_err(|e| indexed(e, idx))?;
    }

    Ok(())
}

/// Validates a refund before the refund transaction opens.
pub fn validate_new_refund(refund: &NewRefund) -> ValidationResult<()> {
    if refund.amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount_cents".to_string(),
        });
    }
    validate_reason(&refund.reason)
}

/// Prefixes the field with the item index, `items[2].quantity`.
fn indexed(err: ValidationError, idx: usize) -> ValidationError {
    let prefix = |field: String| format!("items[{}].{}", idx, field);
    match err {
        ValidationError::Required { field } => ValidationError::Required {
            field: prefix(field),
        },
        ValidationError::TooLong { field, max } => ValidationError::TooLong {
            field: prefix(field),
            max,
        },
        ValidationError::OutOfRange { field, min, max } => ValidationError::OutOfRange {
            field: prefix(field),
            min,
            max,
        },
        ValidationError::MustBePositive { field } => ValidationError::MustBePositive {
            field: prefix(field),
        },
        ValidationError::MustNotBeNegative { field } => ValidationError::MustNotBeNegative {
            field: prefix(field),
        },
        ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
            field: prefix(field),
            reason,
        },
        ValidationError::NotAllowed { field, allowed } => ValidationError::NotAllowed {
            field: prefix(field),
            allowed,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewSaleItem, PaymentMethod};

    fn item(quantity: i64, discount_cents: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: 7,
            quantity,
            price_cents: 10000,
            discount_cents,
            tax_cents: 1800,
            subtotal_cents: 10000,
            total_cents: 11800,
        }
    }

    fn sale(items: Vec<NewSaleItem>) -> NewSale {
        NewSale {
            subtotal_cents: 10000,
            tax_cents: 1800,
            total_cents: 11800,
            payment_method: PaymentMethod::Cash,
            customer_id: None,
            created_at: None,
            items,
        }
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Flat White").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("2000000000015").is_ok());
        assert!(validate_barcode("ABC-123").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("has space").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_new_sale() {
        assert!(validate_new_sale(&sale(vec![item(1, 0)])).is_ok());

        let err = validate_new_sale(&sale(vec![])).unwrap_err();
        assert_eq!(err.field(), "items");

        let err = validate_new_sale(&sale(vec![item(1, 0), item(0, 0)])).unwrap_err();
        assert_eq!(err.field(), "items[1].quantity");

        let err = validate_new_sale(&sale(vec![item(1, -5)])).unwrap_err();
        assert_eq!(err.field(), "items[0].discount_cents");

        let mut pricey = item(2, 0);
        pricey.price_cents = i64::MAX / 2 + 1;
        let err = validate_new_sale(&sale(vec![pricey])).unwrap_err();
        assert_eq!(err.field(), "items[0].price_cents");
    }

    #[test]
    fn test_validate_price_cents_bounds() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price_cents(MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_price_cents(i64::MAX / 2 + 1).is_err());
    }

    #[test]
    fn test_validate_new_refund() {
        assert!(validate_new_refund(&NewRefund::new(1, 50, "damaged")).is_ok());
        assert!(validate_new_refund(&NewRefund::new(1, 0, "damaged")).is_err());
        assert!(validate_new_refund(&NewRefund::new(1, 50, "   ")).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let product = NewProduct::new("Latte", 450, 20, "Drinks");
        assert!(validate_new_product(&product).is_ok());

        let product = NewProduct::new("Latte", -1, 20, "Drinks");
        assert!(validate_new_product(&product).is_err());

        let product = NewProduct::new("Latte", 450, 20, "");
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1800).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}
