//! # Receipts
//!
//! Invoice assembly and plain-text receipt layout for thermal printers.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Corner Cafe                     │  centered header
//! │           12 Harbour Street                  │
//! │ ──────────────────────────────────────────── │
//! │ Sale #42                   2024-03-15 14:30  │
//! │ ──────────────────────────────────────────── │
//! │ Flat White                                   │  one block per item
//! │   2 x $4.50                            $9.00 │
//! │ ──────────────────────────────────────────── │
//! │ Subtotal                               $9.00 │
//! │ TOTAL                                 $10.62 │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Rendering is pure; sending the text to a device is the backend's job.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Sale, SaleItem};

// =============================================================================
// Paper Width
// =============================================================================

/// Thermal paper width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ReceiptWidth {
    /// 80mm paper, 48 columns.
    #[default]
    #[serde(rename = "80mm")]
    Mm80,
    /// 58mm paper, 32 columns.
    #[serde(rename = "58mm")]
    Mm58,
}

impl ReceiptWidth {
    pub const fn columns(&self) -> usize {
        match self {
            ReceiptWidth::Mm80 => 48,
            ReceiptWidth::Mm58 => 32,
        }
    }
}

impl FromStr for ReceiptWidth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "80mm" | "80" => Ok(ReceiptWidth::Mm80),
            "58mm" | "58" => Ok(ReceiptWidth::Mm58),
            _ => Err(ValidationError::NotAllowed {
                field: "receipt_width".to_string(),
                allowed: vec!["80mm".to_string(), "58mm".to_string()],
            }),
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Business identity printed on every receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    pub name: String,
    pub address: String,
    /// Warranty or return policy text.
    pub guarantee_text: String,
    /// Closing line, e.g. "Thank you for your visit!".
    pub custom_message: String,
}

/// Everything needed to print or display a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub sale_id: i64,
    pub business_name: String,
    pub business_address: String,
    /// Empty when the sale had no customer.
    pub customer_name: String,
    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub guarantee_text: String,
    pub custom_message: String,
}

impl Invoice {
    pub fn new(sale: Sale, business: &BusinessInfo, customer_name: Option<String>) -> Self {
        Invoice {
            sale_id: sale.id,
            business_name: business.name.clone(),
            business_address: business.address.clone(),
            customer_name: customer_name.unwrap_or_default(),
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            payment_method: sale.payment_method.as_str().to_string(),
            created_at: sale.created_at,
            items: sale.items,
            guarantee_text: business.guarantee_text.clone(),
            custom_message: business.custom_message.clone(),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Lays out an invoice as fixed-width text, one `\n`-terminated line each.
pub fn render_receipt(invoice: &Invoice, width: ReceiptWidth) -> String {
    let cols = width.columns();
    let rule = "-".repeat(cols);
    let mut out = String::new();

    for line in wrap(&invoice.business_name, cols) {
        push(&mut out, &center(&line, cols));
    }
    for line in wrap(&invoice.business_address, cols) {
        push(&mut out, &center(&line, cols));
    }
    push(&mut out, &rule);

    push(
        &mut out,
        &two_columns(
            &format!("Sale #{}", invoice.sale_id),
            &invoice.created_at.format("%Y-%m-%d %H:%M").to_string(),
            cols,
        ),
    );
    if !invoice.customer_name.is_empty() {
        push(&mut out, &truncate(&format!("Customer: {}", invoice.customer_name), cols));
    }
    push(&mut out, &rule);

    for item in &invoice.items {
        for line in wrap(&item.name, cols) {
            push(&mut out, &line);
        }
        let gross = Money::from_cents(item.price_cents) * item.quantity;
        push(
            &mut out,
            &two_columns(
                &format!("  {} x {}", item.quantity, Money::from_cents(item.price_cents)),
                &gross.to_string(),
                cols,
            ),
        );
        if item.discount_cents != 0 {
            push(
                &mut out,
                &two_columns(
                    "  Discount",
                    &(-Money::from_cents(item.discount_cents)).to_string(),
                    cols,
                ),
            );
        }
    }
    push(&mut out, &rule);

    push(
        &mut out,
        &two_columns("Subtotal", &Money::from_cents(invoice.subtotal_cents).to_string(), cols),
    );
    push(
        &mut out,
        &two_columns("Tax", &Money::from_cents(invoice.tax_cents).to_string(), cols),
    );
    push(
        &mut out,
        &two_columns("TOTAL", &Money::from_cents(invoice.total_cents).to_string(), cols),
    );
    push(&mut out, &truncate(&format!("Paid by: {}", invoice.payment_method), cols));

    if !invoice.guarantee_text.is_empty() || !invoice.custom_message.is_empty() {
        push(&mut out, &rule);
    }
    for line in wrap(&invoice.guarantee_text, cols) {
        push(&mut out, &line);
    }
    for line in wrap(&invoice.custom_message, cols) {
        push(&mut out, &center(&line, cols));
    }

    out
}

fn push(out: &mut String, line: &str) {
    let _ = writeln!(out, "{}", line.trim_end());
}

fn truncate(text: &str, cols: usize) -> String {
    text.chars().take(cols).collect()
}

fn center(text: &str, cols: usize) -> String {
    let len = text.chars().count();
    if len >= cols {
        return truncate(text, cols);
    }
    format!("{}{}", " ".repeat((cols - len) / 2), text)
}

/// Left text and right-aligned right text; the left side is cut to fit.
fn two_columns(left: &str, right: &str, cols: usize) -> String {
    let right_len = right.chars().count();
    let room = cols.saturating_sub(right_len + 1);
    let left = truncate(left, room);
    let gap = cols.saturating_sub(left.chars().count() + right_len);
    format!("{}{}{}", left, " ".repeat(gap.max(1)), right)
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: String = word.to_string();
        while word.chars().count() > cols {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(cols).collect();
            word = word.chars().skip(cols).collect();
            lines.push(head);
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > cols && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// =============================================================================
// Unit Tests
// =============================================================================
