//! # Sale Commands
//!
//! `createSale` takes fully priced totals from the UI; `checkout` prices
//! the lines itself with the configured tax rate. Both end in the same
//! sale transaction, followed by a receipt.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use freedom_core::checkout::Checkout;
use freedom_core::receipt::{render_receipt, Invoice};
use freedom_core::{NewSale, PaymentMethod, Sale};

use crate::error::ApiError;
use crate::printer::PrintError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineRequest {
    pub product_id: i64,
    pub quantity: i64,
    /// Applied to the product's line as a whole.
    #[serde(default)]
    pub discount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleResponse {
    pub sale_id: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub item_count: usize,
    pub receipt_printed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintReceiptResponse {
    pub sale_id: i64,
    pub receipt_printed: bool,
}

pub async fn create_sale(state: &AppState, sale: NewSale) -> Result<CreateSaleResponse, ApiError> {
    debug!(items = sale.items.len(), "create_sale command");

    let sale_id = state.db.sales().create_sale(&sale).await?;
    let receipt_printed = print_after_sale(state, sale_id).await;

    Ok(CreateSaleResponse {
        sale_id,
        subtotal_cents: sale.subtotal_cents,
        tax_cents: sale.tax_cents,
        total_cents: sale.total_cents,
        item_count: sale.items.len(),
        receipt_printed,
    })
}

/// Prices the requested lines against current product data and records
/// the sale.
pub async fn checkout(
    state: &AppState,
    lines: Vec<CheckoutLineRequest>,
    payment_method: PaymentMethod,
    customer_id: Option<i64>,
) -> Result<CreateSaleResponse, ApiError> {
    debug!(lines = lines.len(), method = %payment_method, "checkout command");

    let mut checkout = Checkout::new(state.config.tax_rate);
    for line in &lines {
        let product = state
            .db
            .products()
            .get_by_id(line.product_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", line.product_id))?;

        checkout.add(&product, line.quantity)?;
        if line.discount_cents != 0 {
            checkout.set_discount(product.id, line.discount_cents)?;
        }
    }

    let new_sale = checkout.into_new_sale(payment_method, customer_id)?;
    create_sale(state, new_sale).await
}

pub async fn get_sale(state: &AppState, id: i64) -> Result<Sale, ApiError> {
    state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))
}

pub async fn list_sales(state: &AppState, limit: u32) -> Result<Vec<Sale>, ApiError> {
    Ok(state.db.sales().list_recent(limit).await?)
}

pub async fn get_invoice(state: &AppState, sale_id: i64) -> Result<Invoice, ApiError> {
    Ok(state
        .db
        .sales()
        .invoice(sale_id, &state.config.business)
        .await?)
}

/// Reprints a receipt. Unlike the print after a sale, failures are
/// returned to the caller.
pub async fn print_receipt(state: &AppState, sale_id: i64) -> Result<PrintReceiptResponse, ApiError> {
    print(state, sale_id).await?;
    Ok(PrintReceiptResponse {
        sale_id,
        receipt_printed: true,
    })
}

async fn print(state: &AppState, sale_id: i64) -> Result<(), ApiError> {
    let invoice = get_invoice(state, sale_id).await?;
    let text = render_receipt(&invoice, state.config.receipt_width);

    // Spool writes block; keep them off the bridge loop.
    let printer = Arc::clone(&state.printer);
    tokio::task::spawn_blocking(move || printer.print(sale_id, &text))
        .await
        .map_err(|e| PrintError::Unavailable(format!("print task failed: {}", e)))??;
    info!(sale_id = sale_id, printer = state.printer.name(), "Receipt printed");
    Ok(())
}

/// The sale is already committed; a print failure only shows up in the
/// response.
async fn print_after_sale(state: &AppState, sale_id: i64) -> bool {
    match print(state, sale_id).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                sale_id = sale_id,
                printer = state.printer.name(),
                error = %e,
                "Receipt not printed"
            );
            false
        }
    }
}
