//! # Product and Customer Commands

use serde::{Deserialize, Serialize};
use tracing::debug;

use freedom_core::{Customer, NewCustomer, NewProduct, Product};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeResponse {
    pub barcode: String,
}

pub async fn create_product(state: &AppState, product: NewProduct) -> Result<Product, ApiError> {
    debug!(name = %product.name, "create_product command");
    Ok(state.db.products().insert(&product).await?)
}

pub async fn get_product(state: &AppState, id: i64) -> Result<Product, ApiError> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn find_by_barcode(state: &AppState, barcode: &str) -> Result<Product, ApiError> {
    state
        .db
        .products()
        .get_by_barcode(barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", barcode))
}

pub async fn search_products(
    state: &AppState,
    query: &str,
    limit: u32,
) -> Result<Vec<Product>, ApiError> {
    Ok(state.db.products().search(query, limit).await?)
}

/// Manual correction (stock count, breakage). Sales and refunds never go
/// through here.
pub async fn adjust_stock(state: &AppState, id: i64, delta: i64) -> Result<Product, ApiError> {
    debug!(product_id = id, delta = delta, "adjust_stock command");
    Ok(state.db.products().adjust_stock(id, delta).await?)
}

pub async fn generate_barcode(state: &AppState) -> Result<BarcodeResponse, ApiError> {
    let barcode = state.db.products().generate_barcode().await?;
    Ok(BarcodeResponse { barcode })
}

pub async fn create_customer(state: &AppState, customer: NewCustomer) -> Result<Customer, ApiError> {
    Ok(state.db.customers().insert(&customer).await?)
}
