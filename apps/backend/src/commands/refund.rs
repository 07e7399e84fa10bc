//! # Refund Commands

use serde::{Deserialize, Serialize};
use tracing::debug;

use freedom_core::{NewRefund, Refund};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRefundResponse {
    pub refund_id: i64,
    pub sale_id: i64,
    pub amount_cents: i64,
    /// Sale total after this refund.
    pub sale_total_cents: i64,
}

pub async fn create_refund(
    state: &AppState,
    refund: NewRefund,
) -> Result<CreateRefundResponse, ApiError> {
    debug!(sale_id = refund.sale_id, amount = refund.amount_cents, "create_refund command");

    let refund_id = state.db.refunds().create_refund(&refund).await?;
    let sale = state
        .db
        .sales()
        .get_by_id(refund.sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", refund.sale_id))?;

    Ok(CreateRefundResponse {
        refund_id,
        sale_id: refund.sale_id,
        amount_cents: refund.amount_cents,
        sale_total_cents: sale.total_cents,
    })
}

pub async fn list_refunds(state: &AppState, sale_id: i64) -> Result<Vec<Refund>, ApiError> {
    Ok(state.db.refunds().list_for_sale(sale_id).await?)
}
