//! # Refund Repository
//!
//! The refund transaction and refund lookups.
//!
//! ## Refund Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   create_refund(NewRefund)                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   1. INSERT refunds … WHERE EXISTS sale  (no sale ──► NotFound)         │
//! │   2. UPDATE sales SET total_cents = total_cents − amount                │
//! │   3. for each item of the sale:                                         │
//! │        UPDATE products SET stock = stock + item.quantity                │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restock Policy
//! Every refund puts the sale's *entire* original quantity back on the
//! shelf, whatever the amount refunded. A 50-cent refund on a three-item
//! sale restocks all three items, and two refunds on one sale restock it
//! twice. The refunded amount is also not capped: the stored sale total
//! can go below zero.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::sale::{fetch_items, increment_stock};
use freedom_core::validation::validate_new_refund;
use freedom_core::{NewRefund, Refund};

#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: i64,
    sale_id: i64,
    amount_cents: i64,
    reason: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RefundRow> for Refund {
    type Error = DbError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        if row.amount_cents <= 0 {
            return Err(DbError::malformed(
                "Refund",
                format!("refund {} has amount {}", row.id, row.amount_cents),
            ));
        }

        Ok(Refund {
            id: row.id,
            sale_id: row.sale_id,
            amount_cents: row.amount_cents,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

/// Repository for refund database operations.
#[derive(Debug, Clone)]
pub struct RefundRepository {
    pool: SqlitePool,
}

impl RefundRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RefundRepository { pool }
    }

    /// Records a refund, lowers the sale total and restocks the sale.
    ///
    /// ## Errors
    /// - `Validation` - amount not positive, empty reason
    /// - `NotFound` - the sale doesn't exist (nothing is written)
    pub async fn create_refund(&self, refund: &NewRefund) -> DbResult<i64> {
        validate_new_refund(refund)?;

        let created_at = refund.created_at.unwrap_or_else(Utc::now);
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO refunds (sale_id, amount_cents, reason, created_at)
            SELECT ?1, ?2, ?3, ?4
            WHERE EXISTS (SELECT 1 FROM sales WHERE id = ?1)
            "#,
        )
        .bind(refund.sale_id)
        .bind(refund.amount_cents)
        .bind(refund.reason.trim())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", refund.sale_id));
        }
        let refund_id = result.last_insert_rowid();

        sqlx::query("UPDATE sales SET total_cents = total_cents - ?2 WHERE id = ?1")
            .bind(refund.sale_id)
            .bind(refund.amount_cents)
            .execute(&mut *tx)
            .await?;

        let items = fetch_items(&mut tx, refund.sale_id).await?;
        for item in &items {
            increment_stock(&mut tx, item.product_id, item.quantity).await?;
        }
        debug!(
            sale_id = refund.sale_id,
            restocked_lines = items.len(),
            "Sale restocked"
        );

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            refund_id = refund_id,
            sale_id = refund.sale_id,
            amount_cents = refund.amount_cents,
            "Refund recorded"
        );

        Ok(refund_id)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Refund>> {
        let row: Option<RefundRow> = sqlx::query_as(
            "SELECT id, sale_id, amount_cents, reason, created_at FROM refunds WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Refund::try_from).transpose()
    }

    /// Refunds of a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: i64) -> DbResult<Vec<Refund>> {
        let rows: Vec<RefundRow> = sqlx::query_as(
            r#"
            SELECT id, sale_id, amount_cents, reason, created_at
            FROM refunds
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Refund::try_from).collect()
    }
}
