//! # Sale Repository
//!
//! The sale transaction and the read side of sales.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_sale(NewSale)                                 │
//! │                                                                         │
//! │  validate_new_sale ── fails? ──► Validation error, nothing opened       │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │   1. INSERT sales            → sale_id                                  │
//! │   2. INSERT sale_items       one per line, name copied from products    │
//! │                              (no product row ──► ProductNotFound)       │
//! │   3. UPDATE products         stock = stock − qty                        │
//! │                              WHERE stock >= qty OR allow_negative_stock │
//! │                              (no match ──► InsufficientStock)           │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error drops the transaction: no header, no items, no stock change. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no idempotency key; submitting the same `NewSale` twice records
//! two sales.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use freedom_core::receipt::{BusinessInfo, Invoice};
use freedom_core::validation::validate_new_sale;
use freedom_core::{NewSale, NewSaleItem, PaymentMethod, Sale, SaleItem};

const SALE_COLUMNS: &str =
    "id, subtotal_cents, tax_cents, total_cents, payment_method, customer_id, created_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, name, quantity, price_cents, \
     discount_cents, tax_cents, subtotal_cents, total_cents";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    payment_method: String,
    customer_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> DbResult<Sale> {
        let payment_method: PaymentMethod = self.payment_method.parse().map_err(|_| {
            DbError::malformed(
                "Sale",
                format!(
                    "sale {} has unknown payment method '{}'",
                    self.id, self.payment_method
                ),
            )
        })?;

        Ok(Sale {
            id: self.id,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            payment_method,
            customer_id: self.customer_id,
            created_at: self.created_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    id: i64,
    sale_id: i64,
    product_id: i64,
    name: String,
    quantity: i64,
    price_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    subtotal_cents: i64,
    total_cents: i64,
}

impl TryFrom<SaleItemRow> for SaleItem {
    type Error = DbError;

    fn try_from(row: SaleItemRow) -> Result<Self, Self::Error> {
        if row.quantity <= 0 {
            return Err(DbError::malformed(
                "SaleItem",
                format!("item {} has quantity {}", row.id, row.quantity),
            ));
        }

        Ok(SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price_cents: row.price_cents,
            discount_cents: row.discount_cents,
            tax_cents: row.tax_cents,
            subtotal_cents: row.subtotal_cents,
            total_cents: row.total_cents,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale and reconciles stock, atomically.
    ///
    /// ## Returns
    /// The new sale's id (always positive).
    ///
    /// ## Errors
    /// - `Validation` - empty items, non-positive quantity, negative
    ///   price or discount
    /// - `NotFound` - a line refers to a product that doesn't exist
    /// - `InsufficientStock` - a product without `allow_negative_stock`
    ///   can't cover its line
    /// - `ForeignKeyViolation` - unknown `customer_id`
    pub async fn create_sale(&self, sale: &NewSale) -> DbResult<i64> {
        validate_new_sale(sale)?;

        let created_at = sale.created_at.unwrap_or_else(Utc::now);
        let mut tx = self.pool.begin().await?;

        let sale_id = insert_header(&mut tx, sale, created_at).await?;
        debug!(sale_id = sale_id, items = sale.items.len(), "Sale header inserted");

        for item in &sale.items {
            insert_item(&mut tx, sale_id, item).await?;
        }

        for item in &sale.items {
            decrement_stock(&mut tx, item.product_id, item.quantity).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = sale_id,
            total_cents = sale.total_cents,
            payment_method = %sale.payment_method,
            items = sale.items.len(),
            "Sale recorded"
        );

        Ok(sale_id)
    }

    /// Gets a sale with its items in insertion order.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Gets the items of a sale in insertion order.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, sale_id).await
    }

    /// Most recent sales first, with items.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM sales ORDER BY created_at DESC, id DESC LIMIT ?1",
            SALE_COLUMNS
        );
        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .fetch_all(&mut *conn)
            .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let items = fetch_items(&mut conn, row.id).await?;
            sales.push(row.into_sale(items)?);
        }
        Ok(sales)
    }

    /// Assembles the printable invoice for a sale.
    pub async fn invoice(&self, sale_id: i64, business: &BusinessInfo) -> DbResult<Invoice> {
        let mut conn = self.pool.acquire().await?;

        let sale = fetch_sale(&mut conn, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let customer_name: Option<String> = match sale.customer_id {
            Some(customer_id) => {
                sqlx::query_scalar("SELECT name FROM customers WHERE id = ?1")
                    .bind(customer_id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            None => None,
        };

        Ok(Invoice::new(sale, business, customer_name))
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Statement Helpers
// =============================================================================
// These take a bare connection so they run equally inside a transaction
// (`&mut tx`) or on a pooled connection.

async fn insert_header(
    conn: &mut SqliteConnection,
    sale: &NewSale,
    created_at: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            subtotal_cents, tax_cents, total_cents, payment_method, customer_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method.as_str())
    .bind(sale.customer_id)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Inserts one line, copying the product's current name.
async fn insert_item(conn: &mut SqliteConnection, sale_id: i64, item: &NewSaleItem) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO sale_items (
            sale_id, product_id, name, quantity, price_cents,
            discount_cents, tax_cents, subtotal_cents, total_cents
        )
        SELECT ?1, id, name, ?3, ?4, ?5, ?6, ?7, ?8
        FROM products
        WHERE id = ?2
        "#,
    )
    .bind(sale_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_cents)
    .bind(item.discount_cents)
    .bind(item.tax_cents)
    .bind(item.subtotal_cents)
    .bind(item.total_cents)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", item.product_id));
    }
    Ok(())
}

/// Conditional decrement: applies only when stock covers `quantity` or the
/// product allows negative stock.
async fn decrement_stock(conn: &mut SqliteConnection, product_id: i64, quantity: i64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND (stock >= ?2 OR allow_negative_stock = 1)
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        debug!(product_id = product_id, quantity = quantity, "Stock decremented");
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => Err(DbError::InsufficientStock {
            product_id,
            available,
            requested: quantity,
        }),
        None => Err(DbError::not_found("Product", product_id)),
    }
}

/// Adds `quantity` back to a product's stock.
pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }
    Ok(())
}

pub(crate) async fn fetch_items(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Vec<SaleItem>> {
    let sql = format!(
        "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY id",
        ITEM_COLUMNS
    );
    let rows: Vec<SaleItemRow> = sqlx::query_as(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(SaleItem::try_from).collect()
}

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    let row: Option<SaleRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let items = fetch_items(conn, row.id).await?;
            row.into_sale(items).map(Some)
        }
        None => Ok(None),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
