//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Insert / update / delete
//! - Lookup by id or barcode, substring search
//! - Manual stock adjustments
//! - In-store barcode allocation
//!
//! Stock changes caused by sales and refunds do not go through this
//! repository; they happen inside the sale and refund transactions.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use freedom_core::barcode::in_store_ean13;
use freedom_core::validation::{validate_new_product, validate_price_cents, validate_product_name};
use freedom_core::{NewProduct, Product};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, barcode, price_cents, stock, \
     low_stock_threshold, category, tax_exempt, allow_negative_stock, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    name: String,
    barcode: Option<String>,
    price_cents: i64,
    stock: i64,
    low_stock_threshold: i64,
    category: String,
    tax_exempt: bool,
    allow_negative_stock: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price_cents < 0 {
            return Err(DbError::malformed(
                "Product",
                format!("product {} has negative price {}", row.id, row.price_cents),
            ));
        }
        if row.low_stock_threshold < 0 {
            return Err(DbError::malformed(
                "Product",
                format!("product {} has negative low-stock threshold", row.id),
            ));
        }

        Ok(Product {
            id: row.id,
            name: row.name,
            barcode: row.barcode,
            price_cents: row.price_cents,
            stock: row.stock,
            low_stock_threshold: row.low_stock_threshold,
            category: row.category,
            tax_exempt: row.tax_exempt,
            allow_negative_stock: row.allow_negative_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn map_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let latte = repo.insert(&NewProduct::new("Latte", 450, 20, "Drinks")).await?;
/// let hits = repo.search("lat", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns it with its generated id.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;
        debug!(name = %product.name, "Inserting product");

        let now = Utc::now();
        let barcode = product.barcode.as_deref().map(str::trim);

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, barcode, price_cents, stock, low_stock_threshold,
                category, tax_exempt, allow_negative_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(product.name.trim())
        .bind(barcode)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.category.trim())
        .bind(product.tax_exempt)
        .bind(product.allow_negative_stock)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: barcode.unwrap_or_default().to_string(),
            },
            other => other,
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Gets a product by exact barcode (scanner lookup).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE barcode = ?1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Substring search over name and barcode, ordered by name.
    ///
    /// An empty query lists products alphabetically.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = limit, "Searching products");

        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            "SELECT {} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' OR barcode LIKE ?1 ESCAPE '\\' \
             ORDER BY name, id LIMIT ?2",
            PRODUCT_COLUMNS
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(pattern)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        map_products(rows)
    }

    /// Updates every editable field of a product.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = product.id, "Updating product");
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                price_cents = ?4,
                stock = ?5,
                low_stock_threshold = ?6,
                category = ?7,
                tax_exempt = ?8,
                allow_negative_stock = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(&product.category)
        .bind(product.tax_exempt)
        .bind(product.allow_negative_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        self.get_by_id(product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product.id))
    }

    /// Applies a manual stock correction (receiving, shrinkage, counts).
    ///
    /// Delta update, so concurrent adjustments add up instead of
    /// overwriting each other.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<Product> {
        debug!(id = id, delta = delta, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product that no sale references.
    ///
    /// Products with sale history fail with `ForeignKeyViolation`.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Allocates the next unused in-store EAN-13 (`200` prefix).
    pub async fn generate_barcode(&self) -> DbResult<String> {
        let in_store: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE barcode LIKE '200%'")
                .fetch_one(&self.pool)
                .await?;

        let mut sequence = in_store.max(0) as u64 + 1;
        loop {
            let code = in_store_ean13(sequence)?;
            let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE barcode = ?1")
                .bind(&code)
                .fetch_one(&self.pool)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
            sequence += 1;
        }
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use freedom_core::barcode::validate_ean13;
    use freedom_core::NewProduct;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let product = repo
            .insert(&NewProduct::new("Latte", 450, 20, "Drinks").with_barcode("2000000000015"))
            .await
            .unwrap();

        assert!(product.id > 0);
        assert_eq!(product.low_stock_threshold, 10);
        assert!(!product.allow_negative_stock);

        let fetched = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);

        let by_barcode = repo.get_by_barcode("2000000000015").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_barcode() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&NewProduct::new("A", 100, 1, "X").with_barcode("ABC-1"))
            .await
            .unwrap();
        let err = repo
            .insert(&NewProduct::new("B", 100, 1, "X").with_barcode("ABC-1"))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "ABC-1"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected() {
        let db = db().await;
        let err = db
            .products()
            .insert(&NewProduct::new("", 100, 1, "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&NewProduct::new("Flat White", 450, 5, "Drinks"))
            .await
            .unwrap();
        repo.insert(&NewProduct::new("Croissant", 300, 5, "Bakery"))
            .await
            .unwrap();
        repo.insert(&NewProduct::new("White Bread", 250, 5, "Bakery"))
            .await
            .unwrap();

        let hits = repo.search("white", 10).await.unwrap();
        let names: Vec<_> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Flat White", "White Bread"]);

        assert_eq!(repo.search("", 2).await.unwrap().len(), 2);
        assert!(repo.search("100%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_adjust_stock() {
        let db = db().await;
        let repo = db.products();

        let mut product = repo
            .insert(&NewProduct::new("Muffin", 275, 12, "Bakery"))
            .await
            .unwrap();
        product.price_cents = 300;
        let updated = repo.update(&product).await.unwrap();
        assert_eq!(updated.price_cents, 300);

        product.price_cents = i64::MAX / 2 + 1;
        assert!(matches!(
            repo.update(&product).await,
            Err(DbError::Validation(_))
        ));
        assert_eq!(repo.get_by_id(product.id).await.unwrap().unwrap().price_cents, 300);

        let adjusted = repo.adjust_stock(product.id, -5).await.unwrap();
        assert_eq!(adjusted.stock, 7);

        assert!(matches!(
            repo.adjust_stock(9999, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.products();

        let product = repo
            .insert(&NewProduct::new("Scone", 200, 3, "Bakery"))
            .await
            .unwrap();
        repo.delete(product.id).await.unwrap();
        assert!(repo.get_by_id(product.id).await.unwrap().is_none());
        assert!(repo.delete(product.id).await.is_err());
    }

    #[tokio::test]
    async fn test_generate_barcode_skips_taken_codes() {
        let db = db().await;
        let repo = db.products();

        let first = repo.generate_barcode().await.unwrap();
        assert!(validate_ean13(&first).is_ok());
        assert!(first.starts_with("200000000001"));

        repo.insert(&NewProduct::new("Tagged", 100, 1, "X").with_barcode(first.clone()))
            .await
            .unwrap();

        let second = repo.generate_barcode().await.unwrap();
        assert_ne!(first, second);
        assert!(second.starts_with("200000000002"));
    }
}
