//! # Report Repository
//!
//! Read-only aggregates over sales, sale items, refunds and products.
//! Nothing is cached or materialized: each call recomputes from the
//! current tables.
//!
//! ## Period Filtering
//! Timestamps are stored as RFC 3339 text. Comparisons go through
//! `julianday()` so that `2024-03-15T09:00:00+00:00` and
//! `2024-03-15T09:00:00.123456+00:00` order as instants rather than as
//! strings. Hours and days are taken in UTC.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::{map_products, ProductRow, PRODUCT_COLUMNS};
use freedom_core::report::{
    DailyCashReport, HourlySales, InventoryReport, PeakHour, PerformanceReport, Period,
    PeriodSummary, ProductSales, SalesReport,
};
use freedom_core::Product;

/// `created_at` within `[?1, ?2)`.
const IN_PERIOD: &str =
    "julianday(created_at) >= julianday(?1) AND julianday(created_at) < julianday(?2)";

#[derive(Debug, sqlx::FromRow)]
struct ProductSalesRow {
    product_id: i64,
    name: String,
    total_quantity: i64,
    total_revenue_cents: i64,
}

impl From<ProductSalesRow> for ProductSales {
    fn from(row: ProductSalesRow) -> Self {
        ProductSales {
            product_id: row.product_id,
            name: row.name,
            total_quantity: row.total_quantity,
            total_revenue_cents: row.total_revenue_cents,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Ranking {
    Top,
    Least,
}

impl Ranking {
    fn order(self) -> &'static str {
        match self {
            Ranking::Top => "DESC",
            Ranking::Least => "ASC",
        }
    }
}

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Number of sales in the period and their summed (current) totals.
    ///
    /// ```rust,ignore
    /// let today = db.reports().period_summary(Period::today(Utc::now())).await?;
    /// let week = db.reports().period_summary(Period::last_seven_days(Utc::now())).await?;
    /// ```
    pub async fn period_summary(&self, period: Period) -> DbResult<PeriodSummary> {
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales WHERE {}",
            IN_PERIOD
        );
        let (count, total_cents): (i64, i64) = sqlx::query_as(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_one(&self.pool)
            .await?;

        Ok(PeriodSummary { count, total_cents })
    }

    /// Totals, payment method split and hourly breakdown for a period.
    pub async fn sales_report(&self, period: Period) -> DbResult<SalesReport> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0), COALESCE(SUM(tax_cents), 0)
            FROM sales
            WHERE {}
            "#,
            IN_PERIOD
        );
        let (total_transactions, total_sales_cents, total_tax_cents): (i64, i64, i64) =
            sqlx::query_as(&sql)
                .bind(period.start)
                .bind(period.end)
                .fetch_one(&mut *conn)
                .await?;

        let sql = format!(
            r#"
            SELECT payment_method, SUM(total_cents)
            FROM sales
            WHERE {}
            GROUP BY payment_method
            "#,
            IN_PERIOD
        );
        let methods: Vec<(String, i64)> = sqlx::query_as(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_all(&mut *conn)
            .await?;

        let sql = format!(
            r#"
            SELECT CAST(strftime('%H', created_at) AS INTEGER) AS hour,
                   SUM(total_cents),
                   COUNT(*)
            FROM sales
            WHERE {}
            GROUP BY hour
            ORDER BY hour
            "#,
            IN_PERIOD
        );
        let hours: Vec<(i64, i64, i64)> = sqlx::query_as(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_all(&mut *conn)
            .await?;

        let hourly_breakdown = hours
            .into_iter()
            .map(|(hour, sales_cents, transactions)| -> DbResult<HourlySales> {
                let hour = u32::try_from(hour)
                    .ok()
                    .filter(|h| *h < 24)
                    .ok_or_else(|| DbError::malformed("Sale", format!("hour {} out of range", hour)))?;
                Ok(HourlySales {
                    hour,
                    sales_cents,
                    transactions,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(
            start = %period.start,
            end = %period.end,
            transactions = total_transactions,
            "Sales report computed"
        );

        Ok(SalesReport {
            date: period.start.date_naive(),
            total_sales_cents,
            total_tax_cents,
            total_transactions,
            net_sales_cents: total_sales_cents - total_tax_cents,
            payment_methods: methods.into_iter().collect::<BTreeMap<_, _>>(),
            hourly_breakdown,
        })
    }

    /// One report per calendar day that has at least one sale, oldest first.
    pub async fn daily_sales_reports(&self, period: Period) -> DbResult<Vec<SalesReport>> {
        let sql = format!(
            "SELECT DISTINCT date(created_at) AS day FROM sales WHERE {} ORDER BY day",
            IN_PERIOD
        );
        let days: Vec<String> = sqlx::query_scalar(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_all(&self.pool)
            .await?;

        let mut reports = Vec::with_capacity(days.len());
        for day in days {
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| DbError::malformed("Sale", format!("bad sale date {:?}: {}", day, e)))?;
            reports.push(self.sales_report(clip(Period::day(date), period)).await?);
        }

        Ok(reports)
    }

    /// Best sellers by units sold. `None` covers all time.
    pub async fn top_selling(&self, period: Option<Period>, limit: u32) -> DbResult<Vec<ProductSales>> {
        self.ranked_products(period, limit, Ranking::Top).await
    }

    /// Products with the fewest units sold. Only products sold at least
    /// once in the period are ranked.
    pub async fn least_selling(&self, period: Option<Period>, limit: u32) -> DbResult<Vec<ProductSales>> {
        self.ranked_products(period, limit, Ranking::Least).await
    }

    async fn ranked_products(
        &self,
        period: Option<Period>,
        limit: u32,
        ranking: Ranking,
    ) -> DbResult<Vec<ProductSales>> {
        let sql = format!(
            r#"
            SELECT si.product_id AS product_id,
                   p.name AS name,
                   SUM(si.quantity) AS total_quantity,
                   SUM(si.price_cents * si.quantity) AS total_revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE ?1 IS NULL
               OR (julianday(s.created_at) >= julianday(?1)
                   AND julianday(s.created_at) < julianday(?2))
            GROUP BY si.product_id, p.name
            ORDER BY total_quantity {}, si.product_id
            LIMIT ?3
            "#,
            ranking.order()
        );

        let rows: Vec<ProductSalesRow> = sqlx::query_as(&sql)
            .bind(period.map(|p| p.start))
            .bind(period.map(|p| p.end))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductSales::from).collect())
    }

    /// Products at or below their own low-stock threshold, or at or below
    /// `threshold` when one is given. Lowest stock first.
    pub async fn low_stock(&self, threshold: Option<i64>) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE stock <= COALESCE(?1, low_stock_threshold)
            ORDER BY stock, id
            "#,
            PRODUCT_COLUMNS
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        map_products(rows)
    }

    /// Drawer reconciliation. Refunds are those *recorded* in the period,
    /// whichever day their sale was made.
    pub async fn daily_cash_report(&self, period: Period) -> DbResult<DailyCashReport> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r#"
            SELECT COALESCE(SUM(total_cents), 0),
                   COALESCE(SUM(CASE WHEN payment_method = 'cash' THEN total_cents ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN payment_method = 'card' THEN total_cents ELSE 0 END), 0)
            FROM sales
            WHERE {}
            "#,
            IN_PERIOD
        );
        let (total, cash, card): (i64, i64, i64) = sqlx::query_as(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_one(&mut *conn)
            .await?;

        let sql = format!(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM refunds WHERE {}",
            IN_PERIOD
        );
        let refunds: i64 = sqlx::query_scalar(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_one(&mut *conn)
            .await?;

        Ok(DailyCashReport::new(period, total, cash, card, refunds))
    }
}

impl ReportRepository {
    /// Growth against the previous equal-length period, order value, peak
    /// hours and customer figures.
    ///
    /// Retention counts customers with a sale in the previous period who
    /// bought again in this one. Anonymous sales are ignored.
    pub async fn performance_report(&self, period: Period) -> DbResult<PerformanceReport> {
        let previous = period.previous();
        let current = self.period_summary(period).await?;
        let before = self.period_summary(previous).await?;

        let mut conn = self.pool.acquire().await?;

        let sql = format!("SELECT COUNT(*) FROM customers WHERE {}", IN_PERIOD);
        let new_customers: i64 = sqlx::query_scalar(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_one(&mut *conn)
            .await?;

        let (previous_customers, returning_customers): (i64, i64) = sqlx::query_as(
            r#"
            WITH earlier AS (
                SELECT DISTINCT customer_id
                FROM sales
                WHERE customer_id IS NOT NULL
                  AND julianday(created_at) >= julianday(?3)
                  AND julianday(created_at) < julianday(?1)
            )
            SELECT
                (SELECT COUNT(*) FROM earlier),
                (SELECT COUNT(DISTINCT customer_id)
                 FROM sales
                 WHERE customer_id IN (SELECT customer_id FROM earlier)
                   AND julianday(created_at) >= julianday(?1)
                   AND julianday(created_at) < julianday(?2))
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .bind(previous.start)
        .fetch_one(&mut *conn)
        .await?;

        let sql = format!(
            r#"
            SELECT CAST(strftime('%H', created_at) AS INTEGER) AS hour, COUNT(*) AS transactions
            FROM sales
            WHERE {}
            GROUP BY hour
            ORDER BY transactions DESC, hour
            "#,
            IN_PERIOD
        );
        let hours: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(period.start)
            .bind(period.end)
            .fetch_all(&mut *conn)
            .await?;

        let peak_hours = hours
            .into_iter()
            .map(|(hour, transactions)| -> DbResult<PeakHour> {
                let hour = u32::try_from(hour)
                    .ok()
                    .filter(|h| *h < 24)
                    .ok_or_else(|| DbError::malformed("Sale", format!("hour {} out of range", hour)))?;
                Ok(PeakHour { hour, transactions })
            })
            .collect::<DbResult<Vec<_>>>()?;

        let customer_retention_percent = if previous_customers == 0 {
            0.0
        } else {
            returning_customers as f64 / previous_customers as f64 * 100.0
        };

        debug!(
            start = %period.start,
            end = %period.end,
            sales_cents = current.total_cents,
            previous_sales_cents = before.total_cents,
            "Performance report computed"
        );

        Ok(PerformanceReport {
            period,
            sales_cents: current.total_cents,
            previous_sales_cents: before.total_cents,
            sales_growth_percent: PerformanceReport::growth_percent(
                current.total_cents,
                before.total_cents,
            ),
            transactions: current.count,
            average_order_cents: PerformanceReport::average_order(current.total_cents, current.count),
            new_customers,
            customer_retention_percent,
            peak_hours,
        })
    }

    /// Catalogue-wide stock position: units, value at selling price, and
    /// the low and out-of-stock lists.
    pub async fn inventory_report(&self) -> DbResult<InventoryReport> {
        let sql = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);
        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(InventoryReport::from_products(map_products(rows)?))
    }
}

/// Narrows `day` to the part that lies inside `outer`.
fn clip(day: Period, outer: Period) -> Period {
    Period::new(day.start.max(outer.start), day.end.min(outer.end)).unwrap_or(day)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{DateTime, TimeZone, Utc};
    use freedom_core::{NewProduct, NewRefund, NewSale, NewSaleItem, PaymentMethod};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 15, 0).unwrap()
    }

    fn sale(
        product_id: i64,
        quantity: i64,
        price_cents: i64,
        tax_cents: i64,
        method: PaymentMethod,
        created_at: DateTime<Utc>,
    ) -> NewSale {
        let subtotal = price_cents * quantity;
        NewSale {
            subtotal_cents: subtotal,
            tax_cents,
            total_cents: subtotal + tax_cents,
            payment_method: method,
            customer_id: None,
            created_at: Some(created_at),
            items: vec![NewSaleItem {
                product_id,
                quantity,
                price_cents,
                discount_cents: 0,
                tax_cents,
                subtotal_cents: subtotal,
                total_cents: subtotal + tax_cents,
            }],
        }
    }

    /// Coffee (id a) and cake (id b), with four sales over two days.
    async fn seeded() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coffee = db
            .products()
            .insert(&NewProduct::new("Coffee", 300, 100, "Drinks"))
            .await
            .unwrap();
        let cake = db
            .products()
            .insert(&NewProduct::new("Cake", 500, 5, "Food").low_stock_threshold(5))
            .await
            .unwrap();

        let sales = db.sales();
        sales
            .create_sale(&sale(coffee.id, 2, 300, 100, PaymentMethod::Cash, at(15, 9)))
            .await
            .unwrap();
        sales
            .create_sale(&sale(coffee.id, 1, 300, 50, PaymentMethod::Card, at(15, 9)))
            .await
            .unwrap();
        sales
            .create_sale(&sale(cake.id, 1, 500, 0, PaymentMethod::Card, at(15, 14)))
            .await
            .unwrap();
        sales
            .create_sale(&sale(coffee.id, 4, 300, 0, PaymentMethod::StoreCredit, at(16, 10)))
            .await
            .unwrap();

        (db, coffee.id, cake.id)
    }

    fn day(d: u32) -> Period {
        Period::day(NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
    }

    #[tokio::test]
    async fn test_period_summary() {
        let (db, _, _) = seeded().await;
        let reports = db.reports();

        let summary = reports.period_summary(day(15)).await.unwrap();
        assert_eq!(summary, PeriodSummary { count: 3, total_cents: 700 + 350 + 500 });

        let week = reports
            .period_summary(Period::last_seven_days(at(16, 23)))
            .await
            .unwrap();
        assert_eq!(week.count, 4);

        let empty = reports.period_summary(day(20)).await.unwrap();
        assert_eq!(empty, PeriodSummary::default());
    }

    #[tokio::test]
    async fn test_sales_report_breakdown() {
        let (db, _, _) = seeded().await;

        let report = db.reports().sales_report(day(15)).await.unwrap();
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(report.total_transactions, 3);
        assert_eq!(report.total_sales_cents, 1550);
        assert_eq!(report.total_tax_cents, 150);
        assert_eq!(report.net_sales_cents, 1400);
        assert_eq!(report.payment_methods.get("cash"), Some(&700));
        assert_eq!(report.payment_methods.get("card"), Some(&850));
        assert!(!report.payment_methods.contains_key("store_credit"));

        assert_eq!(
            report.hourly_breakdown,
            vec![
                HourlySales { hour: 9, sales_cents: 1050, transactions: 2 },
                HourlySales { hour: 14, sales_cents: 500, transactions: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_daily_reports_skip_days_without_sales() {
        let (db, _, _) = seeded().await;

        let period = Period::new(at(10, 0), at(20, 0)).unwrap();
        let reports = db.reports().daily_sales_reports(period).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(reports[1].total_sales_cents, 1200);
    }

    #[tokio::test]
    async fn test_top_and_least_selling() {
        let (db, coffee, cake) = seeded().await;
        let reports = db.reports();

        let top = reports.top_selling(None, 10).await.unwrap();
        assert_eq!(top[0].product_id, coffee);
        assert_eq!(top[0].total_quantity, 7);
        assert_eq!(top[0].total_revenue_cents, 2100);
        assert_eq!(top[1].product_id, cake);

        let least = reports.least_selling(Some(day(15)), 1).await.unwrap();
        assert_eq!(least.len(), 1);
        assert_eq!(least[0].name, "Cake");

        let none = reports.top_selling(Some(day(1)), 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_low_stock() {
        let (db, coffee, cake) = seeded().await;
        let reports = db.reports();

        // Cake: 5 - 1 = 4 <= 5
        let low = reports.low_stock(None).await.unwrap();
        assert_eq!(low.iter().map(|p| p.id).collect::<Vec<_>>(), vec![cake]);

        let all = reports.low_stock(Some(1000)).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![cake, coffee]);
    }

    #[tokio::test]
    async fn test_daily_cash_report() {
        let (db, _, _) = seeded().await;

        let first = db.sales().list_recent(10).await.unwrap().pop().unwrap();
        db.refunds()
            .create_refund(&NewRefund {
                sale_id: first.id,
                amount_cents: 200,
                reason: "spilled".to_string(),
                created_at: Some(at(15, 18)),
            })
            .await
            .unwrap();

        let report = db.reports().daily_cash_report(day(15)).await.unwrap();
        assert_eq!(report.cash_sales_cents, 500);
        assert_eq!(report.card_sales_cents, 850);
        assert_eq!(report.total_sales_cents, 1350);
        assert_eq!(report.refunds_cents, 200);
        assert_eq!(report.net_total_cents, 1150);
    }

    async fn customer(db: &Database, name: &str, created_at: DateTime<Utc>) -> i64 {
        sqlx::query("INSERT INTO customers (name, created_at) VALUES (?1, ?2)")
            .bind(name)
            .bind(created_at)
            .execute(db.pool())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_performance_report() {
        let (db, coffee, _) = seeded().await;
        let ada = customer(&db, "Ada", at(15, 8)).await;
        let bob = customer(&db, "Bob", at(14, 8)).await;
        customer(&db, "Cy", at(16, 9)).await;

        let sales = db.sales();
        for (who, price, when) in [
            (ada, 300, at(15, 11)),
            (bob, 150, at(15, 12)),
            (ada, 300, at(16, 10)),
        ] {
            let mut new_sale = sale(coffee, 1, price, 0, PaymentMethod::Cash, when);
            new_sale.customer_id = Some(who);
            sales.create_sale(&new_sale).await.unwrap();
        }

        let report = db.reports().performance_report(day(16)).await.unwrap();

        // 16th: 1200 + 300; 15th: 1550 + 300 + 150
        assert_eq!(report.sales_cents, 1500);
        assert_eq!(report.previous_sales_cents, 2000);
        assert_eq!(report.sales_growth_percent, -25.0);
        assert_eq!(report.transactions, 2);
        assert_eq!(report.average_order_cents, 750);
        assert_eq!(report.new_customers, 1);
        // Ada came back, Bob did not
        assert_eq!(report.customer_retention_percent, 50.0);
        assert_eq!(report.peak_hours, vec![PeakHour { hour: 10, transactions: 2 }]);
    }

    #[tokio::test]
    async fn test_performance_report_without_history() {
        let (db, _, _) = seeded().await;

        let report = db.reports().performance_report(day(14)).await.unwrap();
        assert_eq!(report.sales_cents, 0);
        assert_eq!(report.sales_growth_percent, 0.0);
        assert_eq!(report.average_order_cents, 0);
        assert_eq!(report.customer_retention_percent, 0.0);
        assert!(report.peak_hours.is_empty());
    }

    #[tokio::test]
    async fn test_inventory_report() {
        let (db, coffee, cake) = seeded().await;
        let scone = db
            .products()
            .insert(&NewProduct::new("Scone", 250, 0, "Food"))
            .await
            .unwrap();

        let report = db.reports().inventory_report().await.unwrap();
        assert_eq!(report.total_products, 3);
        // coffee 100 - 7, cake 5 - 1
        assert_eq!(report.total_units, 93 + 4);
        assert_eq!(report.stock_value_cents, 93 * 300 + 4 * 500);
        assert_eq!(report.low_stock.iter().map(|p| p.id).collect::<Vec<_>>(), vec![cake]);
        assert_eq!(report.out_of_stock.iter().map(|p| p.id).collect::<Vec<_>>(), vec![scone.id]);
        assert!(report.low_stock.iter().all(|p| p.id != coffee));
    }

    #[test]
    fn test_clip_keeps_inner_range() {
        let outer = Period::new(at(15, 12), at(20, 0)).unwrap();
        let clipped = clip(day(15), outer);
        assert_eq!(clipped.start, at(15, 12));
        assert_eq!(clipped.end, day(16).start);
    }
}
