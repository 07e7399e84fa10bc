//! # Reports
//!
//! Report periods and the result shapes returned by the reporting queries.
//! The queries themselves live in `freedom-db`; every report is recomputed
//! from the current tables on each call.
//!
//! ## Periods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  All periods are half-open UTC ranges: start <= created_at < end       │
//! │                                                                         │
//! │  today            [00:00 today,            00:00 tomorrow)             │
//! │  last_seven_days  [00:00 six days ago,     00:00 tomorrow)             │
//! │  month_to_date    [00:00 on the 1st,       00:00 tomorrow)             │
//! │  year_to_date     [00:00 on Jan 1st,       00:00 tomorrow)             │
//! │  month(y, m)      [00:00 on the 1st,       00:00 on next month's 1st)  │
//! │  year(y)          [00:00 on Jan 1st,       00:00 on next Jan 1st)      │
//! │  previous()       same length, ending at this period's start           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Period
// =============================================================================

/// A half-open time range `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl Period {
    /// Builds a period, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: "end must be after start".to_string(),
            });
        }
        Ok(Period { start, end })
    }

    /// A single calendar day.
    pub fn day(date: NaiveDate) -> Self {
        Period {
            start: midnight(date),
            end: midnight(next_day(date)),
        }
    }

    pub fn today(now: DateTime<Utc>) -> Self {
        Period::day(now.date_naive())
    }

    /// Today and the six calendar days before it.
    pub fn last_seven_days(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let first = today.checked_sub_days(Days::new(6)).unwrap_or(today);
        Period {
            start: midnight(first),
            end: midnight(next_day(today)),
        }
    }

    pub fn month_to_date(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let first = today.with_day(1).unwrap_or(today);
        Period {
            start: midnight(first),
            end: midnight(next_day(today)),
        }
    }

    pub fn year_to_date(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        Period {
            start: midnight(first),
            end: midnight(next_day(today)),
        }
    }

    /// A full calendar month, `month` in `1..=12`.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            }
        })?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| invalid_year(year))?;

        Ok(Period {
            start: midnight(first),
            end: midnight(next),
        })
    }

    /// A full calendar year.
    pub fn year(year: i32) -> Result<Self, ValidationError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| invalid_year(year))?;
        let next = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(|| invalid_year(year))?;
        Ok(Period {
            start: midnight(first),
            end: midnight(next),
        })
    }

    /// The period of equal length that ends where this one starts.
    pub fn previous(&self) -> Period {
        let length = self.end - self.start;
        Period {
            start: self.start - length,
            end: self.start,
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn invalid_year(year: i32) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "year".to_string(),
        reason: format!("{} is out of range", year),
    }
}

// =============================================================================
// Report Shapes
// =============================================================================

/// Number of sales and their summed current totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub count: i64,
    pub total_cents: i64,
}

/// Sales within one hour of the day (0-23, UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HourlySales {
    pub hour: u32,
    pub sales_cents: i64,
    pub transactions: i64,
}

/// Sales totals for a period.
///
/// `net_sales_cents` is `total_sales_cents − total_tax_cents`. Sale totals
/// are read as stored, so refunds already reduce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    /// First day the report covers.
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales_cents: i64,
    pub total_tax_cents: i64,
    pub total_transactions: i64,
    pub net_sales_cents: i64,
    /// Payment method (`cash`, `card`, `store_credit`) to summed total.
    pub payment_methods: BTreeMap<String, i64>,
    /// Hours with at least one sale, ascending.
    pub hourly_breakdown: Vec<HourlySales>,
}

/// Units and revenue for one product.
///
/// Revenue is `Σ price × quantity` before discounts and tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: i64,
    pub name: String,
    pub total_quantity: i64,
    pub total_revenue_cents: i64,
}

/// Drawer reconciliation for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyCashReport {
    pub period: Period,
    pub total_sales_cents: i64,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    pub refunds_cents: i64,
    /// `total_sales_cents − refunds_cents`.
    pub net_total_cents: i64,
}

impl DailyCashReport {
    pub fn new(
        period: Period,
        total_sales_cents: i64,
        cash_sales_cents: i64,
        card_sales_cents: i64,
        refunds_cents: i64,
    ) -> Self {
        DailyCashReport {
            period,
            total_sales_cents,
            cash_sales_cents,
            card_sales_cents,
            refunds_cents,
            net_total_cents: total_sales_cents - refunds_cents,
        }
    }
}

/// Sales in one hour of the day, busiest first in [`PerformanceReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PeakHour {
    pub hour: u32,
    pub transactions: i64,
}

/// How a period compares with the one before it.
///
/// ```text
/// previous period            period
/// [start - len, start)       [start, end)
///        │                        │
///        └──── sales growth ◄─────┘
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub period: Period,
    pub sales_cents: i64,
    pub previous_sales_cents: i64,
    /// Percent change against the previous period; 0 when it had no sales.
    pub sales_growth_percent: f64,
    pub transactions: i64,
    /// Mean sale total, rounded to the nearest cent.
    pub average_order_cents: i64,
    /// Customers created during the period.
    pub new_customers: i64,
    /// Share of the previous period's customers who bought again, in percent.
    pub customer_retention_percent: f64,
    pub peak_hours: Vec<PeakHour>,
}

impl PerformanceReport {
    /// `(current − previous) / previous × 100`, or 0 without a baseline.
    pub fn growth_percent(current_cents: i64, previous_cents: i64) -> f64 {
        if previous_cents == 0 {
            return 0.0;
        }
        (current_cents - previous_cents) as f64 / previous_cents as f64 * 100.0
    }

    pub fn average_order(total_cents: i64, transactions: i64) -> i64 {
        if transactions == 0 {
            return 0;
        }
        (total_cents as f64 / transactions as f64).round() as i64
    }
}

/// Stock position across the whole catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub total_products: i64,
    /// Units on hand; negative stock counts as zero.
    pub total_units: i64,
    /// `Σ price × stock` at current selling prices.
    pub stock_value_cents: i64,
    /// In stock, at or below the product's threshold. Lowest first.
    pub low_stock: Vec<Product>,
    /// Stock at or below zero.
    pub out_of_stock: Vec<Product>,
}

impl InventoryReport {
    pub fn from_products(products: Vec<Product>) -> Self {
        let total_products = products.len() as i64;
        let total_units = products.iter().map(|p| p.stock.max(0)).sum();
        let stock_value_cents = products
            .iter()
            .map(|p| p.price() * p.stock.max(0))
            .sum::<Money>()
            .cents();

        let (mut out_of_stock, rest): (Vec<_>, Vec<_>) =
            products.into_iter().partition(|p| p.stock <= 0);
        let mut low_stock: Vec<_> = rest.into_iter().filter(Product::is_low_stock).collect();

        low_stock.sort_by_key(|p| (p.stock, p.id));
        out_of_stock.sort_by_key(|p| (p.stock, p.id));

        InventoryReport {
            total_products,
            total_units,
            stock_value_cents,
            low_stock,
            out_of_stock,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn test_today_is_half_open() {
        let period = Period::today(at(2024, 3, 15, 14));
        assert_eq!(period.start, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(period.end, Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap());
        assert_eq!(period.end - period.start, chrono::Duration::days(1));
    }

    #[test]
    fn test_last_seven_days_spans_seven_days() {
        let period = Period::last_seven_days(at(2024, 3, 2, 9));
        assert_eq!(period.start, Utc.with_ymd_and_hms(2024, 2, 25, 0, 0, 0).unwrap());
        assert_eq!(period.end, Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_and_year() {
        let dec = Period::month(2023, 12).unwrap();
        assert_eq!(dec.end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let feb = Period::month(2024, 2).unwrap();
        assert_eq!((feb.end - feb.start).num_days(), 29);
        assert!(Period::month(2024, 13).is_err());

        let year = Period::year(2024).unwrap();
        assert_eq!((year.end - year.start).num_days(), 366);
    }

    #[test]
    fn test_to_date_periods_end_tomorrow() {
        let now = at(2024, 5, 20, 23);
        let mtd = Period::month_to_date(now);
        assert_eq!(mtd.start, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(mtd.end, Utc.with_ymd_and_hms(2024, 5, 21, 0, 0, 0).unwrap());

        let ytd = Period::year_to_date(now);
        assert_eq!(ytd.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_period_new_rejects_empty_range() {
        let t = at(2024, 1, 1, 0);
        assert!(Period::new(t, t).is_err());
    }

    #[test]
    fn test_previous_period_has_equal_length() {
        let week = Period::last_seven_days(at(2024, 3, 14, 8));
        let before = week.previous();
        assert_eq!(before.end, week.start);
        assert_eq!(before.start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_growth_and_average_order() {
        assert_eq!(PerformanceReport::growth_percent(1500, 1000), 50.0);
        assert_eq!(PerformanceReport::growth_percent(500, 1000), -50.0);
        assert_eq!(PerformanceReport::growth_percent(500, 0), 0.0);

        assert_eq!(PerformanceReport::average_order(1000, 3), 333);
        assert_eq!(PerformanceReport::average_order(1001, 2), 501);
        assert_eq!(PerformanceReport::average_order(0, 0), 0);
    }

    #[test]
    fn test_inventory_report_splits_low_and_out() {
        let now = Utc::now();
        let product = |id: i64, price_cents: i64, stock: i64| Product {
            id,
            name: format!("P{}", id),
            barcode: None,
            price_cents,
            stock,
            low_stock_threshold: 5,
            category: "General".to_string(),
            tax_exempt: false,
            allow_negative_stock: stock < 0,
            created_at: now,
            updated_at: now,
        };

        let report = InventoryReport::from_products(vec![
            product(1, 300, 20),
            product(2, 500, 4),
            product(3, 200, 0),
            product(4, 100, -2),
            product(5, 250, 1),
        ]);

        assert_eq!(report.total_products, 5);
        assert_eq!(report.total_units, 25);
        assert_eq!(report.stock_value_cents, 6000 + 2000 + 250);
        assert_eq!(report.low_stock.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5, 2]);
        assert_eq!(report.out_of_stock.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 3]);
    }

    #[test]
    fn test_cash_report_net_total() {
        let report = DailyCashReport::new(Period::today(at(2024, 1, 1, 0)), 11800, 11800, 0, 5000);
        assert_eq!(report.net_total_cents, 6800);
    }
}
