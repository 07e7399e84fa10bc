//! # Commands Module
//!
//! Every command the UI can send over the bridge.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (Command enum, dispatch)
//! ├── sale.rs      ◄─── createSale, checkout, sale lookups, receipts
//! ├── refund.rs    ◄─── createRefund, listRefunds
//! ├── report.rs    ◄─── summaries, sales/cash/performance/inventory reports, rankings
//! ├── product.rs   ◄─── product catalogue and customers
//! └── system.rs    ◄─── backup, health
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin line                                                             │
//! │  {"command":"createRefund","saleId":3,"amountCents":50,"reason":"..."}  │
//! │         │                                                               │
//! │         │ serde (tag = "command")                                       │
//! │         ▼                                                               │
//! │  Command::CreateRefund(NewRefund { .. })                                │
//! │         │                                                               │
//! │         │ dispatch(&state, command)                                     │
//! │         ▼                                                               │
//! │  refund::create_refund(&state, refund) -> Result<T, ApiError>           │
//! │         │                                                               │
//! │         │ serde_json::to_value                                          │
//! │         ▼                                                               │
//! │  {"success":true,"data":{"refundId":1,"saleTotalCents":68,...}}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payload types (`createSale`, `createRefund`, `createProduct`,
//! `createCustomer`) are flattened next to the `command` tag.

pub mod product;
pub mod refund;
pub mod report;
pub mod sale;
pub mod system;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use freedom_core::report::Period;
use freedom_core::{NewCustomer, NewProduct, NewRefund, NewSale, PaymentMethod, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

fn default_limit() -> u32 {
    20
}

/// A request from the UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    // Sales
    CreateSale(NewSale),
    Checkout {
        lines: Vec<sale::CheckoutLineRequest>,
        payment_method: PaymentMethod,
        #[serde(default)]
        customer_id: Option<i64>,
    },
    GetSaleById {
        id: i64,
    },
    ListSales {
        #[serde(default = "default_limit")]
        limit: u32,
    },
    GetInvoice {
        sale_id: i64,
    },
    PrintReceipt {
        sale_id: i64,
    },

    // Refunds
    CreateRefund(NewRefund),
    ListRefunds {
        sale_id: i64,
    },

    // Reports
    PeriodSummary {
        period: PeriodRequest,
    },
    SalesReport {
        period: PeriodRequest,
    },
    DailySalesReports {
        period: PeriodRequest,
    },
    TopSelling {
        #[serde(default)]
        period: Option<PeriodRequest>,
        #[serde(default = "default_limit")]
        limit: u32,
    },
    LeastSelling {
        #[serde(default)]
        period: Option<PeriodRequest>,
        #[serde(default = "default_limit")]
        limit: u32,
    },
    LowStock {
        #[serde(default)]
        threshold: Option<i64>,
    },
    DailyCashReport {
        period: PeriodRequest,
    },
    PerformanceReport {
        period: PeriodRequest,
    },
    InventoryReport,

    // Products and customers
    CreateProduct(NewProduct),
    GetProduct {
        id: i64,
    },
    FindProductByBarcode {
        barcode: String,
    },
    SearchProducts {
        query: String,
        #[serde(default = "default_limit")]
        limit: u32,
    },
    AdjustStock {
        id: i64,
        delta: i64,
    },
    GenerateBarcode,
    CreateCustomer(NewCustomer),

    // System
    Backup,
    Health,
}

impl Command {
    /// Wire name of the command, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateSale(_) => "createSale",
            Command::Checkout { .. } => "checkout",
            Command::GetSaleById { .. } => "getSaleById",
            Command::ListSales { .. } => "listSales",
            Command::GetInvoice { .. } => "getInvoice",
            Command::PrintReceipt { .. } => "printReceipt",
            Command::CreateRefund(_) => "createRefund",
            Command::ListRefunds { .. } => "listRefunds",
            Command::PeriodSummary { .. } => "periodSummary",
            Command::SalesReport { .. } => "salesReport",
            Command::DailySalesReports { .. } => "dailySalesReports",
            Command::TopSelling { .. } => "topSelling",
            Command::LeastSelling { .. } => "leastSelling",
            Command::LowStock { .. } => "lowStock",
            Command::DailyCashReport { .. } => "dailyCashReport",
            Command::PerformanceReport { .. } => "performanceReport",
            Command::InventoryReport => "inventoryReport",
            Command::CreateProduct(_) => "createProduct",
            Command::GetProduct { .. } => "getProduct",
            Command::FindProductByBarcode { .. } => "findProductByBarcode",
            Command::SearchProducts { .. } => "searchProducts",
            Command::AdjustStock { .. } => "adjustStock",
            Command::GenerateBarcode => "generateBarcode",
            Command::CreateCustomer(_) => "createCustomer",
            Command::Backup => "backup",
            Command::Health => "health",
        }
    }
}

/// Report period as sent by the UI, resolved against the current time.
///
/// ```json
/// {"range": "today"}
/// {"range": "month", "year": 2024, "month": 2}
/// {"range": "between", "start": "2024-03-01T00:00:00Z", "end": "2024-03-08T00:00:00Z"}
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "range", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PeriodRequest {
    Today,
    LastSevenDays,
    MonthToDate,
    YearToDate,
    Day { date: NaiveDate },
    Month { year: i32, month: u32 },
    Year { year: i32 },
    Between { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl PeriodRequest {
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<Period, ValidationError> {
        match *self {
            PeriodRequest::Today => Ok(Period::today(now)),
            PeriodRequest::LastSevenDays => Ok(Period::last_seven_days(now)),
            PeriodRequest::MonthToDate => Ok(Period::month_to_date(now)),
            PeriodRequest::YearToDate => Ok(Period::year_to_date(now)),
            PeriodRequest::Day { date } => Ok(Period::day(date)),
            PeriodRequest::Month { year, month } => Period::month(year, month),
            PeriodRequest::Year { year } => Period::year(year),
            PeriodRequest::Between { start, end } => Period::new(start, end),
        }
    }
}

/// Runs one command and serializes its result.
pub async fn dispatch(state: &AppState, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::CreateSale(new_sale) => to_value(sale::create_sale(state, new_sale).await),
        Command::Checkout {
            lines,
            payment_method,
            customer_id,
        } => to_value(sale::checkout(state, lines, payment_method, customer_id).await),
        Command::GetSaleById { id } => to_value(sale::get_sale(state, id).await),
        Command::ListSales { limit } => to_value(sale::list_sales(state, limit).await),
        Command::GetInvoice { sale_id } => to_value(sale::get_invoice(state, sale_id).await),
        Command::PrintReceipt { sale_id } => to_value(sale::print_receipt(state, sale_id).await),

        Command::CreateRefund(new_refund) => to_value(refund::create_refund(state, new_refund).await),
        Command::ListRefunds { sale_id } => to_value(refund::list_refunds(state, sale_id).await),

        Command::PeriodSummary { period } => to_value(report::period_summary(state, period).await),
        Command::SalesReport { period } => to_value(report::sales_report(state, period).await),
        Command::DailySalesReports { period } => {
            to_value(report::daily_sales_reports(state, period).await)
        }
        Command::TopSelling { period, limit } => {
            to_value(report::top_selling(state, period, limit).await)
        }
        Command::LeastSelling { period, limit } => {
            to_value(report::least_selling(state, period, limit).await)
        }
        Command::LowStock { threshold } => to_value(report::low_stock(state, threshold).await),
        Command::DailyCashReport { period } => {
            to_value(report::daily_cash_report(state, period).await)
        }
        Command::PerformanceReport { period } => {
            to_value(report::performance_report(state, period).await)
        }
        Command::InventoryReport => to_value(report::inventory_report(state).await),

        Command::CreateProduct(new_product) => {
            to_value(product::create_product(state, new_product).await)
        }
        Command::GetProduct { id } => to_value(product::get_product(state, id).await),
        Command::FindProductByBarcode { barcode } => {
            to_value(product::find_by_barcode(state, &barcode).await)
        }
        Command::SearchProducts { query, limit } => {
            to_value(product::search_products(state, &query, limit).await)
        }
        Command::AdjustStock { id, delta } => to_value(product::adjust_stock(state, id, delta).await),
        Command::GenerateBarcode => to_value(product::generate_barcode(state).await),
        Command::CreateCustomer(customer) => {
            to_value(product::create_customer(state, customer).await)
        }

        Command::Backup => to_value(system::backup(state).await),
        Command::Health => to_value(system::health(state).await),
    }
}

fn to_value<T: Serialize>(result: Result<T, ApiError>) -> Result<Value, ApiError> {
    let data = result?;
    serde_json::to_value(data)
        .map_err(|e| ApiError::internal(format!("Failed to serialize response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_flattened_payload_commands() {
        let command: Command = serde_json::from_value(json!({
            "command": "createRefund",
            "saleId": 3,
            "amountCents": 50,
            "reason": "damaged"
        }))
        .unwrap();

        match command {
            Command::CreateRefund(refund) => {
                assert_eq!(refund.sale_id, 3);
                assert_eq!(refund.amount_cents, 50);
                assert!(refund.created_at.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_struct_commands_use_camel_case_fields() {
        let command: Command = serde_json::from_value(json!({
            "command": "topSelling",
            "period": {"range": "month", "year": 2024, "month": 2},
            "limit": 5
        }))
        .unwrap();
        assert_eq!(command.name(), "topSelling");

        let command: Command =
            serde_json::from_value(json!({"command": "listSales"})).unwrap();
        assert!(matches!(command, Command::ListSales { limit: 20 }));

        let command: Command =
            serde_json::from_value(json!({"command": "getInvoice", "saleId": 9})).unwrap();
        assert!(matches!(command, Command::GetInvoice { sale_id: 9 }));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let result: Result<Command, _> = serde_json::from_value(json!({"command": "dropTables"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_period_requests_resolve() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let today: PeriodRequest = serde_json::from_value(json!({"range": "today"})).unwrap();
        assert_eq!(today.resolve(now).unwrap(), Period::today(now));

        let week: PeriodRequest =
            serde_json::from_value(json!({"range": "lastSevenDays"})).unwrap();
        let week = week.resolve(now).unwrap();
        assert_eq!((week.end - week.start).num_days(), 7);

        let bad = PeriodRequest::Month { year: 2024, month: 0 };
        assert!(bad.resolve(now).is_err());

        let backwards = PeriodRequest::Between { start: now, end: now };
        assert!(backwards.resolve(now).is_err());
    }
}
