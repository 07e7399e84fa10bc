//! # Report Commands
//!
//! Periods arrive as [`PeriodRequest`]s and are resolved against the
//! current UTC time when the command runs.

use chrono::Utc;

use freedom_core::report::{
    DailyCashReport, InventoryReport, PerformanceReport, Period, PeriodSummary, ProductSales,
    SalesReport,
};
use freedom_core::Product;

use super::PeriodRequest;
use crate::error::ApiError;
use crate::state::AppState;

fn resolve(period: &PeriodRequest) -> Result<Period, ApiError> {
    Ok(period.resolve(Utc::now())?)
}

pub async fn period_summary(state: &AppState, period: PeriodRequest) -> Result<PeriodSummary, ApiError> {
    Ok(state.db.reports().period_summary(resolve(&period)?).await?)
}

pub async fn sales_report(state: &AppState, period: PeriodRequest) -> Result<SalesReport, ApiError> {
    Ok(state.db.reports().sales_report(resolve(&period)?).await?)
}

pub async fn daily_sales_reports(
    state: &AppState,
    period: PeriodRequest,
) -> Result<Vec<SalesReport>, ApiError> {
    Ok(state.db.reports().daily_sales_reports(resolve(&period)?).await?)
}

pub async fn top_selling(
    state: &AppState,
    period: Option<PeriodRequest>,
    limit: u32,
) -> Result<Vec<ProductSales>, ApiError> {
    let period = period.as_ref().map(resolve).transpose()?;
    Ok(state.db.reports().top_selling(period, limit).await?)
}

pub async fn least_selling(
    state: &AppState,
    period: Option<PeriodRequest>,
    limit: u32,
) -> Result<Vec<ProductSales>, ApiError> {
    let period = period.as_ref().map(resolve).transpose()?;
    Ok(state.db.reports().least_selling(period, limit).await?)
}

pub async fn low_stock(state: &AppState, threshold: Option<i64>) -> Result<Vec<Product>, ApiError> {
    Ok(state.db.reports().low_stock(threshold).await?)
}

pub async fn daily_cash_report(
    state: &AppState,
    period: PeriodRequest,
) -> Result<DailyCashReport, ApiError> {
    Ok(state.db.reports().daily_cash_report(resolve(&period)?).await?)
}

pub async fn performance_report(
    state: &AppState,
    period: PeriodRequest,
) -> Result<PerformanceReport, ApiError> {
    Ok(state.db.reports().performance_report(resolve(&period)?).await?)
}

pub async fn inventory_report(state: &AppState) -> Result<InventoryReport, ApiError> {
    Ok(state.db.reports().inventory_report().await?)
}
