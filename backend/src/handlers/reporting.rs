//! Reporting handlers for stock analytics and CSV export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{DailyReportRow, DashboardMetrics, LowStockEntry, SalesPeriod};

use super::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Debug, Deserialize)]
pub struct DailyReportQuery {
    pub date: Option<NaiveDate>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    pub end_date: Option<NaiveDate>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopSellersQuery {
    pub limit: Option<usize>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub period: Option<SalesPeriod>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub format: Option<String>,
}

fn wants_csv(format: Option<&str>) -> bool {
    format.map_or(false, |f| f.eq_ignore_ascii_case("csv"))
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn reporting_service(state: AppState) -> ReportingService {
    ReportingService::new(state.store, state.clock, &state.config.reports)
}

/// Daily report: movements of one day grouped by item
pub async fn get_daily_report(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DailyReportQuery>, AppError>,
) -> AppResult<Response> {
    let report = reporting_service(state).daily_report(query.date).await?;

    if wants_csv(query.format.as_deref()) {
        let rows: Vec<DailyReportRow> = report.items.iter().map(DailyReportRow::from).collect();
        let csv = ReportingService::export_to_csv(&rows)?;
        Ok(csv_response(&format!("daily_{}.csv", report.date), csv))
    } else {
        Ok(Json(ApiResponse::new(report)).into_response())
    }
}

/// Low-stock report
pub async fn get_low_stock_report(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<FormatQuery>, AppError>,
) -> AppResult<Response> {
    let items = reporting_service(state).low_stock_report().await?;

    if wants_csv(query.format.as_deref()) {
        let rows: Vec<LowStockEntry> = items.iter().map(LowStockEntry::from).collect();
        let csv = ReportingService::export_to_csv(&rows)?;
        Ok(csv_response("low_stock.csv", csv))
    } else {
        Ok(Json(ApiResponse::list(items)).into_response())
    }
}

/// Sales value per day over the last 7 days
pub async fn get_weekly_series(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<WeeklyQuery>, AppError>,
) -> AppResult<Response> {
    let series = reporting_service(state).weekly_series(query.end_date).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&series)?;
        Ok(csv_response("weekly_sales.csv", csv))
    } else {
        Ok(Json(ApiResponse::list(series)).into_response())
    }
}

/// Top-selling items
pub async fn get_top_sellers(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<TopSellersQuery>, AppError>,
) -> AppResult<Response> {
    let sellers = reporting_service(state).top_sellers(query.limit).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&sellers)?;
        Ok(csv_response("top_sellers.csv", csv))
    } else {
        Ok(Json(ApiResponse::list(sellers)).into_response())
    }
}

/// Sales over a period
pub async fn get_sales_summary(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SalesQuery>, AppError>,
) -> AppResult<Response> {
    let summary = reporting_service(state)
        .sales_summary(query.period.unwrap_or_default(), query.start, query.end)
        .await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&summary.sales)?;
        Ok(csv_response(
            &format!("sales_{}_{}.csv", summary.start, summary.end),
            csv,
        ))
    } else {
        Ok(Json(ApiResponse::new(summary)).into_response())
    }
}

/// Dashboard metrics
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DashboardMetrics>>> {
    let metrics = reporting_service(state).dashboard().await?;
    Ok(Json(ApiResponse::new(metrics)))
}
