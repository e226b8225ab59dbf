//! HTTP handlers for movement and sale endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::{Movement, MovementFilter, MovementKind, RecordMovementInput, RecordSaleInput};
use uuid::Uuid;

use super::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::services::LedgerService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovementListQuery {
    pub item_id: Option<Uuid>,
    #[serde(alias = "type")]
    pub kind: Option<MovementKind>,
    /// Local calendar day
    pub date: Option<NaiveDate>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Record a stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<RecordMovementInput>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Movement>>)> {
    let service = LedgerService::new(state.store, state.clock);
    let movement = service.record_movement(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(movement))))
}

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<RecordSaleInput>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Movement>>)> {
    let service = LedgerService::new(state.store, state.clock);
    let movement = service.record_sale(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(movement))))
}

/// List movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<MovementListQuery>, AppError>,
) -> AppResult<Json<ApiResponse<Vec<Movement>>>> {
    let filter = MovementFilter {
        item_id: query.item_id,
        kind: query.kind,
        start: query.start,
        end: query.end,
    };
    let offset = state.config.reports.offset();
    let service = LedgerService::new(state.store, state.clock);
    let movements = service.list_movements(filter, query.date, offset).await?;
    Ok(Json(ApiResponse::list(movements)))
}
