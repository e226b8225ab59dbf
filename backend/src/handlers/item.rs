//! HTTP handlers for item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::{
    CreateItemInput, Item, ItemFilter, ItemLedger, Movement, Pagination, RestockInput,
    UpdateItemInput,
};
use uuid::Uuid;

use super::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::services::{ItemService, LedgerService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    pub page: Option<u32>,
    #[serde(alias = "limit")]
    pub per_page: Option<u32>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

impl ItemListQuery {
    fn split(self) -> (ItemFilter, Pagination) {
        let defaults = Pagination::default();
        (
            ItemFilter {
                category_id: self.category_id,
                search: self.search,
            },
            Pagination::new(
                self.page.unwrap_or(defaults.page),
                self.per_page.unwrap_or(defaults.per_page),
            ),
        )
    }
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateItemInput>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Item>>)> {
    let service = ItemService::new(state.store, state.clock);
    let item = service.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(item))))
}

/// List active items
pub async fn list_items(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ItemListQuery>, AppError>,
) -> AppResult<Json<ApiResponse<Vec<Item>>>> {
    let (filter, pagination) = query.split();
    let service = ItemService::new(state.store, state.clock);
    let (items, meta) = service.list_items(filter, pagination).await?;
    Ok(Json(ApiResponse::page(items, meta)))
}

/// Get an item
pub async fn get_item(
    State(state): State<AppState>,
    WithRejection(Path(item_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let service = ItemService::new(state.store, state.clock);
    let item = service.get_item(item_id).await?;
    Ok(Json(ApiResponse::new(item)))
}

/// Update item attributes
pub async fn update_item(
    State(state): State<AppState>,
    WithRejection(Path(item_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateItemInput>, AppError>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let service = ItemService::new(state.store, state.clock);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(ApiResponse::new(item)))
}

/// Archive an item
pub async fn archive_item(
    State(state): State<AppState>,
    WithRejection(Path(item_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let service = ItemService::new(state.store, state.clock);
    let item = service.archive_item(item_id).await?;
    Ok(Json(ApiResponse::new(item)))
}

/// Restock an item
pub async fn restock_item(
    State(state): State<AppState>,
    WithRejection(Path(item_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<RestockInput>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Movement>>)> {
    let service = LedgerService::new(state.store, state.clock);
    let movement = service.restock(item_id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(movement))))
}

/// Replay view of an item's ledger
pub async fn get_item_ledger(
    State(state): State<AppState>,
    WithRejection(Path(item_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<ApiResponse<ItemLedger>>> {
    let service = LedgerService::new(state.store, state.clock);
    let ledger = service.item_ledger(item_id).await?;
    Ok(Json(ApiResponse::new(ledger)))
}
