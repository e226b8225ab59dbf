//! HTTP handlers for category endpoints

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use shared::{Category, CreateCategoryInput};

use super::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::services::CategoryService;
use crate::AppState;

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateCategoryInput>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let service = CategoryService::new(state.store, state.clock);
    let category = service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(category))))
}

/// List categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let service = CategoryService::new(state.store, state.clock);
    let categories = service.list_categories().await?;
    Ok(Json(ApiResponse::list(categories)))
}
