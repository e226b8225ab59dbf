//! Route definitions for the POS Stock Tracker API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::status))
        .nest("/categories", category_routes())
        .nest("/items", item_routes())
        .nest("/movements", movement_routes())
        .route("/sales", post(handlers::record_sale))
        .nest("/reports", report_routes())
}

/// Category routes
fn category_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_categories).post(handlers::create_category),
    )
}

/// Item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .patch(handlers::update_item)
                .delete(handlers::archive_item),
        )
        .route("/:item_id/ledger", get(handlers::get_item_ledger))
        .route("/:item_id/restock", post(handlers::restock_item))
}

/// Movement ledger routes
fn movement_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_movements).post(handlers::record_movement),
    )
}

/// Report routes (JSON, or CSV with `?format=csv`)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/daily", get(handlers::get_daily_report))
        .route("/low-stock", get(handlers::get_low_stock_report))
        .route("/weekly", get(handlers::get_weekly_series))
        .route("/top-sellers", get(handlers::get_top_sellers))
        .route("/sales", get(handlers::get_sales_summary))
        .route("/dashboard", get(handlers::get_dashboard))
}
