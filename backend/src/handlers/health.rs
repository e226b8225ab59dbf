//! Health and status handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ApiResponse;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub time: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StoreStatus {
    pub backend: String,
    pub connected: bool,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub environment: String,
    pub timestamp: DateTime<Utc>,
    pub store: StoreStatus,
}

/// Liveness plus store connectivity
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Health check: store unreachable: {}", e);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        time: state.clock.now(),
    })
}

/// Environment and store status
pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let connected = state.store.ping().await.is_ok();

    Json(ApiResponse::new(StatusResponse {
        environment: state.config.environment.clone(),
        timestamp: state.clock.now(),
        store: StoreStatus {
            backend: state.store.backend().to_string(),
            connected,
        },
    }))
}
