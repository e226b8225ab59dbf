//! HTTP handlers for the POS Stock Tracker API

use serde::Serialize;
use shared::PaginationMeta;

pub mod category;
pub mod health;
pub mod item;
pub mod movement;
pub mod reporting;

pub use category::*;
pub use health::*;
pub use item::*;
pub use movement::*;
pub use reporting::*;

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            pagination: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A list with its length in `count`
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
            pagination: None,
        }
    }

    /// One page of a longer list
    pub fn page(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
            pagination: Some(pagination),
        }
    }
}
