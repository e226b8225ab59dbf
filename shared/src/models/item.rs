//! Item (article) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Alert threshold applied when the client does not provide one
pub const DEFAULT_ALERT_THRESHOLD: i64 = 5;

/// A stock-keeping unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    /// Client-assigned unique code (e.g. "SH-001")
    pub reference: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    /// Quantity on hand; only ever changed by recording a movement
    pub current_quantity: i64,
    pub alert_threshold: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_low_stock(&self) -> bool {
        crate::ledger::is_low_stock(self.current_quantity, self.alert_threshold)
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Input for creating an item
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 64, message = "Reference must be 1-64 characters"))]
    pub reference: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub size: Option<String>,
    pub color: Option<String>,
    #[validate(custom = "crate::validation::price_rule")]
    pub purchase_price: Decimal,
    #[validate(custom = "crate::validation::price_rule")]
    pub sale_price: Decimal,
    /// Opening stock, booked as an initial ENTRY movement
    #[serde(default, alias = "quantity")]
    #[validate(range(
        min = 0,
        max = 1000000000,
        message = "Initial quantity must be between 0 and 1000000000"
    ))]
    pub initial_quantity: i64,
    #[validate(range(min = 0, message = "Alert threshold cannot be negative"))]
    pub alert_threshold: Option<i64>,
}

/// Partial update of item attributes.
///
/// Stock is not an attribute: `current_quantity` is accepted by the parser only so
/// that the service can refuse it with a proper validation error.
///
/// Optional attributes are tri-state: an absent field keeps the stored value,
/// `null` clears it and a value replaces it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub color: Option<Option<String>>,
    #[validate(custom = "crate::validation::price_rule")]
    pub purchase_price: Option<Decimal>,
    #[validate(custom = "crate::validation::price_rule")]
    pub sale_price: Option<Decimal>,
    #[validate(range(min = 0, message = "Alert threshold cannot be negative"))]
    pub alert_threshold: Option<i64>,
    #[serde(default, alias = "quantity")]
    pub current_quantity: Option<i64>,
}

impl UpdateItemInput {
    /// True when no attribute would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.size.is_none()
            && self.color.is_none()
            && self.purchase_price.is_none()
            && self.sale_price.is_none()
            && self.alert_threshold.is_none()
    }
}

/// Marks a field that was present in the payload, even as `null`
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Filters for listing items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    pub category_id: Option<Uuid>,
    /// Case-insensitive match on reference or name
    pub search: Option<String>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(category_id) = self.category_id {
            if item.category_id != Some(category_id) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                item.reference.to_lowercase().contains(&term)
                    || item.name.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}
