//! Stock movement (ledger entry) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::ledger::LedgerError;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Stock in (restock, purchase, initial stock)
    #[serde(alias = "ENTREE", alias = "entry", alias = "entrée")]
    Entry,
    /// Stock out (sale, loss)
    #[serde(alias = "SORTIE", alias = "exit", alias = "sortie")]
    Exit,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "ENTRY",
            MovementKind::Exit => "EXIT",
        }
    }

    /// Quantity with the sign this kind applies to the balance
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementKind::Entry => quantity,
            MovementKind::Exit => -quantity,
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ENTRY" | "ENTREE" | "ENTRÉE" => Ok(MovementKind::Entry),
            "EXIT" | "SORTIE" => Ok(MovementKind::Exit),
            other => Err(LedgerError::UnknownKind(other.to_string())),
        }
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    /// Store-assigned insertion order, strictly increasing
    pub sequence: i64,
    pub item_id: Uuid,
    /// Item reference at the time of the movement
    pub item_reference: String,
    /// Item name at the time of the movement
    pub item_name: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub unit_price: Decimal,
    /// Item quantity immediately after this movement
    pub resulting_balance: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// unit_price × quantity; `None` when the product overflows
    pub fn value(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    pub fn signed_quantity(&self) -> i64 {
        self.kind.signed(self.quantity)
    }
}

/// A movement ready to be appended; the store assigns id and sequence
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub item_id: Uuid,
    pub item_reference: String,
    pub item_name: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub resulting_balance: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecordMovementInput {
    #[serde(alias = "articleId")]
    pub item_id: Uuid,
    #[serde(alias = "type")]
    pub kind: MovementKind,
    #[serde(alias = "quantite")]
    #[validate(range(min = 1, max = 1000000000, message = "Quantity must be between 1 and 1000000000"))]
    pub quantity: i64,
    /// Defaults to the purchase price for entries and the sale price for exits
    #[serde(default, alias = "prix")]
    #[validate(custom = "crate::validation::price_rule")]
    pub unit_price: Option<Decimal>,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Input for recording a sale at the item's sale price
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecordSaleInput {
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1000000000, message = "Quantity must be between 1 and 1000000000"))]
    pub quantity: i64,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Input for restocking an item
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RestockInput {
    #[validate(range(min = 1, max = 1000000000, message = "Quantity must be between 1 and 1000000000"))]
    pub quantity: i64,
    /// Defaults to the item's purchase price
    #[serde(default)]
    #[validate(custom = "crate::validation::price_rule")]
    pub unit_price: Option<Decimal>,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Filters for listing movements. Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementFilter {
    pub item_id: Option<Uuid>,
    pub kind: Option<MovementKind>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn for_item(item_id: Uuid) -> Self {
        Self {
            item_id: Some(item_id),
            ..Self::default()
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        self.item_id.map_or(true, |id| movement.item_id == id)
            && self.kind.map_or(true, |kind| movement.kind == kind)
            && self.start.map_or(true, |start| movement.created_at >= start)
            && self.end.map_or(true, |end| movement.created_at <= end)
    }
}

/// Replay view of one item's ledger
#[derive(Debug, Clone, Serialize)]
pub struct ItemLedger {
    pub item_id: Uuid,
    pub reference: String,
    pub current_quantity: i64,
    pub replayed_quantity: i64,
    pub consistent: bool,
    /// Oldest first
    pub movements: Vec<Movement>,
}
