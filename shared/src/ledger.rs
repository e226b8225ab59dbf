//! Stock-ledger arithmetic
//!
//! Every change of an item's quantity is expressed as a movement. This module
//! decides whether a movement may be applied and what the resulting balance is;
//! persisting the movement and the new balance together is the backend's job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Item, Movement, MovementKind, NewMovement};

/// Note attached to the movement booked when an item is created with stock
pub const INITIAL_STOCK_NOTE: &str = "Initial stock";

/// Ledger rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Quantity must be a positive integer, got {0}")]
    NonPositiveQuantity(i64),

    #[error("Unit price cannot be negative")]
    NegativeUnitPrice,

    #[error("Insufficient stock for {reference}: requested {requested}, available {available}")]
    InsufficientStock {
        reference: String,
        requested: i64,
        available: i64,
    },

    #[error("Stock quantity overflow for {0}")]
    QuantityOverflow(String),

    #[error("Unknown movement type: {0}")]
    UnknownKind(String),

    #[error("Item {0} is archived")]
    ItemArchived(String),
}

/// A requested stock change, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct MovementRequest {
    pub kind: MovementKind,
    pub quantity: i64,
    pub unit_price: Option<Decimal>,
    pub note: Option<String>,
}

/// Whether a quantity is at or below the alert threshold
pub fn is_low_stock(quantity: i64, alert_threshold: i64) -> bool {
    quantity <= alert_threshold
}

/// Price used when the request does not carry one
pub fn default_unit_price(item: &Item, kind: MovementKind) -> Decimal {
    match kind {
        MovementKind::Entry => item.purchase_price,
        MovementKind::Exit => item.sale_price,
    }
}

/// Balance after applying `quantity` of `kind` to `current`.
///
/// Exits never take the balance below zero.
pub fn next_balance(
    reference: &str,
    current: i64,
    kind: MovementKind,
    quantity: i64,
) -> Result<i64, LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::NonPositiveQuantity(quantity));
    }
    match kind {
        MovementKind::Entry => current
            .checked_add(quantity)
            .ok_or_else(|| LedgerError::QuantityOverflow(reference.to_string())),
        MovementKind::Exit if quantity > current => Err(LedgerError::InsufficientStock {
            reference: reference.to_string(),
            requested: quantity,
            available: current,
        }),
        MovementKind::Exit => Ok(current - quantity),
    }
}

/// Validate a request against the item's current state and build the ledger entry
pub fn plan_movement(
    item: &Item,
    request: &MovementRequest,
    at: DateTime<Utc>,
) -> Result<NewMovement, LedgerError> {
    if item.is_archived() {
        return Err(LedgerError::ItemArchived(item.reference.clone()));
    }

    let unit_price = request
        .unit_price
        .unwrap_or_else(|| default_unit_price(item, request.kind));
    if unit_price < Decimal::ZERO {
        return Err(LedgerError::NegativeUnitPrice);
    }

    let resulting_balance = next_balance(
        &item.reference,
        item.current_quantity,
        request.kind,
        request.quantity,
    )?;

    Ok(NewMovement {
        item_id: item.id,
        item_reference: item.reference.clone(),
        item_name: item.name.clone(),
        kind: request.kind,
        quantity: request.quantity,
        unit_price,
        resulting_balance,
        note: request
            .note
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        created_at: at,
    })
}

/// Rebuild a balance by replaying movements, in ledger order, from zero
pub fn replay<'a, I>(movements: I) -> i64
where
    I: IntoIterator<Item = &'a Movement>,
{
    let mut ordered: Vec<&Movement> = movements.into_iter().collect();
    ordered.sort_by_key(|m| m.sequence);
    ordered.iter().map(|m| m.signed_quantity()).sum()
}

/// Check that every movement's recorded balance follows from its predecessor.
///
/// Returns the sequence of the first movement that breaks the chain.
pub fn first_broken_link<'a, I>(movements: I) -> Option<i64>
where
    I: IntoIterator<Item = &'a Movement>,
{
    let mut ordered: Vec<&Movement> = movements.into_iter().collect();
    ordered.sort_by_key(|m| m.sequence);

    let mut balance = 0i64;
    for movement in ordered {
        balance += movement.signed_quantity();
        if balance != movement.resulting_balance {
            return Some(movement.sequence);
        }
    }
    None
}
