//! Validation utilities for item and movement input
//!
//! Field-level rules (lengths, ranges) live on the input structs as `validator`
//! attributes; the checks here cover what those attributes cannot express.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Maximum length of an item reference
pub const MAX_REFERENCE_LEN: usize = 64;

/// Largest accepted price, 999 999 999 999.99 (the NUMERIC(14, 2) ceiling)
pub const MAX_PRICE: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Prices are stored to the cent
pub const PRICE_SCALE: u32 = 2;

/// Largest quantity a single movement may carry
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000_000;

/// Validate an item reference: non-blank, no inner whitespace,
/// letters, digits and `-_./` only
pub fn validate_reference(reference: &str) -> Result<(), &'static str> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err("Reference is required");
    }
    if trimmed.len() > MAX_REFERENCE_LEN {
        return Err("Reference must be at most 64 characters");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err("Reference may only contain letters, digits and - _ . /");
    }
    Ok(())
}

/// Validate a required display text (name)
pub fn validate_required_text(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Value cannot be blank");
    }
    Ok(())
}

/// Validate a price: not negative, at most `MAX_PRICE`, at most two decimals
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if price > MAX_PRICE {
        return Err("Price must be at most 999999999999.99");
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err("Price may have at most 2 decimal places");
    }
    Ok(())
}

/// `validator` rule for price fields
pub fn price_rule(price: &Decimal) -> Result<(), ValidationError> {
    validate_price(*price).map_err(|message| {
        let mut error = ValidationError::new("price");
        error.message = Some(Cow::Borrowed(message));
        error
    })
}

/// Validate a movement quantity: strictly positive, at most `MAX_MOVEMENT_QUANTITY`
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    if quantity > MAX_MOVEMENT_QUANTITY {
        return Err("Quantity must be at most 1000000000");
    }
    Ok(())
}

/// Normalize a reference for storage and uniqueness checks
pub fn normalize_reference(reference: &str) -> String {
    reference.trim().to_uppercase()
}
