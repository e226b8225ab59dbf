//! WebAssembly module for the POS Stock Tracker dashboard
//!
//! Provides client-side computation for:
//! - Low-stock checks and reference validation on the item form
//! - Daily report, weekly sales series and top sellers from cached data

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use wasm_bindgen::prelude::*;

use shared::reports;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("pos-tracker-wasm loaded"));
}

fn js_error(message: String) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn parse_offset(utc_offset_minutes: i32) -> Result<FixedOffset, String> {
    utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| format!("Invalid UTC offset: {} minutes", utc_offset_minutes))
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", date, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(label: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", label, e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn build_daily_report(
    movements_json: &str,
    items_json: &str,
    date: &str,
    utc_offset_minutes: i32,
) -> Result<String, String> {
    let movements: Vec<Movement> = parse_json("movements", movements_json)?;
    let items: Vec<Item> = parse_json("items", items_json)?;
    let report = reports::daily_report(
        parse_date(date)?,
        parse_offset(utc_offset_minutes)?,
        &movements,
        &items,
    )
    .map_err(|e| e.to_string())?;
    to_json(&report)
}

fn build_weekly_series(
    movements_json: &str,
    end_date: &str,
    utc_offset_minutes: i32,
) -> Result<String, String> {
    let movements: Vec<Movement> = parse_json("movements", movements_json)?;
    let series = reports::weekly_series(
        parse_date(end_date)?,
        parse_offset(utc_offset_minutes)?,
        &movements,
    )
    .map_err(|e| e.to_string())?;
    to_json(&series)
}

fn build_top_sellers(movements_json: &str, limit: usize) -> Result<String, String> {
    let movements: Vec<Movement> = parse_json("movements", movements_json)?;
    let sellers = reports::top_sellers(&movements, limit).map_err(|e| e.to_string())?;
    to_json(&sellers)
}

fn build_low_stock(items_json: &str) -> Result<String, String> {
    let items: Vec<Item> = parse_json("items", items_json)?;
    let entries: Vec<LowStockEntry> = reports::low_stock(&items)
        .iter()
        .map(LowStockEntry::from)
        .collect();
    to_json(&entries)
}

/// Whether a quantity is at or below the alert threshold
#[wasm_bindgen]
pub fn is_low_stock(quantity: f64, alert_threshold: f64) -> bool {
    shared::is_low_stock(quantity as i64, alert_threshold as i64)
}

/// Validate an item reference; returns the error message, if any
#[wasm_bindgen]
pub fn check_reference(reference: &str) -> Option<String> {
    validate_reference(reference).err().map(str::to_string)
}

/// Reference as the server stores it
#[wasm_bindgen]
pub fn normalize_item_reference(reference: &str) -> String {
    normalize_reference(reference)
}

/// Today's date (YYYY-MM-DD) in the shop's time zone
#[wasm_bindgen]
pub fn today(utc_offset_minutes: i32) -> Result<String, JsValue> {
    let offset = parse_offset(utc_offset_minutes).map_err(js_error)?;
    let now = DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64)
        .ok_or_else(|| js_error("Clock out of range".to_string()))?;
    Ok(reports::local_date(now, offset).to_string())
}

/// Daily report (same shape as `/api/v1/reports/daily`) from cached movements and items
#[wasm_bindgen]
pub fn daily_report(
    movements_json: &str,
    items_json: &str,
    date: &str,
    utc_offset_minutes: i32,
) -> Result<String, JsValue> {
    build_daily_report(movements_json, items_json, date, utc_offset_minutes).map_err(js_error)
}

/// Sales value for the 7 days ending at `end_date`
#[wasm_bindgen]
pub fn weekly_series(
    movements_json: &str,
    end_date: &str,
    utc_offset_minutes: i32,
) -> Result<String, JsValue> {
    build_weekly_series(movements_json, end_date, utc_offset_minutes).map_err(js_error)
}

/// Best-selling items from cached movements
#[wasm_bindgen]
pub fn top_sellers(movements_json: &str, limit: usize) -> Result<String, JsValue> {
    build_top_sellers(movements_json, limit).map_err(js_error)
}

/// Low-stock rows from cached items
#[wasm_bindgen]
pub fn low_stock(items_json: &str) -> Result<String, JsValue> {
    build_low_stock(items_json).map_err(js_error)
}
