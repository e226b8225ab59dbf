//! Shared types and models for the POS Stock Tracker
//!
//! This crate contains the domain model, the pure stock-ledger arithmetic and the
//! report aggregation shared between the backend and the browser dashboard (via WASM).

pub mod ledger;
pub mod models;
pub mod reports;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
