//! Domain models for the POS Stock Tracker

mod category;
mod item;
mod movement;
mod report;

pub use category::*;
pub use item::*;
pub use movement::*;
pub use report::*;
