//! Business logic services for the POS Stock Tracker

pub mod category;
pub mod item;
pub mod ledger;
pub mod reporting;

pub use category::CategoryService;
pub use item::ItemService;
pub use ledger::LedgerService;
pub use reporting::ReportingService;
