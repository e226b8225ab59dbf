//! Shared fixtures for the backend integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::CreateItemInput;
use std::sync::Arc;

use pos_tracker_backend::services::{CategoryService, ItemService, LedgerService, ReportingService};
use pos_tracker_backend::{AppState, Config, FixedClock, MemoryStore};

/// 2024-03-15 (a Friday), 10:00 UTC
pub fn friday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::in_memory())
    }

    pub fn with_config(config: Config) -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(friday_morning()));
        let state = AppState::new(Arc::new(store.clone()), clock.clone(), config);
        Self { store, clock, state }
    }

    pub fn items(&self) -> ItemService {
        ItemService::new(self.state.store.clone(), self.state.clock.clone())
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.state.store.clone(), self.state.clock.clone())
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.state.store.clone(), self.state.clock.clone())
    }

    pub fn reports(&self) -> ReportingService {
        ReportingService::new(
            self.state.store.clone(),
            self.state.clock.clone(),
            &self.state.config.reports,
        )
    }
}

/// Item priced 1000 (purchase) / 1500 (sale), threshold 5
pub fn item_input(reference: &str, name: &str, initial_quantity: i64) -> CreateItemInput {
    CreateItemInput {
        reference: reference.to_string(),
        name: name.to_string(),
        description: None,
        category_id: None,
        size: Some("42".to_string()),
        color: None,
        purchase_price: Decimal::from(1000),
        sale_price: Decimal::from(1500),
        initial_quantity,
        alert_threshold: Some(5),
    }
}
