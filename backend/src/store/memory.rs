//! In-process store
//!
//! A transaction owns the store's mutex guard for its whole lifetime and stages
//! its writes; they are applied to the shared state only on commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    Category, Item, ItemFilter, Movement, MovementFilter, NewMovement, Pagination, UpdateItemInput,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{InventoryStore, StoreTx};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct MemoryState {
    categories: Vec<Category>,
    items: HashMap<Uuid, Item>,
    movements: Vec<Movement>,
    last_sequence: i64,
}

/// Inventory store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    offline: Arc<AtomicBool>,
    fail_next_quantity_update: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the connection to the store
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next quantity update inside a transaction fail
    pub fn fail_next_quantity_update(&self) {
        self.fail_next_quantity_update.store(true, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        self.ensure_online()
    }

    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        self.ensure_online()?;
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx {
            state: guard,
            fail_next_quantity_update: self.fail_next_quantity_update.clone(),
            new_items: Vec::new(),
            movements: Vec::new(),
            quantities: HashMap::new(),
        }))
    }

    async fn insert_category(&self, category: &Category) -> AppResult<()> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let name = category.name.to_lowercase();
        if state.categories.iter().any(|c| c.name.to_lowercase() == name) {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        state.categories.push(category.clone());
        Ok(())
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(categories)
    }

    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state.items.get(&id).cloned())
    }

    async fn list_items(
        &self,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Item>, u64)> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut matching: Vec<&Item> = state
            .items
            .values()
            .filter(|item| !item.is_archived() && filter.matches(item))
            .collect();
        matching.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.reference.cmp(&b.reference))
        });

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn all_items(&self) -> AppResult<Vec<Item>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state.items.values().cloned().collect())
    }

    async fn update_item_attributes(
        &self,
        id: Uuid,
        changes: &UpdateItemInput,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Item>> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&id).filter(|item| !item.is_archived()) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            item.name = name.clone();
        }
        if let Some(description) = &changes.description {
            item.description = description.clone();
        }
        if let Some(category_id) = changes.category_id {
            item.category_id = category_id;
        }
        if let Some(size) = &changes.size {
            item.size = size.clone();
        }
        if let Some(color) = &changes.color {
            item.color = color.clone();
        }
        if let Some(price) = changes.purchase_price {
            item.purchase_price = price;
        }
        if let Some(price) = changes.sale_price {
            item.sale_price = price;
        }
        if let Some(threshold) = changes.alert_threshold {
            item.alert_threshold = threshold;
        }
        item.updated_at = at;

        Ok(Some(item.clone()))
    }

    async fn archive_item(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        match state.items.get_mut(&id).filter(|item| !item.is_archived()) {
            Some(item) => {
                item.archived_at = Some(at);
                item.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state
            .movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }
}

/// Staged writes against a locked [`MemoryStore`]
pub struct MemoryTx {
    state: OwnedMutexGuard<MemoryState>,
    fail_next_quantity_update: Arc<AtomicBool>,
    new_items: Vec<Item>,
    movements: Vec<Movement>,
    quantities: HashMap<Uuid, (i64, DateTime<Utc>)>,
}

impl MemoryTx {
    fn exists(&self, id: Uuid) -> bool {
        self.state.items.contains_key(&id) || self.new_items.iter().any(|item| item.id == id)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_item(&mut self, item: &Item) -> AppResult<()> {
        let taken = self
            .state
            .items
            .values()
            .chain(self.new_items.iter())
            .any(|existing| existing.reference == item.reference);
        if taken {
            return Err(AppError::DuplicateEntry("reference".to_string()));
        }
        self.new_items.push(item.clone());
        Ok(())
    }

    async fn lock_item(&mut self, id: Uuid) -> AppResult<Option<Item>> {
        let base = self
            .new_items
            .iter()
            .find(|item| item.id == id)
            .or_else(|| self.state.items.get(&id))
            .cloned();

        Ok(base.map(|mut item| {
            if let Some((quantity, at)) = self.quantities.get(&id) {
                item.current_quantity = *quantity;
                item.updated_at = *at;
            }
            item
        }))
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> AppResult<Movement> {
        if !self.exists(movement.item_id) {
            return Err(AppError::NotFound("Item".to_string()));
        }
        let sequence = self.state.last_sequence + self.movements.len() as i64 + 1;
        let stored = Movement {
            id: Uuid::new_v4(),
            sequence,
            item_id: movement.item_id,
            item_reference: movement.item_reference.clone(),
            item_name: movement.item_name.clone(),
            kind: movement.kind,
            quantity: movement.quantity,
            unit_price: movement.unit_price,
            resulting_balance: movement.resulting_balance,
            note: movement.note.clone(),
            created_at: movement.created_at,
        };
        self.movements.push(stored.clone());
        Ok(stored)
    }

    async fn set_item_quantity(
        &mut self,
        id: Uuid,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.fail_next_quantity_update.swap(false, Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(
                "injected quantity update failure".to_string(),
            ));
        }
        if !self.exists(id) {
            return Err(AppError::NotFound("Item".to_string()));
        }
        if quantity < 0 {
            return Err(AppError::Internal(format!(
                "refusing negative quantity {} for item {}",
                quantity, id
            )));
        }
        self.quantities.insert(id, (quantity, at));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx {
            mut state,
            new_items,
            movements,
            quantities,
            ..
        } = *self;

        for item in new_items {
            state.items.insert(item.id, item);
        }
        for (id, (quantity, at)) in quantities {
            if let Some(item) = state.items.get_mut(&id) {
                item.current_quantity = quantity;
                item.updated_at = at;
            }
        }
        if let Some(last) = movements.last() {
            state.last_sequence = last.sequence;
        }
        state.movements.extend(movements);
        Ok(())
    }
}
