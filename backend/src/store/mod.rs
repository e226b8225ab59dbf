//! Storage interface for items, categories and the movement ledger
//!
//! Every write that changes an item's quantity goes through a [`StoreTx`]: the
//! item row is locked, the movement appended and the quantity updated, and either
//! all of it is committed or none of it is. Dropping a transaction without
//! calling [`StoreTx::commit`] rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    Category, Item, ItemFilter, Movement, MovementFilter, NewMovement, Pagination, UpdateItemInput,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared inventory store
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Short name of the adapter, reported by the status endpoint
    fn backend(&self) -> &'static str;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Start a unit of work
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    async fn insert_category(&self, category: &Category) -> AppResult<()>;

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    /// Fetch an item, archived or not
    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>>;

    /// Active items, most recently updated first, with the total match count
    async fn list_items(
        &self,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Item>, u64)>;

    /// Every item including archived ones, for reports
    async fn all_items(&self) -> AppResult<Vec<Item>>;

    /// Apply the provided attributes to an active item. Never touches quantity.
    async fn update_item_attributes(
        &self,
        id: Uuid,
        changes: &UpdateItemInput,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Item>>;

    /// Mark an active item archived; false when no active item matched
    async fn archive_item(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    /// Movements matching `filter`, in ledger order (oldest first)
    async fn list_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>>;
}

/// A unit of work on the store
#[async_trait]
pub trait StoreTx: Send {
    /// Insert a new item; `DuplicateEntry("reference")` when the reference is taken
    async fn insert_item(&mut self, item: &Item) -> AppResult<()>;

    /// Load an item and hold it against concurrent writers until commit
    async fn lock_item(&mut self, id: Uuid) -> AppResult<Option<Item>>;

    /// Append a ledger entry; the store assigns id and sequence
    async fn append_movement(&mut self, movement: &NewMovement) -> AppResult<Movement>;

    async fn set_item_quantity(
        &mut self,
        id: Uuid,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
