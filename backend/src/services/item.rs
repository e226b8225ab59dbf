//! Item (article) management service

use rust_decimal::Decimal;
use shared::{
    normalize_reference, validate_price, validate_reference, validate_required_text,
    CreateItemInput, Item, ItemFilter, MovementKind, MovementRequest, Pagination, PaginationMeta,
    UpdateItemInput, DEFAULT_ALERT_THRESHOLD, INITIAL_STOCK_NOTE,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::ledger::book_movement;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::store::InventoryStore;

/// Item service for managing the stock catalogue
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
}

fn check_price(field: &str, price: Decimal) -> AppResult<()> {
    validate_price(price).map_err(|message| AppError::invalid(field, message, "Prix invalide"))
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim a tri-state text change; a blank value clears the attribute
fn clean_change(change: Option<Option<String>>) -> Option<Option<String>> {
    change.map(clean_optional)
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create an item; opening stock is booked as an ENTRY in the same unit of work
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        input.validate()?;

        let reference = normalize_reference(&input.reference);
        validate_reference(&reference)
            .map_err(|message| AppError::invalid("reference", message, "Référence invalide"))?;
        validate_required_text(&input.name)
            .map_err(|message| AppError::invalid("name", message, "Le nom est obligatoire"))?;
        check_price("purchase_price", input.purchase_price)?;
        check_price("sale_price", input.sale_price)?;

        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        // the store refuses a taken reference inside the unit of work
        let mut tx = self.store.begin().await?;
        let now = self.clock.now();
        let item = Item {
            id: Uuid::new_v4(),
            reference,
            name: input.name.trim().to_string(),
            description: clean_optional(input.description),
            category_id: input.category_id,
            size: clean_optional(input.size),
            color: clean_optional(input.color),
            purchase_price: input.purchase_price,
            sale_price: input.sale_price,
            current_quantity: 0,
            alert_threshold: input.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tx.insert_item(&item).await?;

        let item = if input.initial_quantity > 0 {
            let request = MovementRequest {
                kind: MovementKind::Entry,
                quantity: input.initial_quantity,
                unit_price: None,
                note: Some(INITIAL_STOCK_NOTE.to_string()),
            };
            let movement = book_movement(tx.as_mut(), &item, &request, now).await?;
            Item {
                current_quantity: movement.resulting_balance,
                ..item
            }
        } else {
            item
        };
        tx.commit().await?;

        tracing::info!(
            item_id = %item.id,
            reference = %item.reference,
            quantity = item.current_quantity,
            "Item created"
        );
        Ok(item)
    }

    /// Get an active item by ID
    pub async fn get_item(&self, id: Uuid) -> AppResult<Item> {
        self.store
            .get_item(id)
            .await?
            .filter(|item| !item.is_archived())
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Update item attributes. Stock cannot be set here.
    pub async fn update_item(&self, id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        if input.current_quantity.is_some() {
            return Err(AppError::invalid(
                "current_quantity",
                "Stock can only change through a movement",
                "Le stock ne peut changer que par un mouvement",
            ));
        }
        input.validate()?;

        if let Some(name) = &input.name {
            validate_required_text(name)
                .map_err(|message| AppError::invalid("name", message, "Le nom est obligatoire"))?;
        }
        if let Some(price) = input.purchase_price {
            check_price("purchase_price", price)?;
        }
        if let Some(price) = input.sale_price {
            check_price("sale_price", price)?;
        }
        if let Some(Some(category_id)) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        if input.is_empty() {
            return self.get_item(id).await;
        }

        let changes = UpdateItemInput {
            name: input.name.map(|n| n.trim().to_string()),
            description: clean_change(input.description),
            size: clean_change(input.size),
            color: clean_change(input.color),
            ..input
        };
        let item = self
            .store
            .update_item_attributes(id, &changes, self.clock.now())
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        tracing::debug!(item_id = %item.id, "Item updated");
        Ok(item)
    }

    /// Archive an item. Its movements stay in the ledger and in reports.
    pub async fn archive_item(&self, id: Uuid) -> AppResult<Item> {
        if !self.store.archive_item(id, self.clock.now()).await? {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let item = self
            .store
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        tracing::info!(item_id = %item.id, reference = %item.reference, "Item archived");
        Ok(item)
    }

    /// List active items with pagination
    pub async fn list_items(
        &self,
        filter: ItemFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Item>, PaginationMeta)> {
        let pagination = pagination.normalized();
        let (items, total) = self.store.list_items(&filter, pagination).await?;
        Ok((items, PaginationMeta::new(pagination, total)))
    }

    async fn ensure_category(&self, category_id: Uuid) -> AppResult<()> {
        match self.store.get_category(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Category".to_string())),
        }
    }
}
