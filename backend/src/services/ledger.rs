//! Stock movements: the only path that changes an item's quantity

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use shared::reports::day_bounds;
use shared::{
    first_broken_link, plan_movement, replay, validate_quantity, Item, ItemLedger, Movement,
    MovementFilter, MovementKind, MovementRequest, RecordMovementInput, RecordSaleInput,
    RestockInput,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, StoreTx};

/// Append a movement for a locked item and set its new quantity, inside `tx`
pub(crate) async fn book_movement(
    tx: &mut dyn StoreTx,
    item: &Item,
    request: &MovementRequest,
    at: DateTime<Utc>,
) -> AppResult<Movement> {
    let planned = plan_movement(item, request, at)?;
    let movement = tx.append_movement(&planned).await?;
    tx.set_item_quantity(item.id, planned.resulting_balance, at)
        .await?;
    Ok(movement)
}

/// Ledger service
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record an ENTRY or EXIT against an item
    pub async fn record_movement(&self, input: RecordMovementInput) -> AppResult<Movement> {
        input.validate()?;
        let request = MovementRequest {
            kind: input.kind,
            quantity: input.quantity,
            unit_price: input.unit_price,
            note: input.note,
        };
        self.apply(input.item_id, request).await
    }

    /// Record a sale: an EXIT at the item's sale price
    pub async fn record_sale(&self, input: RecordSaleInput) -> AppResult<Movement> {
        input.validate()?;
        let request = MovementRequest {
            kind: MovementKind::Exit,
            quantity: input.quantity,
            unit_price: None,
            note: input.note,
        };
        self.apply(input.item_id, request).await
    }

    /// Restock an item: an ENTRY, at the purchase price unless given
    pub async fn restock(&self, item_id: Uuid, input: RestockInput) -> AppResult<Movement> {
        input.validate()?;
        let request = MovementRequest {
            kind: MovementKind::Entry,
            quantity: input.quantity,
            unit_price: input.unit_price,
            note: input.note,
        };
        self.apply(item_id, request).await
    }

    async fn apply(&self, item_id: Uuid, request: MovementRequest) -> AppResult<Movement> {
        validate_quantity(request.quantity).map_err(|message| {
            AppError::invalid(
                "quantity",
                message,
                "La quantité doit être comprise entre 1 et 1000000000",
            )
        })?;

        let mut tx = self.store.begin().await?;
        let item = tx
            .lock_item(item_id)
            .await?
            .filter(|item| !item.is_archived())
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        // taken under the lock so timestamps follow sequence order
        let now = self.clock.now();

        let movement = book_movement(tx.as_mut(), &item, &request, now).await?;
        tx.commit().await?;

        tracing::info!(
            item_id = %movement.item_id,
            reference = %movement.item_reference,
            kind = %movement.kind,
            quantity = movement.quantity,
            balance = movement.resulting_balance,
            "Movement recorded"
        );
        Ok(movement)
    }

    /// Movements matching `filter`, newest first.
    ///
    /// A `date` narrows the filter to that local calendar day.
    pub async fn list_movements(
        &self,
        mut filter: MovementFilter,
        date: Option<NaiveDate>,
        offset: FixedOffset,
    ) -> AppResult<Vec<Movement>> {
        if let Some(date) = date {
            let (start, end) = day_bounds(date, offset)?;
            filter.start = Some(filter.start.map_or(start, |s| s.max(start)));
            filter.end = Some(filter.end.map_or(end, |e| e.min(end)));
        }

        let mut movements = self.store.list_movements(&filter).await?;
        movements.reverse();
        Ok(movements)
    }

    /// An item's ledger, oldest first, replayed against its live quantity
    pub async fn item_ledger(&self, item_id: Uuid) -> AppResult<ItemLedger> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .filter(|item| !item.is_archived())
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let movements = self
            .store
            .list_movements(&MovementFilter::for_item(item_id))
            .await?;
        let replayed_quantity = replay(&movements);
        let broken = first_broken_link(&movements);
        let consistent = replayed_quantity == item.current_quantity && broken.is_none();

        if !consistent {
            tracing::error!(
                item_id = %item.id,
                current = item.current_quantity,
                replayed = replayed_quantity,
                broken_at = ?broken,
                "Ledger does not match item quantity"
            );
        }

        Ok(ItemLedger {
            item_id: item.id,
            reference: item.reference,
            current_quantity: item.current_quantity,
            replayed_quantity,
            consistent,
            movements,
        })
    }
}
