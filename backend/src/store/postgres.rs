//! PostgreSQL store
//!
//! Stock changes run as `BEGIN; SELECT ... FOR UPDATE; INSERT movement; UPDATE
//! item; COMMIT`, so concurrent exits on the same item are serialized by the row
//! lock. The `current_quantity >= 0` check constraint backs the same rule.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Category, Item, ItemFilter, LedgerError, Movement, MovementFilter, MovementKind, NewMovement,
    Pagination, UpdateItemInput,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use super::{InventoryStore, StoreTx};
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

const ITEM_COLUMNS: &str = "id, reference, name, description, category_id, size, color, \
     purchase_price, sale_price, current_quantity, alert_threshold, created_at, updated_at, \
     archived_at";

const MOVEMENT_COLUMNS: &str = "id, sequence, item_id, item_reference, item_name, kind, \
     quantity, unit_price, resulting_balance, note, created_at";

/// Longest pause between two connection attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    reference: String,
    name: String,
    description: Option<String>,
    category_id: Option<Uuid>,
    size: Option<String>,
    color: Option<String>,
    purchase_price: Decimal,
    sale_price: Decimal,
    current_quantity: i64,
    alert_threshold: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    archived_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            reference: row.reference,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            size: row.size,
            color: row.color,
            purchase_price: row.purchase_price,
            sale_price: row.sale_price,
            current_quantity: row.current_quantity,
            alert_threshold: row.alert_threshold,
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    sequence: i64,
    item_id: Uuid,
    item_reference: String,
    item_name: String,
    kind: String,
    quantity: i64,
    unit_price: Decimal,
    resulting_balance: i64,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for Movement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind: MovementKind = row.kind.parse().map_err(|e: LedgerError| {
            AppError::Internal(format!("Corrupt movement {}: {}", row.id, e))
        })?;
        Ok(Movement {
            id: row.id,
            sequence: row.sequence,
            item_id: row.item_id,
            item_reference: row.item_reference,
            item_name: row.item_name,
            kind,
            quantity: row.quantity,
            unit_price: row.unit_price,
            resulting_balance: row.resulting_balance,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Map unique violations to `DuplicateEntry(field)`
fn map_write_error(err: sqlx::Error, field: &str) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return AppError::DuplicateEntry(field.to_string());
        }
    }
    AppError::DatabaseError(err)
}

/// `%term%` with LIKE wildcards in `term` escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Delay before connection attempt `attempt + 1`: min(1s * 2^attempt, 10s)
pub fn retry_delay(attempt: u32) -> Duration {
    let millis = 1000u64.saturating_mul(1u64 << attempt.min(20));
    Duration::from_millis(millis).min(MAX_RETRY_DELAY)
}

/// Inventory store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the pool, retrying with exponential backoff
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let attempts = config.connect_retries.max(1);
        let mut attempt = 0;

        loop {
            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.url)
                .await;

            match result {
                Ok(pool) => {
                    tracing::info!("Database connection established");
                    return Ok(Self::new(pool));
                }
                Err(e) if attempt + 1 < attempts => {
                    let delay = retry_delay(attempt);
                    tracing::warn!(
                        "Database connection attempt {}/{} failed: {}; retrying in {:?}",
                        attempt + 1,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Giving up on database after {} attempts: {}", attempts, e);
                    return Err(AppError::StoreUnavailable(e.to_string()));
                }
            }
        }
    }

    /// Apply the embedded migrations
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn insert_category(&self, category: &Category) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "name"))?;
        Ok(())
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, created_at FROM categories ORDER BY LOWER(name)",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        let sql = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Item::from))
    }

    async fn list_items(
        &self,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Item>, u64)> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let conditions = "archived_at IS NULL \
             AND ($1::uuid IS NULL OR category_id = $1) \
             AND ($2::text IS NULL OR reference ILIKE $2 OR name ILIKE $2)";

        let count_sql = format!("SELECT COUNT(*) FROM items WHERE {}", conditions);
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.category_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM items WHERE {} ORDER BY updated_at DESC, reference LIMIT $3 OFFSET $4",
            ITEM_COLUMNS, conditions
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(filter.category_id)
            .bind(&search)
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(Item::from).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    async fn all_items(&self) -> AppResult<Vec<Item>> {
        let sql = format!("SELECT {} FROM items", ITEM_COLUMNS);
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn update_item_attributes(
        &self,
        id: Uuid,
        changes: &UpdateItemInput,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Item>> {
        let sql = format!(
            r#"
            UPDATE items SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                category_id = CASE WHEN $5 THEN $6 ELSE category_id END,
                size = CASE WHEN $7 THEN $8 ELSE size END,
                color = CASE WHEN $9 THEN $10 ELSE color END,
                purchase_price = COALESCE($11, purchase_price),
                sale_price = COALESCE($12, sale_price),
                alert_threshold = COALESCE($13, alert_threshold),
                updated_at = $14
            WHERE id = $1 AND archived_at IS NULL
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(changes.description.is_some())
            .bind(changes.description.as_ref().and_then(|d| d.as_deref()))
            .bind(changes.category_id.is_some())
            .bind(changes.category_id.flatten())
            .bind(changes.size.is_some())
            .bind(changes.size.as_ref().and_then(|s| s.as_deref()))
            .bind(changes.color.is_some())
            .bind(changes.color.as_ref().and_then(|c| c.as_deref()))
            .bind(changes.purchase_price)
            .bind(changes.sale_price)
            .bind(changes.alert_threshold)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Item::from))
    }

    async fn archive_item(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE items SET archived_at = $2, updated_at = $2 WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>> {
        let sql = format!(
            r#"
            SELECT {} FROM movements
            WHERE ($1::uuid IS NULL OR item_id = $1)
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY sequence
            "#,
            MOVEMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(filter.item_id)
            .bind(filter.kind.map(|kind| kind.as_str()))
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Movement::try_from).collect()
    }
}

/// An open PostgreSQL transaction; rolled back on drop unless committed
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_item(&mut self, item: &Item) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id, reference, name, description, category_id, size, color,
                purchase_price, sale_price, current_quantity, alert_threshold,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(item.id)
        .bind(&item.reference)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.category_id)
        .bind(&item.size)
        .bind(&item.color)
        .bind(item.purchase_price)
        .bind(item.sale_price)
        .bind(item.current_quantity)
        .bind(item.alert_threshold)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "reference"))?;
        Ok(())
    }

    async fn lock_item(&mut self, id: Uuid) -> AppResult<Option<Item>> {
        let sql = format!("SELECT {} FROM items WHERE id = $1 FOR UPDATE", ITEM_COLUMNS);
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Item::from))
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> AppResult<Movement> {
        let sql = format!(
            r#"
            INSERT INTO movements (
                id, item_id, item_reference, item_name, kind, quantity,
                unit_price, resulting_balance, note, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(movement.item_id)
            .bind(&movement.item_reference)
            .bind(&movement.item_name)
            .bind(movement.kind.as_str())
            .bind(movement.quantity)
            .bind(movement.unit_price)
            .bind(movement.resulting_balance)
            .bind(&movement.note)
            .bind(movement.created_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Movement::try_from(row)
    }

    async fn set_item_quantity(
        &mut self,
        id: Uuid,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE items SET current_quantity = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(quantity)
                .bind(at)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles_then_caps() {
        assert_eq!(retry_delay(0), Duration::from_secs(1));
        assert_eq!(retry_delay(1), Duration::from_secs(2));
        assert_eq!(retry_delay(3), Duration::from_secs(8));
        assert_eq!(retry_delay(4), Duration::from_secs(10));
        assert_eq!(retry_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("sh"), "%sh%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
