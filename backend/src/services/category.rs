//! Category service

use shared::{validate_required_text, Category, CreateCategoryInput};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::store::InventoryStore;

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a category; names are unique regardless of case
    pub async fn create_category(&self, input: CreateCategoryInput) -> AppResult<Category> {
        input.validate()?;
        validate_required_text(&input.name).map_err(|message| {
            AppError::invalid("name", message, "Le nom de la catégorie est obligatoire")
        })?;

        let category = Category {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: self.clock.now(),
        };
        self.store.insert_category(&category).await?;

        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// All categories, by name
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.store.list_categories().await
    }
}
