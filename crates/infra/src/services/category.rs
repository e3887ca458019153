use tracing::{info, instrument};

use ebm_core::{CategoryId, DomainError};
use ebm_people::ItemCategory;

use super::{now, require, ServiceResult, Stores};

#[derive(Clone)]
pub struct CategoryService {
    stores: Stores,
}

impl CategoryService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn insert(&self, mut category: ItemCategory) -> ServiceResult<ItemCategory> {
        category.id = None;
        category.name = category.name.trim().to_string();
        category.validate()?;
        self.ensure_name_free(&category).await?;
        category.history.audit(now());
        let saved = self.stores.categories.insert(category).await?;
        info!(category_id = ?saved.id, "item category registered");
        Ok(saved)
    }

    pub async fn update(&self, mut category: ItemCategory) -> ServiceResult<ItemCategory> {
        let id = category
            .id
            .ok_or_else(|| DomainError::invalid_id("category id is required"))?;
        let stored = require(&*self.stores.categories, id).await?;
        category.name = category.name.trim().to_string();
        category.validate()?;
        self.ensure_name_free(&category).await?;
        category.history.carry_over(&stored.history);
        category.history.audit(now());
        Ok(self.stores.categories.update(category).await?)
    }

    /// Fails with `DataIntegrity` while a supplier lists the category.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> ServiceResult<()> {
        let category = require(&*self.stores.categories, id).await?;
        let in_use = self
            .stores
            .suppliers
            .list()
            .await?
            .iter()
            .any(|s| s.category_ids.contains(&id));
        if in_use {
            return Err(DomainError::integrity(format!("category {} is supplied by a supplier", category.name)).into());
        }
        self.stores.categories.delete(id).await?;
        info!(category_id = %id, "item category deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: CategoryId) -> ServiceResult<ItemCategory> {
        require(&*self.stores.categories, id).await
    }

    pub async fn list(&self) -> ServiceResult<Vec<ItemCategory>> {
        let mut categories = self.stores.categories.list().await?;
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    async fn ensure_name_free(&self, category: &ItemCategory) -> ServiceResult<()> {
        let taken = self
            .stores
            .categories
            .list()
            .await?
            .iter()
            .any(|c| c.id != category.id && c.name.eq_ignore_ascii_case(&category.name));
        if taken {
            return Err(DomainError::integrity(format!("category {} already registered", category.name)).into());
        }
        Ok(())
    }
}
