use std::collections::{BTreeSet, HashMap};

use tracing::{info, instrument, warn};

use ebm_core::{CategoryId, Document, DomainError, Page, PageRequest, PersonId, SupplierId};
use ebm_people::{ItemCategory, Supplier, SupplierView};

use super::person::PersonService;
use super::{directed, now, require, unsupported_order, ServiceResult, Stores};

#[derive(Clone)]
pub struct SupplierService {
    stores: Stores,
}

impl SupplierService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    #[instrument(skip(self, supplier), fields(person_id = ?supplier.person_id))]
    pub async fn insert(&self, mut supplier: Supplier) -> ServiceResult<Supplier> {
        supplier.id = None;
        supplier.validate()?;
        let person_id = supplier
            .person_id
            .ok_or_else(|| DomainError::integrity("a supplier needs a person"))?;
        if self.stores.people.get(person_id).await?.is_none() {
            return Err(DomainError::integrity(format!("person {person_id} does not exist")).into());
        }
        let taken = self
            .stores
            .suppliers
            .list()
            .await?
            .iter()
            .any(|s| s.person_id == Some(person_id));
        if taken {
            return Err(DomainError::integrity(format!("person {person_id} is already a supplier")).into());
        }
        self.ensure_categories(&supplier.category_ids).await?;

        supplier.history.audit(now());
        let saved = self.stores.suppliers.insert(supplier).await?;
        info!(supplier_id = ?saved.id, "supplier registered");
        Ok(saved)
    }

    /// The person of a supplier cannot change.
    #[instrument(skip(self, supplier), fields(supplier_id = ?supplier.id))]
    pub async fn update(&self, mut supplier: Supplier) -> ServiceResult<Supplier> {
        let id = supplier
            .id
            .ok_or_else(|| DomainError::invalid_id("supplier id is required"))?;
        let stored = require(&*self.stores.suppliers, id).await?;
        match supplier.person_id {
            None => supplier.person_id = stored.person_id,
            Some(p) if Some(p) != stored.person_id => {
                return Err(DomainError::integrity("the person of a supplier cannot change").into());
            }
            Some(_) => {}
        }
        self.ensure_categories(&supplier.category_ids).await?;
        supplier.history.carry_over(&stored.history);
        supplier.history.audit(now());
        Ok(self.stores.suppliers.update(supplier).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: SupplierId) -> ServiceResult<()> {
        require(&*self.stores.suppliers, id).await?;
        self.stores.suppliers.delete(id).await?;
        info!(supplier_id = %id, "supplier deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: SupplierId) -> ServiceResult<SupplierView> {
        let supplier = require(&*self.stores.suppliers, id).await?;
        self.assemble(vec![supplier])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found(format!("supplier {id} has no person")).into())
    }

    pub async fn find_by_document(&self, raw: &str) -> ServiceResult<SupplierView> {
        let document = Document::parse(raw)?;
        let not_found = || DomainError::not_found(format!("no supplier with document {}", document.as_str()));

        let person = match PersonService::new(self.stores.clone()).find_by_document(raw).await {
            Ok(person) => person,
            Err(e) if e.is_not_found() => return Err(not_found().into()),
            Err(e) => return Err(e),
        };
        let supplier = self
            .stores
            .suppliers
            .list()
            .await?
            .into_iter()
            .find(|s| s.person_id.is_some() && s.person_id == person.id)
            .ok_or_else(not_found)?;
        self.assemble(vec![supplier]).await?.pop().ok_or_else(|| not_found().into())
    }

    /// Distinct suppliers of any of `categories` (all suppliers when empty),
    /// ordered by `name` or `id`.
    pub async fn find_by_categories(
        &self,
        categories: &BTreeSet<CategoryId>,
        request: &PageRequest,
    ) -> ServiceResult<Page<SupplierView>> {
        let suppliers: Vec<Supplier> = self
            .stores
            .suppliers
            .list()
            .await?
            .into_iter()
            .filter(|s| categories.is_empty() || s.supplies_any(categories))
            .collect();
        let mut views = self.assemble(suppliers).await?;

        let dir = request.direction;
        match request.order_by.as_str() {
            "name" => views.sort_by(|a, b| directed(a.person.name.to_lowercase().cmp(&b.person.name.to_lowercase()), dir)),
            "id" => views.sort_by(|a, b| directed(a.id.cmp(&b.id), dir)),
            other => return Err(unsupported_order(other).into()),
        }
        Ok(Page::slice(views, request))
    }

    async fn ensure_categories(&self, ids: &BTreeSet<CategoryId>) -> ServiceResult<()> {
        let known: BTreeSet<CategoryId> = self
            .stores
            .categories
            .list()
            .await?
            .into_iter()
            .filter_map(|c| c.id)
            .collect();
        if let Some(missing) = ids.difference(&known).next() {
            return Err(DomainError::integrity(format!("category {missing} does not exist")).into());
        }
        Ok(())
    }

    async fn assemble(&self, suppliers: Vec<Supplier>) -> ServiceResult<Vec<SupplierView>> {
        let person_ids: BTreeSet<PersonId> = suppliers.iter().filter_map(|s| s.person_id).collect();
        let mut people = PersonService::new(self.stores.clone()).by_ids(&person_ids).await?;
        let categories: HashMap<CategoryId, ItemCategory> = self
            .stores
            .categories
            .list()
            .await?
            .into_iter()
            .filter_map(|c| c.id.map(|id| (id, c)))
            .collect();

        let mut views = Vec::with_capacity(suppliers.len());
        for s in suppliers {
            let (Some(id), Some(person_id)) = (s.id, s.person_id) else {
                continue;
            };
            let Some(person) = people.remove(&person_id) else {
                warn!(supplier_id = %id, "supplier references a missing person");
                continue;
            };
            views.push(SupplierView {
                id,
                person,
                categories: s
                    .category_ids
                    .iter()
                    .filter_map(|c| categories.get(c).cloned())
                    .collect(),
                history: s.history,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::company;
    use crate::services::Registry;

    #[tokio::test]
    async fn find_by_categories_is_distinct() {
        let reg = Registry::in_memory();
        let drinks = reg.categories().insert(ItemCategory::new("Bebidas")).await.unwrap().id.unwrap();
        let food = reg.categories().insert(ItemCategory::new("Alimentos")).await.unwrap().id.unwrap();
        let tools = reg.categories().insert(ItemCategory::new("Ferramentas")).await.unwrap().id.unwrap();

        let a = reg
            .people()
            .insert(company("Distribuidora Sul", "11222333000181", "Distribuidora Sul Ltda", "a@sul.com"))
            .await
            .unwrap();
        let b = reg
            .people()
            .insert(company("Mercado Norte", "60394827000159", "Mercado Norte SA", "b@norte.com"))
            .await
            .unwrap();
        reg.suppliers().insert(Supplier::new(a.id.unwrap(), [drinks, food])).await.unwrap();
        reg.suppliers().insert(Supplier::new(b.id.unwrap(), [tools])).await.unwrap();

        let wanted: BTreeSet<_> = [drinks, food].into();
        let page = reg.suppliers().find_by_categories(&wanted, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].person.name, "Distribuidora Sul");
        assert_eq!(page.content[0].categories.len(), 2);

        let all = reg
            .suppliers()
            .find_by_categories(&BTreeSet::new(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total_elements, 2);
    }

    #[tokio::test]
    async fn unknown_category_or_person_is_rejected() {
        let reg = Registry::in_memory();
        let p = reg
            .people()
            .insert(company("Distribuidora Sul", "11222333000181", "Distribuidora Sul Ltda", "a@sul.com"))
            .await
            .unwrap();
        let err = reg
            .suppliers()
            .insert(Supplier::new(p.id.unwrap(), [CategoryId::new(9)]))
            .await
            .unwrap_err();
        assert!(err.is_integrity());

        let err = reg
            .suppliers()
            .insert(Supplier::new(PersonId::new(50), []))
            .await
            .unwrap_err();
        assert!(err.is_integrity());
    }

    #[tokio::test]
    async fn document_lookup() {
        let reg = Registry::in_memory();
        let p = reg
            .people()
            .insert(company("Distribuidora Sul", "11222333000181", "Distribuidora Sul Ltda", "a@sul.com"))
            .await
            .unwrap();
        let s = reg.suppliers().insert(Supplier::new(p.id.unwrap(), [])).await.unwrap();
        let view = reg.suppliers().find_by_document("11.222.333/0001-81").await.unwrap();
        assert_eq!(Some(view.id), s.id);

        reg.suppliers().delete(view.id).await.unwrap();
        assert!(reg
            .suppliers()
            .find_by_document("11222333000181")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
