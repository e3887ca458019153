//! Trading partners: item categories, suppliers and customers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ebm_core::{
    impl_entity, CategoryId, CustomerId, DomainResult, History, PersonId, SupplierId, Validator,
};

use crate::person::{Person, PersonKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCategory {
    #[serde(default)]
    pub id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub history: History,
}

impl_entity!(ItemCategory, CategoryId, "item_categories");

impl ItemCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("name", Some(&self.name), 1, 40);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default)]
    pub id: Option<SupplierId>,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub category_ids: BTreeSet<CategoryId>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(Supplier, SupplierId, "suppliers");

impl Supplier {
    pub fn new(person_id: PersonId, category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        Self {
            id: None,
            person_id: Some(person_id),
            category_ids: category_ids.into_iter().collect(),
            history: History::default(),
        }
    }

    pub fn supplies_any(&self, categories: &BTreeSet<CategoryId>) -> bool {
        !self.category_ids.is_disjoint(categories)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.check(self.person_id.is_some(), "person_id", "person_id must not be null");
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierView {
    pub id: SupplierId,
    pub person: Person,
    pub categories: Vec<ItemCategory>,
    pub history: History,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: Option<CustomerId>,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    /// Purchase limit in cents.
    #[serde(default)]
    pub purchase_limit: u64,
    #[serde(default)]
    pub history: History,
}

impl_entity!(Customer, CustomerId, "customers");

impl Customer {
    pub fn new(person_id: PersonId, purchase_limit: u64) -> Self {
        Self {
            id: None,
            person_id: Some(person_id),
            purchase_limit,
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.check(self.person_id.is_some(), "person_id", "person_id must not be null");
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub person: Person,
    pub purchase_limit: u64,
    pub history: History,
}

/// Row of the paged customer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerListItem {
    pub id: CustomerId,
    pub name: String,
    pub kind: PersonKind,
    pub purchase_limit: u64,
}

impl CustomerListItem {
    pub fn new(id: CustomerId, person: &Person, purchase_limit: u64) -> Self {
        Self {
            id,
            name: person.name.clone(),
            kind: person.kind(),
            purchase_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_category_overlap() {
        let s = Supplier::new(PersonId::new(1), [CategoryId::new(1), CategoryId::new(3)]);
        let wanted: BTreeSet<_> = [CategoryId::new(3), CategoryId::new(4)].into();
        assert!(s.supplies_any(&wanted));
        let other: BTreeSet<_> = [CategoryId::new(2)].into();
        assert!(!s.supplies_any(&other));
    }

    #[test]
    fn category_name_is_bounded() {
        assert!(ItemCategory::new("Bebidas").validate().is_ok());
        assert!(ItemCategory::new("x".repeat(41)).validate().is_err());
    }

    #[test]
    fn customer_list_item_takes_person_name_and_kind() {
        let person = Person::company("Acme", "99787331000180", "Acme Comercio Ltda");
        let item = CustomerListItem::new(CustomerId::new(7), &person, 10_000);
        assert_eq!(item.name, "Acme");
        assert_eq!(item.kind, PersonKind::Company);
    }
}
