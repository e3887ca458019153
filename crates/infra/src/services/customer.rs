use std::collections::BTreeSet;

use tracing::{info, instrument};

use ebm_core::{CustomerId, Document, DomainError, Page, PageRequest, PersonId};
use ebm_people::{Customer, CustomerListItem, CustomerView, PersonKind};

use super::person::PersonService;
use super::{contains_ci, directed, now, require, unsupported_order, ServiceResult, Stores};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub kind: Option<PersonKind>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    stores: Stores,
}

impl CustomerService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    #[instrument(skip(self, customer), fields(person_id = ?customer.person_id))]
    pub async fn insert(&self, mut customer: Customer) -> ServiceResult<Customer> {
        customer.id = None;
        customer.validate()?;
        let person_id = customer
            .person_id
            .ok_or_else(|| DomainError::integrity("a customer needs a person"))?;
        if self.stores.people.get(person_id).await?.is_none() {
            return Err(DomainError::integrity(format!("person {person_id} does not exist")).into());
        }
        let taken = self
            .stores
            .customers
            .list()
            .await?
            .iter()
            .any(|c| c.person_id == Some(person_id));
        if taken {
            return Err(DomainError::integrity(format!("person {person_id} is already a customer")).into());
        }

        customer.history.audit(now());
        let saved = self.stores.customers.insert(customer).await?;
        info!(customer_id = ?saved.id, "customer registered");
        Ok(saved)
    }

    /// The person of a customer cannot change.
    #[instrument(skip(self, customer), fields(customer_id = ?customer.id))]
    pub async fn update(&self, mut customer: Customer) -> ServiceResult<Customer> {
        let id = customer
            .id
            .ok_or_else(|| DomainError::invalid_id("customer id is required"))?;
        let stored = require(&*self.stores.customers, id).await?;
        match customer.person_id {
            None => customer.person_id = stored.person_id,
            Some(p) if Some(p) != stored.person_id => {
                return Err(DomainError::integrity("the person of a customer cannot change").into());
            }
            Some(_) => {}
        }
        customer.history.carry_over(&stored.history);
        customer.history.audit(now());
        Ok(self.stores.customers.update(customer).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> ServiceResult<()> {
        require(&*self.stores.customers, id).await?;
        self.stores.customers.delete(id).await?;
        info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: CustomerId) -> ServiceResult<CustomerView> {
        let customer = require(&*self.stores.customers, id).await?;
        let person_id = customer
            .person_id
            .ok_or_else(|| DomainError::not_found(format!("customer {id} has no person")))?;
        let person = PersonService::new(self.stores.clone()).find_by_id(person_id).await?;
        Ok(CustomerView {
            id,
            person,
            purchase_limit: customer.purchase_limit,
            history: customer.history,
        })
    }

    pub async fn find_by_document(&self, raw: &str) -> ServiceResult<CustomerView> {
        let document = Document::parse(raw)?;
        let not_found = || DomainError::not_found(format!("no customer with document {}", document.as_str()));

        let person = match PersonService::new(self.stores.clone()).find_by_document(raw).await {
            Ok(person) => person,
            Err(e) if e.is_not_found() => return Err(not_found().into()),
            Err(e) => return Err(e),
        };
        let customer = self
            .stores
            .customers
            .list()
            .await?
            .into_iter()
            .find(|c| c.person_id.is_some() && c.person_id == person.id)
            .ok_or_else(not_found)?;
        Ok(CustomerView {
            id: customer.id.ok_or_else(not_found)?,
            person,
            purchase_limit: customer.purchase_limit,
            history: customer.history,
        })
    }

    /// Filtered listing; `order_by` is one of `name`, `id`, `purchase_limit`.
    pub async fn page(&self, filter: &CustomerFilter, request: &PageRequest) -> ServiceResult<Page<CustomerListItem>> {
        let customers = self.stores.customers.list().await?;
        let person_ids: BTreeSet<PersonId> = customers.iter().filter_map(|c| c.person_id).collect();
        let people = PersonService::new(self.stores.clone()).by_ids(&person_ids).await?;

        let mut items: Vec<CustomerListItem> = customers
            .iter()
            .filter_map(|c| {
                let person = people.get(&c.person_id?)?;
                Some(CustomerListItem::new(c.id?, person, c.purchase_limit))
            })
            .filter(|item| filter.kind.is_none_or(|k| item.kind == k))
            .filter(|item| contains_ci(&item.name, filter.name.as_deref()))
            .collect();

        let dir = request.direction;
        match request.order_by.as_str() {
            "name" => items.sort_by(|a, b| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()), dir)),
            "id" => items.sort_by(|a, b| directed(a.id.cmp(&b.id), dir)),
            "purchase_limit" => items.sort_by(|a, b| directed(a.purchase_limit.cmp(&b.purchase_limit), dir)),
            other => return Err(unsupported_order(other).into()),
        }
        Ok(Page::slice(items, request))
    }
}
