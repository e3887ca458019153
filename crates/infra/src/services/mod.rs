//! Application services: one per record type, all sharing a [`Stores`]
//! bundle.
//!
//! A service call is the unit of work. Services needing a peer (a city
//! saving its state, a person saving its addresses...) construct it from the
//! same bundle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use ebm_auth::{PasswordError, User};
use ebm_core::{Direction, DomainError, Entity};
use ebm_people::{
    Address, City, Customer, Email, Employee, ItemCategory, JobRole, Person, Phone, State,
    Supplier,
};

use crate::store::{InMemoryStore, PostgresStore, Record, Store, StoreError};

pub mod category;
pub mod contact;
pub mod customer;
pub mod employee;
pub mod job_role;
pub mod location;
pub mod person;
pub mod supplier;
pub mod user;

pub use category::CategoryService;
pub use contact::{AddressService, EmailService, PhoneService};
pub use customer::{CustomerFilter, CustomerService};
pub use employee::{EmployeeFilter, EmployeeService};
pub use job_role::JobRoleService;
pub use location::{CityService, StateService};
pub use person::{PersonFilter, PersonService};
pub use supplier::SupplierService;
pub use user::{UserFilter, UserService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Domain(DomainError::DataIntegrity(_)))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound(_)))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// One store per record type.
#[derive(Clone)]
pub struct Stores {
    pub states: Arc<dyn Store<State>>,
    pub cities: Arc<dyn Store<City>>,
    pub addresses: Arc<dyn Store<Address>>,
    pub phones: Arc<dyn Store<Phone>>,
    pub emails: Arc<dyn Store<Email>>,
    pub people: Arc<dyn Store<Person>>,
    pub job_roles: Arc<dyn Store<JobRole>>,
    pub employees: Arc<dyn Store<Employee>>,
    pub suppliers: Arc<dyn Store<Supplier>>,
    pub customers: Arc<dyn Store<Customer>>,
    pub categories: Arc<dyn Store<ItemCategory>>,
    pub users: Arc<dyn Store<User>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            states: Arc::new(InMemoryStore::new()),
            cities: Arc::new(InMemoryStore::new()),
            addresses: Arc::new(InMemoryStore::new()),
            phones: Arc::new(InMemoryStore::new()),
            emails: Arc::new(InMemoryStore::new()),
            people: Arc::new(InMemoryStore::new()),
            job_roles: Arc::new(InMemoryStore::new()),
            employees: Arc::new(InMemoryStore::new()),
            suppliers: Arc::new(InMemoryStore::new()),
            customers: Arc::new(InMemoryStore::new()),
            categories: Arc::new(InMemoryStore::new()),
            users: Arc::new(InMemoryStore::new()),
        }
    }

    /// Postgres-backed stores; creates missing tables.
    pub async fn postgres(pool: PgPool) -> Result<Self, StoreError> {
        Ok(Self {
            states: pg(&pool).await?,
            cities: pg(&pool).await?,
            addresses: pg(&pool).await?,
            phones: pg(&pool).await?,
            emails: pg(&pool).await?,
            people: pg(&pool).await?,
            job_roles: pg(&pool).await?,
            employees: pg(&pool).await?,
            suppliers: pg(&pool).await?,
            customers: pg(&pool).await?,
            categories: pg(&pool).await?,
            users: pg(&pool).await?,
        })
    }
}

async fn pg<E: Record>(pool: &PgPool) -> Result<Arc<dyn Store<E>>, StoreError> {
    let store = PostgresStore::<E>::new(pool.clone());
    store.ensure_schema().await?;
    Ok(Arc::new(store))
}

/// Entry point handing out services over one [`Stores`] bundle.
#[derive(Clone)]
pub struct Registry {
    stores: Stores,
}

impl Registry {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub fn in_memory() -> Self {
        Self::new(Stores::in_memory())
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn states(&self) -> StateService {
        StateService::new(self.stores.clone())
    }

    pub fn cities(&self) -> CityService {
        CityService::new(self.stores.clone())
    }

    pub fn addresses(&self) -> AddressService {
        AddressService::new(self.stores.clone())
    }

    pub fn phones(&self) -> PhoneService {
        PhoneService::new(self.stores.clone())
    }

    pub fn emails(&self) -> EmailService {
        EmailService::new(self.stores.clone())
    }

    pub fn people(&self) -> PersonService {
        PersonService::new(self.stores.clone())
    }

    pub fn job_roles(&self) -> JobRoleService {
        JobRoleService::new(self.stores.clone())
    }

    pub fn employees(&self) -> EmployeeService {
        EmployeeService::new(self.stores.clone())
    }

    pub fn suppliers(&self) -> SupplierService {
        SupplierService::new(self.stores.clone())
    }

    pub fn customers(&self) -> CustomerService {
        CustomerService::new(self.stores.clone())
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.stores.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.stores.clone())
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Loads a record or fails with `NotFound("<collection> <id> not found")`.
pub(crate) async fn require<E: Record>(store: &dyn Store<E>, id: E::Id) -> ServiceResult<E> {
    store
        .get(id)
        .await?
        .ok_or_else(|| not_found::<E>(id).into())
}

pub(crate) fn not_found<E: Entity>(id: E::Id) -> DomainError {
    DomainError::not_found(format!("{} {} not found", E::COLLECTION, id))
}

/// Case-insensitive "contains"; an absent or blank needle matches everything.
pub(crate) fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

/// Applies the page direction to an ascending comparison.
pub(crate) fn directed(ord: std::cmp::Ordering, direction: Direction) -> std::cmp::Ordering {
    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

pub(crate) fn unsupported_order(order_by: &str) -> DomainError {
    DomainError::integrity(format!("cannot order by '{order_by}'"))
}
