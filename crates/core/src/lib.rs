//! `ebm-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod history;
pub mod id;
pub mod page;
pub mod validation;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldError};
pub use history::History;
pub use id::{
    AddressId, CategoryId, CityId, CustomerId, EmailId, EmployeeId, JobRoleId, PersonId, PhoneId,
    StateId, SupplierId, UserId,
};
pub use page::{Direction, Page, PageRequest};
pub use validation::Validator;
pub use value_object::{Cnpj, Cpf, Document, ValueObject};
