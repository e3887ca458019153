//! People registry domain module.
//!
//! Records for persons (individuals and companies), their contacts and
//! locations, and the roles a person can play: employee, supplier, customer.
//! Pure data + validation (no IO, no HTTP, no storage).

pub mod contact;
pub mod location;
pub mod person;
pub mod staff;
pub mod trade;

pub use contact::{normalize_principal, principal_of, Address, Email, Phone, Principal};
pub use location::{City, State};
pub use person::{
    CompanyDetails, Contacts, IndividualDetails, Person, PersonDetails, PersonKind, Rg,
};
pub use staff::{Employee, EmployeeView, JobRole};
pub use trade::{Customer, CustomerListItem, CustomerView, ItemCategory, Supplier, SupplierView};
