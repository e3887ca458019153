use axum::{routing::get, Router};

use crate::authz::{self, Resource};

pub mod categories;
pub mod cities;
pub mod contacts;
pub mod customers;
pub mod employees;
pub mod job_roles;
pub mod people;
pub mod states;
pub mod suppliers;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints. Each resource requires the
/// `<RESOURCE>_<ACTION>` authority matching the request verb.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/states", guarded(states::router(), "STATE"))
        .nest("/cities", guarded(cities::router(), "CITY"))
        .nest("/addresses", guarded(contacts::addresses_router(), "ADDRESS"))
        .nest("/phones", guarded(contacts::phones_router(), "PHONE"))
        .nest("/emails", guarded(contacts::emails_router(), "EMAIL"))
        .nest("/people", guarded(people::router(), "PERSON"))
        .nest("/job-roles", guarded(job_roles::router(), "JOB_ROLE"))
        .nest("/employees", guarded(employees::router(), "EMPLOYEE"))
        .nest("/suppliers", guarded(suppliers::router(), "SUPPLIER"))
        .nest("/customers", guarded(customers::router(), "CUSTOMER"))
        .nest("/categories", guarded(categories::router(), "ITEM_AUX"))
        .nest("/users", guarded(users::router(), "USER"))
}

fn guarded(router: Router, resource: &'static str) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        Resource(resource),
        authz::require_authority,
    ))
}
