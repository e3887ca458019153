//! Read and delete endpoints for a person's contacts. Contacts are created
//! and replaced through `/people`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use ebm_core::{AddressId, EmailId, PhoneId};
use ebm_people::{Address, Email, Phone};

use crate::app::dto::{PersonRefQuery, QueryParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn addresses_router() -> Router {
    Router::new()
        .route("/", get(addresses_of_person))
        .route("/kinds", get(address_kinds))
        .route("/:id", get(get_address).delete(delete_address))
}

pub fn phones_router() -> Router {
    Router::new()
        .route("/", get(phones_of_person))
        .route("/:id", get(get_phone).delete(delete_phone))
}

pub fn emails_router() -> Router {
    Router::new()
        .route("/", get(emails_of_person))
        .route("/:id", get(get_email).delete(delete_email))
}

pub async fn address_kinds(Extension(services): Extension<Arc<AppServices>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(services.registry().addresses().kinds().await?))
}

pub async fn addresses_of_person(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<PersonRefQuery>,
) -> Result<Json<Vec<Address>>, ApiError> {
    Ok(Json(services.registry().addresses().find_by_person(q.person_id()?).await?))
}

pub async fn get_address(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Address>, ApiError> {
    let id: AddressId = id.parse()?;
    Ok(Json(services.registry().addresses().find_by_id(id).await?))
}

pub async fn delete_address(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: AddressId = id.parse()?;
    services.registry().addresses().delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn phones_of_person(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<PersonRefQuery>,
) -> Result<Json<Vec<Phone>>, ApiError> {
    Ok(Json(services.registry().phones().find_by_person(q.person_id()?).await?))
}

pub async fn get_phone(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Phone>, ApiError> {
    let id: PhoneId = id.parse()?;
    Ok(Json(services.registry().phones().find_by_id(id).await?))
}

pub async fn delete_phone(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: PhoneId = id.parse()?;
    services.registry().phones().delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn emails_of_person(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<PersonRefQuery>,
) -> Result<Json<Vec<Email>>, ApiError> {
    Ok(Json(services.registry().emails().find_by_person(q.person_id()?).await?))
}

pub async fn get_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Email>, ApiError> {
    let id: EmailId = id.parse()?;
    Ok(Json(services.registry().emails().find_by_id(id).await?))
}

pub async fn delete_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: EmailId = id.parse()?;
    services.registry().emails().delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
