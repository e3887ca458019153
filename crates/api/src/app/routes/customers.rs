use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use ebm_core::{CustomerId, Page};
use ebm_infra::services::CustomerFilter;
use ebm_people::{Customer, CustomerListItem, CustomerView};

use crate::app::dto::{self, DocumentQuery, JsonBody, PageQuery, PeopleFilterQuery, QueryParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer))
        .route("/page", get(page_customers))
        .route("/document", get(get_customer_by_document))
        .route("/:id", get(get_customer).put(update_customer).delete(delete_customer))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<Customer>,
) -> Result<Response, ApiError> {
    let saved = services.registry().customers().insert(body).await?;
    dto::created("/customers", saved.id)
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody<Customer>,
) -> Result<StatusCode, ApiError> {
    body.id = Some(id.parse::<CustomerId>()?);
    services.registry().customers().update(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CustomerId = id.parse()?;
    services.registry().customers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerView>, ApiError> {
    let id: CustomerId = id.parse()?;
    Ok(Json(services.registry().customers().find_by_id(id).await?))
}

pub async fn get_customer_by_document(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<DocumentQuery>,
) -> Result<Json<CustomerView>, ApiError> {
    Ok(Json(services.registry().customers().find_by_document(&q.value).await?))
}

pub async fn page_customers(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(q): QueryParams<PeopleFilterQuery>,
) -> Result<Json<Page<CustomerListItem>>, ApiError> {
    let filter = CustomerFilter {
        kind: q.kind()?,
        name: q.name,
    };
    let request = paging.to_request()?;
    Ok(Json(services.registry().customers().page(&filter, &request).await?))
}
