use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use ebm_core::{CategoryId, Page, SupplierId};
use ebm_people::{Supplier, SupplierView};

use crate::app::dto::{self, DocumentQuery, JsonBody, PageQuery, PeopleFilterQuery, QueryParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_supplier))
        .route("/page", get(page_suppliers))
        .route("/document", get(get_supplier_by_document))
        .route("/:id", get(get_supplier).put(update_supplier).delete(delete_supplier))
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<Supplier>,
) -> Result<Response, ApiError> {
    let saved = services.registry().suppliers().insert(body).await?;
    dto::created("/suppliers", saved.id)
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody<Supplier>,
) -> Result<StatusCode, ApiError> {
    body.id = Some(id.parse::<SupplierId>()?);
    services.registry().suppliers().update(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: SupplierId = id.parse()?;
    services.registry().suppliers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<SupplierView>, ApiError> {
    let id: SupplierId = id.parse()?;
    Ok(Json(services.registry().suppliers().find_by_id(id).await?))
}

pub async fn get_supplier_by_document(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<DocumentQuery>,
) -> Result<Json<SupplierView>, ApiError> {
    Ok(Json(services.registry().suppliers().find_by_document(&q.value).await?))
}

/// `?categories=1,2` lists suppliers of any of those categories.
pub async fn page_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(q): QueryParams<PeopleFilterQuery>,
) -> Result<Json<Page<SupplierView>>, ApiError> {
    let categories: BTreeSet<CategoryId> = q.category_ids()?;
    let request = paging.to_request()?;
    Ok(Json(
        services
            .registry()
            .suppliers()
            .find_by_categories(&categories, &request)
            .await?,
    ))
}
