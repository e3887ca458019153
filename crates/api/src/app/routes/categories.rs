use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use ebm_core::CategoryId;
use ebm_people::ItemCategory;

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<ItemCategory>,
) -> Result<Response, ApiError> {
    let saved = services.registry().categories().insert(body).await?;
    dto::created("/categories", saved.id)
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<ItemCategory>>, ApiError> {
    Ok(Json(services.registry().categories().list().await?))
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ItemCategory>, ApiError> {
    let id: CategoryId = id.parse()?;
    Ok(Json(services.registry().categories().find_by_id(id).await?))
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody<ItemCategory>,
) -> Result<StatusCode, ApiError> {
    body.id = Some(id.parse::<CategoryId>()?);
    services.registry().categories().update(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CategoryId = id.parse()?;
    services.registry().categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
