use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use ebm_core::CityId;
use ebm_people::City;

use crate::app::dto::{self, JsonBody, QueryParams, UfQuery};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_cities_of_state).post(save_city))
        .route("/:id", get(get_city).delete(delete_city))
}

pub async fn save_city(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<City>,
) -> Result<Response, ApiError> {
    let saved = services.registry().cities().save(body).await?;
    dto::created("/cities", saved.id)
}

pub async fn list_cities_of_state(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<UfQuery>,
) -> Result<Json<Vec<City>>, ApiError> {
    Ok(Json(services.registry().cities().find_by_state(&q.uf).await?))
}

pub async fn get_city(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<City>, ApiError> {
    let id: CityId = id.parse()?;
    Ok(Json(services.registry().cities().find_by_id(id).await?))
}

pub async fn delete_city(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CityId = id.parse()?;
    services.registry().cities().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
