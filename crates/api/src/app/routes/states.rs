use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use ebm_core::StateId;
use ebm_people::State;

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_states).post(save_state))
        .route("/:id", get(get_state).delete(delete_state))
        .route("/uf/:uf", get(get_state_by_uf))
}

/// Upsert by uf: posting an existing uf updates that state.
pub async fn save_state(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<State>,
) -> Result<Response, ApiError> {
    let saved = services.registry().states().save(body).await?;
    dto::created("/states", saved.id)
}

pub async fn list_states(Extension(services): Extension<Arc<AppServices>>) -> Result<Json<Vec<State>>, ApiError> {
    Ok(Json(services.registry().states().list().await?))
}

pub async fn get_state(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<State>, ApiError> {
    let id: StateId = id.parse()?;
    Ok(Json(services.registry().states().find_by_id(id).await?))
}

pub async fn get_state_by_uf(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uf): Path<String>,
) -> Result<Json<State>, ApiError> {
    Ok(Json(services.registry().states().find_by_uf(&uf).await?))
}

pub async fn delete_state(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: StateId = id.parse()?;
    services.registry().states().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
