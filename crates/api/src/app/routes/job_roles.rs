use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use ebm_core::JobRoleId;
use ebm_people::JobRole;

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_job_roles).post(create_job_role))
        .route("/:id", get(get_job_role).put(update_job_role).delete(delete_job_role))
}

pub async fn create_job_role(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<JobRole>,
) -> Result<Response, ApiError> {
    let saved = services.registry().job_roles().insert(body).await?;
    dto::created("/job-roles", saved.id)
}

pub async fn list_job_roles(Extension(services): Extension<Arc<AppServices>>) -> Result<Json<Vec<JobRole>>, ApiError> {
    Ok(Json(services.registry().job_roles().list().await?))
}

pub async fn get_job_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<JobRole>, ApiError> {
    let id: JobRoleId = id.parse()?;
    Ok(Json(services.registry().job_roles().find_by_id(id).await?))
}

pub async fn update_job_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody<JobRole>,
) -> Result<StatusCode, ApiError> {
    body.id = Some(id.parse::<JobRoleId>()?);
    services.registry().job_roles().update(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_job_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: JobRoleId = id.parse()?;
    services.registry().job_roles().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
