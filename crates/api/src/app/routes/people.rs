use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use ebm_core::{Page, PersonId};
use ebm_infra::services::PersonFilter;
use ebm_people::Person;

use crate::app::dto::{self, DocumentQuery, JsonBody, PageQuery, PeopleFilterQuery, QueryParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_person))
        .route("/page", get(page_people))
        .route("/document", get(get_person_by_document))
        .route("/:id", get(get_person).put(update_person).delete(delete_person))
}

pub async fn create_person(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<Person>,
) -> Result<Response, ApiError> {
    let saved = services.registry().people().insert(body).await?;
    dto::created("/people", saved.id)
}

/// Replaces the person, including its contact lists.
pub async fn update_person(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody<Person>,
) -> Result<StatusCode, ApiError> {
    body.id = Some(id.parse::<PersonId>()?);
    services.registry().people().update(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_person(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: PersonId = id.parse()?;
    services.registry().people().delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_person(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Person>, ApiError> {
    let id: PersonId = id.parse()?;
    Ok(Json(services.registry().people().find_by_id(id).await?))
}

pub async fn get_person_by_document(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<DocumentQuery>,
) -> Result<Json<Person>, ApiError> {
    Ok(Json(services.registry().people().find_by_document(&q.value).await?))
}

pub async fn page_people(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(q): QueryParams<PeopleFilterQuery>,
) -> Result<Json<Page<Person>>, ApiError> {
    let filter = PersonFilter {
        kind: q.kind()?,
        name: q.name,
        legal_name: q.legal_name,
        email: q.email,
    };
    let request = paging.to_request()?;
    Ok(Json(services.registry().people().page(&filter, &request).await?))
}
