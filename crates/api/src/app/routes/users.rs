use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use ebm_auth::{UserDraft, UserListItem};
use ebm_core::{Page, UserId};
use ebm_infra::services::UserFilter;

use crate::app::dto::{self, DocumentQuery, JsonBody, PageQuery, PeopleFilterQuery, QueryParams, UserView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user))
        .route("/page", get(page_users))
        .route("/document", get(get_user_by_document))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<UserDraft>,
) -> Result<Response, ApiError> {
    let saved = services.registry().users().insert(body).await?;
    dto::created("/users", saved.id)
}

/// Omitting `password` keeps the stored one.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UserDraft>,
) -> Result<StatusCode, ApiError> {
    let id: UserId = id.parse()?;
    services.registry().users().update(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: UserId = id.parse()?;
    services.registry().users().delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let id: UserId = id.parse()?;
    Ok(Json(services.registry().users().find_by_id(id).await?.into()))
}

pub async fn get_user_by_document(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<DocumentQuery>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(services.registry().users().find_by_document(&q.value).await?.into()))
}

pub async fn page_users(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(q): QueryParams<PeopleFilterQuery>,
) -> Result<Json<Page<UserListItem>>, ApiError> {
    let filter = UserFilter {
        name: q.name,
        login: q.login,
        email: q.email,
    };
    let request = paging.to_request()?;
    Ok(Json(services.registry().users().page(&filter, &request).await?))
}
