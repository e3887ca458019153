use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use ebm_core::{EmployeeId, Page};
use ebm_infra::services::EmployeeFilter;
use ebm_people::{Employee, EmployeeView};

use crate::app::dto::{self, DocumentQuery, JsonBody, PageQuery, PeopleFilterQuery, QueryParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_employee))
        .route("/page", get(page_employees))
        .route("/document", get(get_employee_by_document))
        .route("/:id", get(get_employee).put(update_employee).delete(delete_employee))
}

pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<Employee>,
) -> Result<Response, ApiError> {
    let saved = services.registry().employees().insert(body).await?;
    dto::created("/employees", saved.id)
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody<Employee>,
) -> Result<StatusCode, ApiError> {
    body.id = Some(id.parse::<EmployeeId>()?);
    services.registry().employees().update(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: EmployeeId = id.parse()?;
    services.registry().employees().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeView>, ApiError> {
    let id: EmployeeId = id.parse()?;
    Ok(Json(services.registry().employees().find_by_id(id).await?))
}

pub async fn get_employee_by_document(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(q): QueryParams<DocumentQuery>,
) -> Result<Json<EmployeeView>, ApiError> {
    Ok(Json(services.registry().employees().find_by_document(&q.value).await?))
}

pub async fn page_employees(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(q): QueryParams<PeopleFilterQuery>,
) -> Result<Json<Page<EmployeeView>>, ApiError> {
    let filter = EmployeeFilter {
        kind: q.kind()?,
        name: q.name,
        trade_name: q.trade_name,
        legal_name: q.legal_name,
        job_role: q.job_role,
    };
    let request = paging.to_request()?;
    Ok(Json(services.registry().employees().page(&filter, &request).await?))
}
