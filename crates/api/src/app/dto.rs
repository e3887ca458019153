//! Request/response DTOs and extractors with uniform rejections.

use std::collections::BTreeSet;

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ebm_auth::{Permission, User};
use ebm_core::{EmployeeId, History, PageRequest, PersonId, UserId};
use ebm_people::PersonKind;

use crate::app::errors::ApiError;

/// `axum::Json` whose rejection is an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query` whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub lines_per_page: Option<u32>,
    pub order_by: Option<String>,
    pub direction: Option<String>,
}

impl PageQuery {
    pub fn to_request(&self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::from_parts(
            self.page,
            self.lines_per_page,
            self.order_by.clone(),
            self.direction.as_deref(),
        )?)
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonRefQuery {
    pub person_id: String,
}

impl PersonRefQuery {
    pub fn person_id(&self) -> Result<PersonId, ApiError> {
        Ok(self.person_id.parse()?)
    }
}

#[derive(Debug, Deserialize)]
pub struct UfQuery {
    pub uf: String,
}

/// Filters shared by the person-backed listings. Unused ones are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct PeopleFilterQuery {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub job_role: Option<String>,
    pub login: Option<String>,
    /// Comma-separated category ids.
    pub categories: Option<String>,
}

impl PeopleFilterQuery {
    pub fn kind(&self) -> Result<Option<PersonKind>, ApiError> {
        Ok(self
            .kind
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(str::parse::<PersonKind>)
            .transpose()?)
    }

    pub fn category_ids<I>(&self) -> Result<BTreeSet<I>, ApiError>
    where
        I: core::str::FromStr<Err = ebm_core::DomainError> + Ord,
    {
        let Some(raw) = self.categories.as_deref() else {
            return Ok(BTreeSet::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<I>().map_err(ApiError::from))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub authorities: Vec<String>,
}

/// A user as returned by the API; the password hash never leaves the store.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Option<UserId>,
    pub login: String,
    pub permissions: BTreeSet<Permission>,
    pub employee_id: Option<EmployeeId>,
    pub history: History,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            login: u.login,
            permissions: u.permissions,
            employee_id: u.employee_id,
            history: u.history,
        }
    }
}

/// `201 Created` with `Location: <base>/<id>` and `{ "id": id }`.
pub fn created(base: &str, id: Option<impl Into<i64>>) -> Result<Response, ApiError> {
    let id: i64 = id
        .map(Into::into)
        .ok_or_else(|| ApiError::Internal("store returned a record without id".into()))?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{base}/{id}"))],
        axum::Json(serde_json::json!({ "id": id })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebm_core::{CategoryId, Direction};

    #[test]
    fn page_query_defaults_and_rejections() {
        let req = PageQuery::default().to_request().unwrap();
        assert_eq!(req, PageRequest::default());

        let q = PageQuery {
            direction: Some("desc".into()),
            lines_per_page: Some(1000),
            ..Default::default()
        };
        let req = q.to_request().unwrap();
        assert_eq!(req.direction, Direction::Desc);
        assert_eq!(req.lines_per_page, 100);

        let q = PageQuery {
            direction: Some("sideways".into()),
            ..Default::default()
        };
        assert!(q.to_request().is_err());
    }

    #[test]
    fn category_list_parsing() {
        let q = PeopleFilterQuery {
            categories: Some("3, 1,,2".into()),
            ..Default::default()
        };
        let ids: BTreeSet<CategoryId> = q.category_ids().unwrap();
        assert_eq!(ids.len(), 3);

        let q = PeopleFilterQuery {
            categories: Some("1,x".into()),
            ..Default::default()
        };
        assert!(q.category_ids::<CategoryId>().is_err());
    }
}
