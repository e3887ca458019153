//! Uniform JSON error responses: `{ "error": code, "message": text }`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use ebm_auth::{AuthzError, JwtError};
use ebm_core::DomainError;
use ebm_infra::{ServiceError, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Malformed body or query string.
    #[error("{0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{0}")]
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::Service(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Service(ServiceError::Domain(e)) => domain_error_to_response(e),
            Self::Service(ServiceError::Store(e)) => {
                tracing::error!(error = %e, "store failure");
                let code = match e {
                    StoreError::Serialization { .. } => "serialization_error",
                    _ => "store_error",
                };
                json_error(StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            Self::Service(ServiceError::Password(e)) => {
                tracing::error!(error = %e, "password hashing failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
            }
            Self::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Unauthenticated => json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required"),
            Self::Forbidden(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
            }
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "validation_error",
                "message": format!("{} field(s) rejected", errors.len()),
                "errors": errors,
            })),
        )
            .into_response(),
        DomainError::DataIntegrity(msg) => json_error(StatusCode::BAD_REQUEST, "data_integrity", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid credentials"),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebm_core::FieldError;

    #[test]
    fn status_mapping() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(DomainError::not_found("x").into()), StatusCode::NOT_FOUND);
        assert_eq!(status(DomainError::integrity("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(DomainError::invalid_id("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DomainError::Validation(vec![FieldError::new("name", "required")]).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(DomainError::Unauthorized.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(AuthzError::Forbidden("STATE_GET".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(ServiceError::Store(StoreError::backend("get", "down")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
