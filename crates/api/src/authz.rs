//! Route-level authorization.
//!
//! Every protected resource router is wrapped with [`require_authority`],
//! which derives the `<RESOURCE>_<ACTION>` authority from the resource name
//! and the HTTP verb of the request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use ebm_auth::{authorize, Action, AuthzError, Permission};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

/// Authority base of a resource router (e.g. `STATE`, `ITEM_AUX`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource(pub &'static str);

pub fn authorize_action(
    principal: &PrincipalContext,
    resource: Resource,
    action: Action,
) -> Result<(), AuthzError> {
    authorize(principal.principal(), &Permission::of(resource.0, action))
}

pub async fn require_authority(State(resource): State<Resource>, req: Request, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>() else {
        return ApiError::Unauthenticated.into_response();
    };
    let Some(action) = Action::from_method(req.method().as_str()) else {
        return ApiError::Forbidden(AuthzError::Forbidden(format!("{}_{}", resource.0, req.method()))).into_response();
    };
    if let Err(e) = authorize_action(principal, resource, action) {
        tracing::warn!(login = principal.login(), error = %e, "request forbidden");
        return ApiError::Forbidden(e).into_response();
    }
    next.run(req).await
}
