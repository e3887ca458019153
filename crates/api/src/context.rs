use ebm_auth::{JwtClaims, Principal};
use ebm_core::UserId;

/// Principal context for a request (authenticated login + authorities).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self::new(Principal::from_claims(claims))
    }

    pub fn login(&self) -> &str {
        &self.principal.login
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal.user_id
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn authorities(&self) -> Vec<&str> {
        self.principal.permissions.iter().map(|p| p.as_str()).collect()
    }
}
