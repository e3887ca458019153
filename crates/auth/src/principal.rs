use serde::{Deserialize, Serialize};

use ebm_core::UserId;

use crate::claims::JwtClaims;
use crate::permissions::Permission;

/// A fully resolved, authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub login: String,
    pub user_id: Option<UserId>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            login: claims.sub.clone(),
            user_id: claims.user_id,
            permissions: claims.authorities.iter().cloned().map(Permission::new).collect(),
        }
    }

    pub fn has_wildcard(&self) -> bool {
        self.permissions.iter().any(Permission::is_wildcard)
    }
}
