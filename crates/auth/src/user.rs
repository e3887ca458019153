//! User accounts.
//!
//! A user is the login of an employee. Stored records carry an Argon2 hash;
//! the plaintext password only ever travels inside a [`UserDraft`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ebm_core::{impl_entity, DomainResult, EmployeeId, History, UserId, Validator};

use crate::Permission;

pub const LOGIN_MIN: usize = 3;
pub const LOGIN_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 3;
pub const PASSWORD_MAX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    pub login: String,
    pub password_hash: String,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(User, UserId, "users");

impl User {
    pub fn authorities(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.as_str().to_string()).collect()
    }
}

/// Incoming user data, password in plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
}

impl UserDraft {
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            id: None,
            login: Some(login.into()),
            password: Some(password.into()),
            permissions: permissions.into_iter().collect(),
            employee_id: Some(employee_id),
        }
    }

    /// On update the password may be omitted to keep the stored hash.
    pub fn validate(&self, password_required: bool) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("login", self.login.as_deref(), LOGIN_MIN, LOGIN_MAX);
        if password_required || self.password.is_some() {
            v.text("password", self.password.as_deref(), PASSWORD_MIN, PASSWORD_MAX);
        }
        v.check(
            !self.permissions.is_empty(),
            "permissions",
            "permissions must not be empty",
        );
        for p in &self.permissions {
            v.check(!p.as_str().trim().is_empty(), "permissions", "permission must not be blank");
        }
        v.finish()
    }
}

/// Row of the paged user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListItem {
    pub id: UserId,
    pub name: String,
    pub login: String,
    pub email: Option<String>,
}
