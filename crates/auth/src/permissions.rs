use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque authority strings of the form `<RESOURCE>_<ACTION>`
/// (e.g. `"USER_POST"`). The wildcard `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Builds `<RESOURCE>_<ACTION>`.
    pub fn of(resource: &str, action: Action) -> Self {
        Self(Cow::Owned(format!("{}_{}", resource, action.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Action half of an authority, derived from the HTTP verb of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Get,
    Post,
    Put,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Maps an HTTP method name. `PATCH` counts as `PUT`, `HEAD` as `GET`.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "GET" | "HEAD" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" | "PATCH" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_resource_action_authority() {
        assert_eq!(Permission::of("ITEM_AUX", Action::Post).as_str(), "ITEM_AUX_POST");
        assert_eq!(Permission::of("USER", Action::Delete).to_string(), "USER_DELETE");
    }

    #[test]
    fn method_mapping() {
        assert_eq!(Action::from_method("PATCH"), Some(Action::Put));
        assert_eq!(Action::from_method("HEAD"), Some(Action::Get));
        assert_eq!(Action::from_method("OPTIONS"), None);
    }

    #[test]
    fn wildcard() {
        assert!(Permission::WILDCARD.is_wildcard());
        assert!(!Permission::new("STATE_GET").is_wildcard());
    }
}
