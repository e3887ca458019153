//! Field validation helpers.
//!
//! Records validate themselves by feeding a [`Validator`]; every rule that
//! fails adds a [`FieldError`] and `finish()` reports them all at once.

use crate::error::{DomainError, DomainResult, FieldError};

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    /// Rule that holds when `ok` is true.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.error(field, message);
        }
        self
    }

    /// Required text: present, not blank, and `min..=max` characters long.
    pub fn text(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) -> &mut Self {
        match value {
            None => {
                self.error(field, format!("{field} must not be null"));
            }
            Some(v) if v.trim().is_empty() => {
                self.error(field, format!("{field} must not be empty"));
                if min > 0 {
                    self.error(field, format!("{field} must have between {min} and {max} characters"));
                }
            }
            Some(v) => {
                let len = v.chars().count();
                if len < min || len > max {
                    self.error(field, format!("{field} must have between {min} and {max} characters"));
                }
            }
        }
        self
    }

    /// Optional text: when present, at most `max` characters long.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.error(field, format!("{field} must have at most {max} characters"));
            }
        }
        self
    }

    /// ASCII digits only, `min..=max` of them.
    pub fn digits(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let ok = value.chars().all(|c| c.is_ascii_digit()) && (min..=max).contains(&value.len());
        if !ok {
            if min == max {
                self.error(field, format!("{field} must have exactly {min} digits"));
            } else {
                self.error(field, format!("{field} must have between {min} and {max} digits"));
            }
        }
        self
    }

    /// Re-roots nested errors under `prefix` (e.g. `emails[0].email`).
    pub fn nested(&mut self, prefix: &str, result: DomainResult<()>) -> &mut Self {
        match result {
            Ok(()) => {}
            Err(DomainError::Validation(errs)) => {
                for e in errs {
                    self.errors.push(FieldError::new(format!("{prefix}.{}", e.field), e.message));
                }
            }
            Err(other) => {
                self.error(prefix, other.to_string());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

/// Loose `local@domain.tld` shape check.
pub fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failing_rule() {
        let mut v = Validator::new();
        v.text("login", None, 3, 20)
            .text("password", Some(""), 3, 20)
            .check(false, "permissions", "permissions must not be empty");

        let err = v.finish().unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.field == "login"));
        assert_eq!(errors.iter().filter(|e| e.field == "password").count(), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut v = Validator::new();
        v.text("name", Some("Goiânia"), 3, 7);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn nested_errors_are_prefixed() {
        let mut inner = Validator::new();
        inner.error("cep", "cep must have exactly 8 digits");

        let mut outer = Validator::new();
        outer.nested("addresses[1]", inner.finish());
        let DomainError::Validation(errors) = outer.finish().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].field, "addresses[1].cep");
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("joao@example.com"));
        assert!(looks_like_email("a.b@mail.example.com.br"));
        assert!(!looks_like_email("joao@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("jo ao@example.com"));
        assert!(!looks_like_email("joao@@example.com"));
    }
}
