//! Contact records owned by a person: emails, phones and addresses.
//!
//! Each list carries exactly one `principal` entry once normalized.

use serde::{Deserialize, Serialize};

use ebm_core::{
    impl_entity, validation::looks_like_email, AddressId, DomainError, DomainResult, EmailId,
    History, PersonId, PhoneId, Validator,
};

use crate::location::City;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    #[serde(default)]
    pub id: Option<EmailId>,
    pub email: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub principal: bool,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(Email, EmailId, "emails");

impl Email {
    pub fn new(email: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            kind: kind.into(),
            principal: false,
            person_id: None,
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("email", Some(&self.email), 5, 60)
            .check(looks_like_email(self.email.trim()), "email", "email is not well formed")
            .optional_text("kind", Some(&self.kind), 30);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    #[serde(default)]
    pub id: Option<PhoneId>,
    pub ddd: String,
    pub number: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub principal: bool,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(Phone, PhoneId, "phones");

impl Phone {
    pub fn new(ddd: impl Into<String>, number: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: None,
            ddd: ddd.into(),
            number: number.into(),
            kind: kind.into(),
            principal: false,
            person_id: None,
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.digits("ddd", &self.ddd, 2, 2)
            .digits("number", &self.number, 8, 9)
            .optional_text("kind", Some(&self.kind), 30);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub id: Option<AddressId>,
    pub street: String,
    pub neighborhood: String,
    #[serde(default)]
    pub city: Option<City>,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub cep: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub principal: bool,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(Address, AddressId, "addresses");

impl Address {
    pub fn new(
        street: impl Into<String>,
        neighborhood: impl Into<String>,
        city: City,
        number: impl Into<String>,
        complement: Option<String>,
        cep: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            street: street.into(),
            neighborhood: neighborhood.into(),
            city: Some(city),
            number: number.into(),
            complement,
            cep: cep.into(),
            kind: kind.into(),
            principal: false,
            person_id: None,
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("street", Some(&self.street), 1, 80)
            .text("neighborhood", Some(&self.neighborhood), 1, 60)
            .optional_text("number", Some(&self.number), 10)
            .optional_text("complement", self.complement.as_deref(), 100)
            .digits("cep", &self.cep, 8, 8)
            .optional_text("kind", Some(&self.kind), 30);
        if let Some(city) = &self.city {
            v.nested("city", city.validate());
        }
        v.finish()
    }
}

/// Anything that can be flagged as the principal entry of its list.
pub trait Principal {
    fn is_principal(&self) -> bool;
    fn set_principal(&mut self, principal: bool);
}

macro_rules! impl_principal {
    ($($t:ty),*) => {
        $(
            impl Principal for $t {
                fn is_principal(&self) -> bool {
                    self.principal
                }

                fn set_principal(&mut self, principal: bool) {
                    self.principal = principal;
                }
            }
        )*
    };
}

impl_principal!(Email, Phone, Address);

/// Ensures exactly one principal entry: the first entry is promoted when
/// none is flagged, more than one flagged entry is rejected.
pub fn normalize_principal<T: Principal>(field: &str, items: &mut [T]) -> DomainResult<()> {
    match items.iter().filter(|i| i.is_principal()).count() {
        0 => {
            if let Some(first) = items.first_mut() {
                first.set_principal(true);
            }
            Ok(())
        }
        1 => Ok(()),
        _ => Err(DomainError::validation(
            field,
            format!("only one {field} entry can be principal"),
        )),
    }
}

pub fn principal_of<T: Principal>(items: &[T]) -> Option<&T> {
    items.iter().find(|i| i.is_principal())
}
