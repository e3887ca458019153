//! States (federative units) and cities.

use serde::{Deserialize, Serialize};

use ebm_core::{impl_entity, CityId, DomainResult, History, StateId, Validator};

/// Federative unit, identified by its two-letter `uf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub id: Option<StateId>,
    pub uf: String,
    pub name: String,
    #[serde(default)]
    pub history: History,
}

impl_entity!(State, StateId, "states");

impl State {
    pub fn new(uf: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            uf: uf.into(),
            name: name.into(),
            history: History::default(),
        }
    }

    /// Trims the name and upper-cases the uf.
    pub fn normalize(&mut self) {
        self.uf = self.uf.trim().to_ascii_uppercase();
        self.name = self.name.trim().to_string();
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.check(
            self.uf.trim().len() == 2 && self.uf.trim().chars().all(|c| c.is_ascii_alphabetic()),
            "uf",
            "uf must have exactly 2 letters",
        )
        .text("name", Some(&self.name), 1, 60);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    #[serde(default)]
    pub id: Option<CityId>,
    pub name: String,
    #[serde(default)]
    pub state: Option<State>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(City, CityId, "cities");

impl City {
    pub fn new(name: impl Into<String>, state: State) -> Self {
        Self {
            id: None,
            name: name.into(),
            state: Some(state),
            history: History::default(),
        }
    }

    pub fn uf(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.uf.as_str())
    }

    /// Same city by natural key: case-insensitive name within the same uf.
    pub fn same_place(&self, name: &str, uf: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
            && self.uf().is_some_and(|u| u.eq_ignore_ascii_case(uf.trim()))
    }

    /// Validates the city fields. A missing state is an integrity failure
    /// reported by the service, not a field error.
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("name", Some(&self.name), 1, 60);
        if let Some(state) = &self.state {
            v.nested("state", state.validate());
        }
        v.finish()
    }
}
