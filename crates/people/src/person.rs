//! Person aggregate: an individual (CPF) or a company (CNPJ) plus its
//! contact lists.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ebm_core::{
    impl_entity, Cnpj, Cpf, DomainError, DomainResult, History, PersonId, Validator,
};

use crate::contact::{normalize_principal, principal_of, Address, Email, Phone};
use crate::location::City;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
    Individual,
    Company,
}

impl PersonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
        }
    }
}

impl core::fmt::Display for PersonKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PersonKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "company" => Ok(Self::Company),
            other => Err(DomainError::integrity(format!("unknown person kind '{other}'"))),
        }
    }
}

/// Identity card (RG) of an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rg {
    pub number: String,
    pub issuer: String,
    pub uf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualDetails {
    pub cpf: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub rg: Option<Rg>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub birthplace: Option<City>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub cnpj: String,
    pub legal_name: String,
    #[serde(default)]
    pub state_registration: Option<String>,
    #[serde(default)]
    pub municipal_registration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PersonDetails {
    Individual(IndividualDetails),
    Company(CompanyDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: Option<PersonId>,
    pub name: String,
    #[serde(flatten)]
    pub details: PersonDetails,
    #[serde(default)]
    pub emails: Vec<Email>,
    #[serde(default)]
    pub phones: Vec<Phone>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(Person, PersonId, "people");

/// Contact lists split off a person so they can be stored on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts {
    pub emails: Vec<Email>,
    pub phones: Vec<Phone>,
    pub addresses: Vec<Address>,
}

impl Person {
    pub fn individual(name: impl Into<String>, cpf: impl Into<String>) -> Self {
        Self::with_details(
            name,
            PersonDetails::Individual(IndividualDetails {
                cpf: cpf.into(),
                birth_date: None,
                rg: None,
                nationality: None,
                birthplace: None,
            }),
        )
    }

    pub fn company(
        name: impl Into<String>,
        cnpj: impl Into<String>,
        legal_name: impl Into<String>,
    ) -> Self {
        Self::with_details(
            name,
            PersonDetails::Company(CompanyDetails {
                cnpj: cnpj.into(),
                legal_name: legal_name.into(),
                state_registration: None,
                municipal_registration: None,
            }),
        )
    }

    fn with_details(name: impl Into<String>, details: PersonDetails) -> Self {
        Self {
            id: None,
            name: name.into(),
            details,
            emails: Vec::new(),
            phones: Vec::new(),
            addresses: Vec::new(),
            history: History::default(),
        }
    }

    pub fn kind(&self) -> PersonKind {
        match self.details {
            PersonDetails::Individual(_) => PersonKind::Individual,
            PersonDetails::Company(_) => PersonKind::Company,
        }
    }

    /// CPF for individuals, CNPJ for companies, as stored.
    pub fn document(&self) -> &str {
        match &self.details {
            PersonDetails::Individual(d) => &d.cpf,
            PersonDetails::Company(d) => &d.cnpj,
        }
    }

    pub fn legal_name(&self) -> Option<&str> {
        match &self.details {
            PersonDetails::Company(d) => Some(&d.legal_name),
            PersonDetails::Individual(_) => None,
        }
    }

    pub fn principal_email(&self) -> Option<&Email> {
        principal_of(&self.emails)
    }

    pub fn principal_phone(&self) -> Option<&Phone> {
        principal_of(&self.phones)
    }

    pub fn principal_address(&self) -> Option<&Address> {
        principal_of(&self.addresses)
    }

    /// Checks and canonicalizes the document (digits only). Fails with
    /// `DataIntegrity` on a bad checksum.
    pub fn normalize_document(&mut self) -> DomainResult<()> {
        match &mut self.details {
            PersonDetails::Individual(d) => d.cpf = Cpf::parse(&d.cpf)?.as_str().to_string(),
            PersonDetails::Company(d) => d.cnpj = Cnpj::parse(&d.cnpj)?.as_str().to_string(),
        }
        Ok(())
    }

    /// Flags the principal entry of each contact list.
    pub fn normalize_principals(&mut self) -> DomainResult<()> {
        normalize_principal("emails", &mut self.emails)?;
        normalize_principal("phones", &mut self.phones)?;
        normalize_principal("addresses", &mut self.addresses)
    }

    /// Takes the contact lists out, leaving them empty on `self`.
    pub fn detach_contacts(&mut self) -> Contacts {
        Contacts {
            emails: std::mem::take(&mut self.emails),
            phones: std::mem::take(&mut self.phones),
            addresses: std::mem::take(&mut self.addresses),
        }
    }

    pub fn attach_contacts(&mut self, contacts: Contacts) {
        self.emails = contacts.emails;
        self.phones = contacts.phones;
        self.addresses = contacts.addresses;
    }

    /// Field validation. Document checksums are checked separately by
    /// [`Person::normalize_document`].
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("name", Some(&self.name), 3, 60)
            .check(!self.emails.is_empty(), "emails", "emails must not be empty")
            .check(!self.phones.is_empty(), "phones", "phones must not be empty")
            .check(!self.addresses.is_empty(), "addresses", "addresses must not be empty");

        match &self.details {
            PersonDetails::Individual(d) => {
                v.text("cpf", Some(&d.cpf), 11, 14)
                    .optional_text("nationality", d.nationality.as_deref(), 40);
                if let Some(rg) = &d.rg {
                    v.text("rg.number", Some(&rg.number), 1, 20)
                        .text("rg.issuer", Some(&rg.issuer), 1, 20)
                        .check(rg.uf.trim().len() == 2, "rg.uf", "uf must have exactly 2 letters");
                }
            }
            PersonDetails::Company(d) => {
                v.text("cnpj", Some(&d.cnpj), 14, 18)
                    .text("legal_name", Some(&d.legal_name), 3, 80)
                    .optional_text("state_registration", d.state_registration.as_deref(), 20)
                    .optional_text("municipal_registration", d.municipal_registration.as_deref(), 20);
            }
        }

        for (i, e) in self.emails.iter().enumerate() {
            v.nested(&format!("emails[{i}]"), e.validate());
        }
        for (i, p) in self.phones.iter().enumerate() {
            v.nested(&format!("phones[{i}]"), p.validate());
        }
        for (i, a) in self.addresses.iter().enumerate() {
            v.nested(&format!("addresses[{i}]"), a.validate());
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::State;

    fn sample() -> Person {
        let mut p = Person::individual("Joao da Silva", "566.610.500-04");
        p.emails.push(Email::new("joao@example.com", "Pessoal"));
        p.phones.push(Phone::new("62", "999990000", "Celular"));
        p.addresses.push(Address::new(
            "Rua 1",
            "Centro",
            City::new("Goiânia", State::new("GO", "Goiás")),
            "10",
            None,
            "74000000",
            "Residencial",
        ));
        p
    }

    #[test]
    fn valid_individual_passes() {
        let mut p = sample();
        assert!(p.validate().is_ok());
        p.normalize_document().unwrap();
        assert_eq!(p.document(), "56661050004");
        assert_eq!(p.kind(), PersonKind::Individual);
    }

    #[test]
    fn bad_cpf_is_an_integrity_error() {
        let mut p = Person::individual("Joao da Silva", "12345678900");
        assert_eq!(
            p.normalize_document(),
            Err(DomainError::DataIntegrity("invalid cpf".into()))
        );
    }

    #[test]
    fn empty_contact_lists_are_rejected() {
        let p = Person::company("Acme", "99787331000180", "Acme Comercio Ltda");
        let DomainError::Validation(errors) = p.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"emails"));
        assert!(fields.contains(&"phones"));
        assert!(fields.contains(&"addresses"));
    }

    #[test]
    fn nested_contact_errors_carry_their_index() {
        let mut p = sample();
        p.phones.push(Phone::new("6", "1", ""));
        let DomainError::Validation(errors) = p.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.iter().all(|e| e.field.starts_with("phones[1].")));
    }

    #[test]
    fn detach_and_attach_round_trip() {
        let mut p = sample();
        p.normalize_principals().unwrap();
        let contacts = p.detach_contacts();
        assert!(p.emails.is_empty());
        p.attach_contacts(contacts);
        assert_eq!(p.principal_email().unwrap().email, "joao@example.com");
        assert!(p.principal_address().is_some());
    }

    #[test]
    fn json_carries_kind_tag() {
        let p = Person::company("Acme", "99787331000180", "Acme Comercio Ltda");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "company");
        assert_eq!(json["legal_name"], "Acme Comercio Ltda");

        let back: Person = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), PersonKind::Company);
    }
}
