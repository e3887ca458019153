//! Value objects: equality by value, not identity.
//!
//! The registry's only non-trivial value objects are the Brazilian taxpayer
//! documents: CPF (individuals) and CNPJ (companies). Both carry two mod-11
//! check digits that are verified on parse.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

pub const INVALID_CPF: &str = "invalid cpf";
pub const INVALID_CNPJ: &str = "invalid cnpj";
pub const INVALID_DOCUMENT: &str = "invalid document";

/// Individual taxpayer number (11 digits, stored unformatted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpf(String);

/// Company taxpayer number (14 digits, stored unformatted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cnpj(String);

impl ValueObject for Cpf {}
impl ValueObject for Cnpj {}

impl Cpf {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let digits = digits_of(raw).ok_or_else(|| DomainError::integrity(INVALID_CPF))?;
        if digits.len() != 11 || all_equal(&digits) {
            return Err(DomainError::integrity(INVALID_CPF));
        }
        let first = check_digit(&digits[..9], &[10, 9, 8, 7, 6, 5, 4, 3, 2]);
        let second = check_digit(&digits[..10], &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
        if digits[9] != first || digits[10] != second {
            return Err(DomainError::integrity(INVALID_CPF));
        }
        Ok(Self(to_string(&digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Cnpj {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let digits = digits_of(raw).ok_or_else(|| DomainError::integrity(INVALID_CNPJ))?;
        if digits.len() != 14 || all_equal(&digits) {
            return Err(DomainError::integrity(INVALID_CNPJ));
        }
        let first = check_digit(&digits[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
        let second = check_digit(&digits[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
        if digits[12] != first || digits[13] != second {
            return Err(DomainError::integrity(INVALID_CNPJ));
        }
        Ok(Self(to_string(&digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Cpf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::fmt::Display for Cnpj {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either kind of document, decided by digit count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Cpf(Cpf),
    Cnpj(Cnpj),
}

impl ValueObject for Document {}

impl Document {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match digits_of(raw).map(|d| d.len()) {
            Some(11) => Cpf::parse(raw).map(Self::Cpf),
            Some(14) => Cnpj::parse(raw).map(Self::Cnpj),
            _ => Err(DomainError::integrity(INVALID_DOCUMENT)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cpf(c) => c.as_str(),
            Self::Cnpj(c) => c.as_str(),
        }
    }
}

/// Digits of `raw` with the usual punctuation (`.`, `-`, `/`, whitespace) removed.
/// Returns `None` if anything else is present.
fn digits_of(raw: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '0'..='9' => out.push(c as u8 - b'0'),
            '.' | '-' | '/' => {}
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }
    Some(out)
}

fn all_equal(digits: &[u8]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn check_digit(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(d, w)| u32::from(*d) * w)
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        r => (11 - r) as u8,
    }
}

fn to_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_known_valid_cpfs() {
        for raw in ["56661050004", "12345678909", "98765432100", "111.444.777-35"] {
            assert!(Cpf::parse(raw).is_ok(), "{raw} should be valid");
        }
        assert_eq!(Cpf::parse("111.444.777-35").unwrap().as_str(), "11144477735");
    }

    #[test]
    fn any_whitespace_is_punctuation() {
        for raw in ["111.444.777\t-35", "111\u{a0}444\u{a0}777-35", " 111 444 777 35\n"] {
            assert_eq!(Cpf::parse(raw).unwrap().as_str(), "11144477735", "{raw:?}");
        }
        assert_eq!(Cnpj::parse("11.222.333/0001-81\t").unwrap().as_str(), "11222333000181");
    }

    #[test]
    fn rejects_bad_cpfs() {
        for raw in ["1233232323", "566610500041", "56661050005", "11111111111", "5666105000a", ""] {
            assert_eq!(
                Cpf::parse(raw).unwrap_err(),
                DomainError::integrity(INVALID_CPF),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_known_valid_cnpjs() {
        for raw in ["99787331000180", "11222333000181", "45.454.545/0001-06"] {
            assert!(Cnpj::parse(raw).is_ok(), "{raw} should be valid");
        }
    }

    #[test]
    fn rejects_bad_cnpjs() {
        for raw in ["2312412312", "99787331000181", "00000000000000", "997873310001801"] {
            assert_eq!(Cnpj::parse(raw).unwrap_err(), DomainError::integrity(INVALID_CNPJ));
        }
    }

    #[test]
    fn document_dispatches_on_length() {
        assert!(matches!(Document::parse("56661050004"), Ok(Document::Cpf(_))));
        assert!(matches!(Document::parse("99787331000180"), Ok(Document::Cnpj(_))));
        assert_eq!(
            Document::parse("566610500041").unwrap_err(),
            DomainError::integrity(INVALID_DOCUMENT)
        );
    }

    fn with_check_digits(base: &[u8]) -> Vec<u8> {
        let mut d = base.to_vec();
        d.push(check_digit(&d, &[10, 9, 8, 7, 6, 5, 4, 3, 2]));
        d.push(check_digit(&d, &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2]));
        d
    }

    proptest! {
        #[test]
        fn generated_cpfs_validate(base in proptest::collection::vec(0u8..10, 9)) {
            prop_assume!(!all_equal(&base));
            let digits = with_check_digits(&base);
            prop_assert!(Cpf::parse(&to_string(&digits)).is_ok());
        }

        #[test]
        fn altering_a_check_digit_invalidates(base in proptest::collection::vec(0u8..10, 9), bump in 1u8..10) {
            prop_assume!(!all_equal(&base));
            let mut digits = with_check_digits(&base);
            digits[10] = (digits[10] + bump) % 10;
            prop_assert!(Cpf::parse(&to_string(&digits)).is_err());
        }
    }
}
