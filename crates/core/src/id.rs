//! Strongly-typed identifiers used across the domain.
//!
//! Keys are assigned by the store on first insert (a monotonically increasing
//! 64-bit sequence per record type), mirroring a database identity column.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! define_ids {
    ($($(#[$meta:meta])* $t:ident => $name:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $t(i64);

            impl $t {
                pub const fn new(value: i64) -> Self {
                    Self(value)
                }

                pub const fn get(self) -> i64 {
                    self.0
                }
            }

            impl core::fmt::Display for $t {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    core::fmt::Display::fmt(&self.0, f)
                }
            }

            impl From<i64> for $t {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }

            impl From<$t> for i64 {
                fn from(value: $t) -> Self {
                    value.0
                }
            }

            impl FromStr for $t {
                type Err = DomainError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let value = s
                        .trim()
                        .parse::<i64>()
                        .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                    if value <= 0 {
                        return Err(DomainError::invalid_id(format!("{}: must be positive", $name)));
                    }
                    Ok(Self(value))
                }
            }
        )*
    };
}

define_ids! {
    /// Identifier of a federative unit (estado).
    StateId => "StateId";
    /// Identifier of a city.
    CityId => "CityId";
    AddressId => "AddressId";
    PhoneId => "PhoneId";
    EmailId => "EmailId";
    /// Identifier shared by individuals and companies.
    PersonId => "PersonId";
    JobRoleId => "JobRoleId";
    EmployeeId => "EmployeeId";
    SupplierId => "SupplierId";
    CustomerId => "CustomerId";
    /// Identifier of an item category offered by suppliers.
    CategoryId => "CategoryId";
    UserId => "UserId";
}
