//! `ebm-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: authority strings, token claims, HS256
//! signing, password hashing and the user record.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{Action, Permission};
pub use principal::Principal;
pub use user::{User, UserDraft, UserListItem};
