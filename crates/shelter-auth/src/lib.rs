//! Shelter Auth: signed access tokens, the authenticated [`Principal`]
//! and the group [`AccessEvaluator`].

pub mod access;
pub mod config;
pub mod error;
pub mod principal;
pub mod token;

pub use access::{AccessEvaluator, AccessLevel};
pub use config::AuthConfig;
pub use error::AuthError;
pub use principal::Principal;
pub use token::{AccessTokenClaims, TokenKeys, ValidatedClaims};
