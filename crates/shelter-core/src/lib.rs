//! Shelter Core: domain models, error types and repository traits
//! shared by every crate in the workspace.
//!
//! Nothing here talks to a store. The feed merge and the dashboard
//! ranking helpers are pure functions so that the service layer and
//! the tests can share them.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ShelterError, ShelterResult};
