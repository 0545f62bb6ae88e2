//! Shelter Server: configuration loading and service wiring.
//!
//! The binary in `main.rs` is a thin shell around [`App`]; everything
//! it assembles is reachable from here so it can be exercised against an
//! in-memory store.

pub mod app;
pub mod config;
pub mod email;
pub mod error;

pub use app::App;
pub use config::{AppConfig, EmailConfig};
pub use email::LogEmailSender;
pub use error::AppError;
