//! Process configuration, read from a TOML file.
//!
//! ```toml
//! [database]
//! url = "127.0.0.1:8000"
//!
//! [auth]
//! jwt_public_key_pem = "..."
//!
//! [service]
//! feed_max_limit = 50
//!
//! [email]
//! from_address = "shelter@example.org"
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use shelter_auth::AuthConfig;
use shelter_db::DbConfig;
use shelter_service::ServiceConfig;

use crate::error::AppError;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SHELTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "shelter.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub auth: AuthConfig,
    pub service: ServiceConfig,
    pub email: EmailConfig,
}

/// Outbound email settings. Without a sender address announcement
/// emails are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub from_address: Option<String>,
}

impl AppConfig {
    /// Path from `SHELTER_CONFIG`, or `shelter.toml` in the working
    /// directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load from `path`. A missing file yields the defaults; an
    /// unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
            .map_err(|e| AppError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
