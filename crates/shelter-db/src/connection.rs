//! SurrealDB connection setup.

use std::time::Duration;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use crate::error::DbError;
use crate::schema::run_migrations;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket address, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials. An empty username skips sign-in.
    pub username: String,
    pub password: String,
    /// Connection attempts before giving up (default: 5).
    pub connect_attempts: u32,
    /// Delay before the first retry; doubles on each further attempt
    /// (default: 500).
    pub retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "shelter".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            connect_attempts: 5,
            retry_delay_ms: 500,
        }
    }
}

impl DbConfig {
    /// Delay after failed attempt `attempt` (1-based), capped at 30s.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor)).min(Duration::from_secs(30))
    }
}

/// Owns the server connection.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, sign in and select the namespace and database,
    /// retrying with exponential backoff while the server is not yet
    /// reachable.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        let attempts = config.connect_attempts.max(1);
        let mut attempt = 1;
        loop {
            match Self::try_connect(config).await {
                Ok(db) => {
                    info!(
                        url = %config.url,
                        namespace = %config.namespace,
                        database = %config.database,
                        attempt,
                        "Connected to SurrealDB"
                    );
                    return Ok(Self { db });
                }
                Err(e) if attempt < attempts => {
                    let delay = config.backoff(attempt);
                    warn!(
                        url = %config.url,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "SurrealDB not reachable"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_connect(config: &DbConfig) -> Result<Surreal<Client>, surrealdb::Error> {
        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        if !config.username.is_empty() {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }
        db.use_ns(&config.namespace).use_db(&config.database).await?;
        Ok(db)
    }

    /// Bring the schema up to date.
    pub async fn migrate(&self) -> Result<(), DbError> {
        run_migrations(&self.db).await
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = DbConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(500));
        assert_eq!(config.backoff(2), Duration::from_millis(1000));
        assert_eq!(config.backoff(4), Duration::from_millis(4000));
        assert_eq!(config.backoff(40), Duration::from_secs(30));
    }
}
