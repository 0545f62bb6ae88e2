//! Startup errors.

use shelter_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database connection failed: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] DbError),
}
