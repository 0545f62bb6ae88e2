//! Error types for the shelter system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelterError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// The principal lacks the required access level. Carries no
    /// detail so that it cannot reveal whether the target exists.
    #[error("Access denied")]
    AccessDenied,

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Underlying store failure. The payload is for logs only and is
    /// never part of the displayed message.
    #[error("Store failure")]
    Database(String),

    #[error("Internal error")]
    Internal(String),
}

impl ShelterError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type ShelterResult<T> = Result<T, ShelterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failure_does_not_leak_detail() {
        let err = ShelterError::Database("connection refused at 10.0.0.7:8000".into());
        assert_eq!(err.to_string(), "Store failure");
    }

    #[test]
    fn validation_carries_detail() {
        let err = ShelterError::validation("tag 42 is not owned by this group");
        assert!(err.to_string().contains("tag 42"));
    }
}
