//! The authenticated caller.

use uuid::Uuid;

use crate::token::ValidatedClaims;

/// Who is asking. Built from verified token claims, never from a
/// request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub is_site_admin: bool,
}

impl Principal {
    pub fn new(user_id: Uuid, is_site_admin: bool) -> Self {
        Self {
            user_id,
            is_site_admin,
        }
    }
}

impl From<&ValidatedClaims> for Principal {
    fn from(claims: &ValidatedClaims) -> Self {
        Self::new(claims.0.sub, claims.0.adm)
    }
}

impl From<ValidatedClaims> for Principal {
    fn from(claims: ValidatedClaims) -> Self {
        Self::from(&claims)
    }
}
