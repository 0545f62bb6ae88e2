//! Token settings.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Ed25519 signing key, PEM. May be left empty on nodes that only
    /// verify tokens.
    pub jwt_private_key_pem: String,
    /// Ed25519 verification key, PEM.
    pub jwt_public_key_pem: String,
    /// Default: 900 (15 minutes).
    pub access_token_lifetime_secs: u64,
    /// Expected `iss` claim.
    pub jwt_issuer: String,
    /// Tolerated clock difference when checking `exp` (default: 60).
    pub clock_skew_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            jwt_issuer: "shelter".into(),
            clock_skew_secs: 60,
        }
    }
}
