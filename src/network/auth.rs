//! JWT Authentication
//!
//! Validates JWTs from an external identity provider and turns the subject
//! claim into the caller address used for every submitted transaction.
//! The server does NOT issue tokens - only validates them.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::Address;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected issuer claim ("iss"). If None, any issuer accepted.
    pub issuer: Option<String>,
    /// Expected audience claim ("aud"). If None, any audience accepted.
    pub audience: Option<String>,
    /// RS256 public key in PEM format (preferred for external providers).
    pub public_key_pem: Option<String>,
    /// HS256 secret (fallback for simple setups).
    pub secret: Option<String>,
    /// Whether to skip expiry validation (for testing only).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            issuer: std::env::var("AUTH_ISSUER").ok(),
            audience: std::env::var("AUTH_AUDIENCE").ok(),
            public_key_pem: std::env::var("AUTH_PUBLIC_KEY_PEM").ok(),
            secret: std::env::var("AUTH_SECRET").ok(),
            skip_expiry: std::env::var("AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Check if authentication is configured.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Standard JWT claims we expect from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the caller's 20-byte address as hex.
    pub sub: String,
    /// Expiry timestamp (Unix seconds).
    #[serde(default)]
    pub exp: u64,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Attested caller address.
    pub fn caller(&self) -> Result<Address, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No authentication configured on server.
    #[error("authentication not configured")]
    NotConfigured,
    /// Token format is invalid.
    #[error("invalid token format")]
    InvalidFormat,
    /// Token signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// Token has expired.
    #[error("token expired")]
    Expired,
    /// Issuer claim doesn't match expected value.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Audience claim doesn't match expected value.
    #[error("invalid audience")]
    InvalidAudience,
    /// Required claim is missing.
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Subject is not an address.
    #[error("subject is not an address: {0}")]
    InvalidSubject(String),
    /// JWT decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Validate a JWT token and extract claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    if !config.is_configured() {
        return Err(AuthError::NotConfigured);
    }

    // Determine algorithm based on config
    let algorithm = if config.public_key_pem.is_some() {
        Algorithm::RS256
    } else {
        Algorithm::HS256
    };

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = std::collections::HashSet::new();

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }

    if let Some(ref audience) = config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }

    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let token_data: TokenData<TokenClaims> = if let Some(ref pem) = config.public_key_pem {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::DecodeError(format!("invalid public key: {}", e)))?;
        decode(token, &key, &validation).map_err(map_jwt_error)?
    } else if let Some(ref secret) = config.secret {
        let key = DecodingKey::from_secret(secret.as_bytes());
        decode(token, &key, &validation).map_err(map_jwt_error)?
    } else {
        return Err(AuthError::NotConfigured);
    };

    let claims = token_data.claims;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub".into()));
    }

    // Manual expiry check (in case validation was skipped)
    if !config.skip_expiry && claims.exp > 0 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
    }

    Ok(claims)
}

/// Validate a token and return the attested caller.
pub fn authenticate(token: &str, config: &AuthConfig) -> Result<Address, AuthError> {
    validate_token(token, config)?.caller()
}

/// Map JWT library errors to our error type.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-key-256-bits-long!!";
    const ALICE: &str = "0x00000000000000000000000000000000000000a1";

    fn create_test_token(claims: &TokenClaims, secret: &str) -> String {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&header, claims, &key).unwrap()
    }

    fn test_claims() -> TokenClaims {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        TokenClaims {
            sub: ALICE.into(),
            exp: now + 3600,
            iat: now,
            iss: Some("test-issuer".into()),
            aud: Some(serde_json::json!("test-audience")),
        }
    }

    fn secret_config() -> AuthConfig {
        AuthConfig {
            secret: Some(SECRET.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_token_yields_caller() {
        let token = create_test_token(&test_claims(), SECRET);

        let caller = authenticate(&token, &secret_config()).unwrap();
        assert_eq!(caller, Address::with_last_byte(0xA1));
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = test_claims();
        claims.exp = 1;
        let token = create_test_token(&claims, SECRET);

        let result = validate_token(&token, &secret_config());
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let token = create_test_token(&test_claims(), "correct-secret-key-here!!!!!");

        let config = AuthConfig {
            secret: Some("wrong-secret-key-here!!!!!!".into()),
            ..Default::default()
        };

        let result = validate_token(&token, &config);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_missing_sub_rejected() {
        let mut claims = test_claims();
        claims.sub = String::new();
        let token = create_test_token(&claims, SECRET);

        let result = validate_token(&token, &secret_config());
        assert!(matches!(result, Err(AuthError::MissingClaim(_))));
    }

    #[test]
    fn test_non_address_subject_rejected() {
        let mut claims = test_claims();
        claims.sub = "user123".into();
        let token = create_test_token(&claims, SECRET);

        let result = authenticate(&token, &secret_config());
        assert!(matches!(result, Err(AuthError::InvalidSubject(_))));
    }

    #[test]
    fn test_issuer_validation() {
        let token = create_test_token(&test_claims(), SECRET);

        let config = AuthConfig {
            issuer: Some("wrong-issuer".into()),
            ..secret_config()
        };

        let result = validate_token(&token, &config);
        assert!(matches!(result, Err(AuthError::InvalidIssuer)));
    }

    #[test]
    fn test_not_configured_error() {
        let config = AuthConfig::default();
        let result = validate_token("some.jwt.token", &config);
        assert!(matches!(result, Err(AuthError::NotConfigured)));
    }

    #[test]
    fn test_skip_expiry_for_testing() {
        let mut claims = test_claims();
        claims.exp = 1;
        let token = create_test_token(&claims, SECRET);

        let config = AuthConfig {
            skip_expiry: true,
            ..secret_config()
        };

        assert!(validate_token(&token, &config).is_ok());
    }
}
