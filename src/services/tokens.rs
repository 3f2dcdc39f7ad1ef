//! Bearer-token issuance and verification for administrators.
//!
//! All key material, the signing algorithm, and both expiry durations come
//! from the injected [`AuthConfig`]; nothing here reads globals. Access and
//! refresh tokens share the same claim shape and differ only in lifetime.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Administrator id
    pub uid: i32,
    /// Expiration timestamp (seconds since epoch)
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid or expired token")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        };

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm,
            access_ttl: Duration::minutes(config.access_token_minutes),
            refresh_ttl: Duration::days(config.refresh_token_days),
        })
    }

    /// Short-lived token presented on every authenticated admin request.
    pub fn sign_access(&self, admin_id: i32, username: &str) -> Result<String, TokenError> {
        self.sign_with_ttl(admin_id, username, self.access_ttl)
    }

    /// Long-lived token accepted only by the refresh endpoint.
    pub fn sign_refresh(&self, admin_id: i32, username: &str) -> Result<String, TokenError> {
        self.sign_with_ttl(admin_id, username, self.refresh_ttl)
    }

    fn sign_with_ttl(
        &self,
        admin_id: i32,
        username: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let expiration = Utc::now() + ttl;
        let claims = Claims {
            sub: username.to_owned(),
            uid: admin_id,
            exp: usize::try_from(expiration.timestamp()).unwrap_or(usize::MAX),
        };

        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(self.algorithm))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::from_config(&AuthConfig {
            secret_key: "test-secret".to_string(),
            algorithm: "HS256".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 15,
        })
        .unwrap()
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let signer = signer();
        let token = signer.sign_access(7, "chair").unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.sub, "chair");
        assert_eq!(claims.uid, 7);
    }

    #[test]
    fn test_refresh_token_verifies_too() {
        let signer = signer();
        let token = signer.sign_refresh(7, "chair").unwrap();
        assert!(signer.verify(&token).is_ok());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(signer().verify("not-a-token").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().sign_access(7, "chair").unwrap();

        let other = TokenSigner::from_config(&AuthConfig {
            secret_key: "different-secret".to_string(),
            algorithm: "HS256".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 15,
        })
        .unwrap();

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let token = signer
            .sign_with_ttl(7, "chair", Duration::hours(-2))
            .unwrap();
        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result = TokenSigner::from_config(&AuthConfig {
            secret_key: "test-secret".to_string(),
            algorithm: "ROT13".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 15,
        });
        assert!(matches!(result, Err(TokenError::UnsupportedAlgorithm(_))));
    }
}
