pub mod directory;

pub use directory::{hash_password, AuthError, Authenticator, Principal, UserDirectory};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Issues and checks HS256 bearer tokens whose subject is a username.
///
/// Key and lifetime are fixed when the service is built at startup.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl JwtService {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, Duration::hours(security.jwt_expiry_hours as i64))
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn generate_token(&self, username: &str) -> Result<String, JwtError> {
        self.generate_token_at(username, Utc::now())
    }

    /// Token as if issued at `issued_at`; expiry is `issued_at + lifetime`.
    pub fn generate_token_at(&self, username: &str, issued_at: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims {
            sub: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// True iff the signature verifies and the token has not expired.
    pub fn is_valid(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }

    /// Subject of a token. Call `is_valid` first; an invalid token is an error.
    pub fn username(&self, token: &str) -> Result<String, JwtError> {
        Ok(self.decode(token)?.sub)
    }

    fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", Duration::hours(1)).unwrap()
    }

    #[test]
    fn fresh_token_is_valid_and_carries_username() {
        let jwt = service();
        let token = jwt.generate_token("alice").unwrap();
        assert!(jwt.is_valid(&token));
        assert_eq!(jwt.username(&token).unwrap(), "alice");
    }

    #[test]
    fn token_is_invalid_once_lifetime_elapsed() {
        let jwt = service();
        let token = jwt
            .generate_token_at("alice", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(!jwt.is_valid(&token));
        assert!(jwt.username(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let other = JwtService::new("other-secret", Duration::hours(1)).unwrap();
        let token = other.generate_token("alice").unwrap();
        assert!(!service().is_valid(&token));
    }

    #[test]
    fn garbage_is_invalid_without_panicking() {
        let jwt = service();
        assert!(!jwt.is_valid(""));
        assert!(!jwt.is_valid("not.a.token"));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            JwtService::new("", Duration::hours(1)),
            Err(JwtError::InvalidSecret)
        ));
    }
}
