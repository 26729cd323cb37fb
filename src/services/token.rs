//! JWT issuing and validation
//!
//! Tokens are HS256-signed with the configured secret and carry the user's
//! id, email and role. There is no refresh or revocation; a token is valid
//! until `exp`.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{User, UserRole};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: TimeDelta,
}

impl TokenService {
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            // Out-of-range lifetimes surface as a signing error on `issue`
            expiration: TimeDelta::try_hours(expiration_hours).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        self.expiration.num_seconds()
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.expiration)
            .ok_or_else(|| TokenError::Signing("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> User {
        User::new("admin@techlabs.org".to_string(), "hash".to_string(), UserRole::Admin)
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("test-secret", 1);
        let user = admin();

        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.email, "admin@techlabs.org");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(tokens.expires_in(), 3600);
    }

    #[test]
    fn test_out_of_range_lifetime_fails_to_sign() {
        for hours in [10_000_000_000, i64::MAX] {
            let tokens = TokenService::new("test-secret", hours);
            assert!(matches!(tokens.issue(&admin()), Err(TokenError::Signing(_))));
        }

        let ten_years = TokenService::new("test-secret", 10 * 365 * 24);
        assert!(ten_years.issue(&admin()).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = TokenService::new("secret-a", 1).issue(&admin()).unwrap();
        let err = TokenService::new("secret-b", 1).verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_expired_token() {
        let tokens = TokenService::new("test-secret", 1);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            role: UserRole::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = tokens.sign(&claims).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_token() {
        let tokens = TokenService::new("test-secret", 1);
        assert!(matches!(tokens.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
    }
}
