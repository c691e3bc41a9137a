// ABOUTME: JWT-based user authentication with role claims
// ABOUTME: Token generation and validation against the configured shared secret
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Authentication
//!
//! HS256 JWT issuing and validation. Tokens carry the user id and role;
//! the role-hierarchy check itself lives in the auth middleware.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired { expired_at } => {
                write!(
                    f,
                    "JWT token expired at {}",
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => {
                write!(f, "JWT token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "JWT token is malformed: {details}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// `JWT` claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User role at issue time
    pub role: Role,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authentication manager for `JWT` tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager from the shared secret
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_hours,
        }
    }

    /// Configured token lifetime in seconds
    #[must_use]
    pub const fn token_expiry_secs(&self) -> i64 {
        self.token_expiry_hours * 3600
    }

    /// Generate a `JWT` token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Validate a token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the token is expired, carries an
    /// invalid signature, or is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e, token))
    }

    /// Extract the user id from validated claims
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is not a valid UUID.
    pub fn user_id_from_claims(claims: &Claims) -> Result<Uuid> {
        Uuid::parse_str(&claims.sub)
            .with_context(|| format!("Invalid user ID in JWT subject: {}", claims.sub))
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error, token: &str) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;
        tracing::warn!("JWT token validation failed: {:?}", e.kind());

        match e.kind() {
            ErrorKind::ExpiredSignature => {
                let expired_at = Self::decode_expiry_unchecked(token).unwrap_or_else(Utc::now);
                JwtValidationError::TokenExpired { expired_at }
            }
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }

    /// Read the expiry of a token we already know is expired, for error reporting
    fn decode_expiry_unchecked(token: &str) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        // Signature was already verified before the expiry check fired.
        let claims = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &{
            let mut insecure = validation;
            insecure.insecure_disable_signature_validation();
            insecure
        })
        .ok()?
        .claims;

        DateTime::from_timestamp(claims.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new(b"test-secret-key", 24)
    }

    fn test_user(role: Role) -> User {
        User::with_role(
            "Daniel".into(),
            "daniel@dojo.test".into(),
            "hash".into(),
            role,
        )
    }

    #[test]
    fn test_token_round_trip() {
        let auth = manager();
        let user = test_user(Role::Instructor);
        let token = auth.generate_token(&user).unwrap();

        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.role, Role::Instructor);
        assert_eq!(AuthManager::user_id_from_claims(&claims).unwrap(), user.id);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = manager().generate_token(&test_user(Role::Athlete)).unwrap();
        let other = AuthManager::new(b"different-secret", 24);
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtValidationError::TokenInvalid { .. })
        ));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let auth = AuthManager::new(b"test-secret-key", -1);
        let token = auth.generate_token(&test_user(Role::Athlete)).unwrap();
        // Same secret, but the exp claim is an hour in the past
        let checker = manager();
        assert!(matches!(
            checker.validate_token(&token),
            Err(JwtValidationError::TokenExpired { .. })
        ));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        assert!(matches!(
            manager().validate_token("not-a-jwt"),
            Err(JwtValidationError::TokenMalformed { .. })
        ));
    }
}
