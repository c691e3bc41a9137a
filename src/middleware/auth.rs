// ABOUTME: Authentication middleware for request authentication and authorization
// ABOUTME: Validates bearer tokens and exposes the caller's identity and role
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::errors::{AppError, AppResult};
use crate::models::Role;

/// Authenticated caller extracted from a bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Require at least the given role under the hierarchy
    ///
    /// # Errors
    ///
    /// Returns a `PermissionDenied` error when the caller's role is below
    /// `required`.
    pub fn require(&self, required: Role) -> AppResult<()> {
        if self.role.has_permission(required) {
            return Ok(());
        }
        Err(AppError::forbidden(format!(
            "This action requires the {required} role"
        )))
    }
}

/// Middleware for HTTP request authentication
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: AuthManager,
}

impl AuthMiddleware {
    /// Create new auth middleware
    #[must_use]
    pub const fn new(auth_manager: AuthManager) -> Self {
        Self { auth_manager }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the Authorization header is absent and
    /// `AuthInvalid` when the bearer token fails validation.
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let auth_header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;

        self.authenticate_token(auth_header)
    }

    /// Authenticate an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` when the header is not a bearer token or the
    /// token fails validation.
    pub fn authenticate_token(&self, auth_header: &str) -> AppResult<AuthUser> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Expected a bearer token"))?;

        let claims = self
            .auth_manager
            .validate_token(token)
            .map_err(|e| AppError::auth_invalid(e.to_string()))?;

        let user_id = AuthManager::user_id_from_claims(&claims)
            .map_err(|e| AppError::auth_invalid(e.to_string()))?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn middleware() -> (AuthMiddleware, AuthManager) {
        let manager = AuthManager::new(b"test-secret", 1);
        (AuthMiddleware::new(manager.clone()), manager)
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_missing_header_is_auth_required() {
        let (middleware, _) = middleware();
        let err = middleware.authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthRequired);
    }

    #[test]
    fn test_non_bearer_header_is_rejected() {
        let (middleware, _) = middleware();
        let err = middleware.authenticate_token("Basic abc123").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthInvalid);
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let (middleware, manager) = middleware();
        let user = User::with_role(
            "Mestre".into(),
            "mestre@dojo.test".into(),
            "hash".into(),
            Role::Instructor,
        );
        let token = manager.generate_token(&user).unwrap();

        let auth = middleware.authenticate(&bearer_headers(&token)).unwrap();
        assert_eq!(auth.user_id, user.id);
        assert_eq!(auth.role, Role::Instructor);
        assert!(auth.require(Role::Athlete).is_ok());
        assert!(auth.require(Role::Admin).is_err());
    }
}
