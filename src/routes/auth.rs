// ABOUTME: Registration and login endpoints issuing JWT sessions
// ABOUTME: Credential codes consumed at registration grant the instructor role
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Role, User};
use crate::resources::ServerResources;

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Pre-issued instructor credential code
    #[serde(default)]
    pub credential_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle account registration
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        if resources
            .database
            .get_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("A user with this email already exists"));
        }
        if request.password != request.confirm_password {
            return Err(AppError::invalid_input("Passwords do not match"));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // An unused credential code upgrades the account to instructor
        let credential = match &request.credential_code {
            Some(code) => {
                let credential = resources
                    .database
                    .get_credential_by_code(code)
                    .await?
                    .filter(|c| !c.is_used)
                    .ok_or_else(|| {
                        AppError::invalid_input("Invalid or already used credential code")
                    })?;
                Some(credential)
            }
            None => None,
        };
        let role = if credential.is_some() {
            Role::Instructor
        } else {
            Role::Athlete
        };

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        let user = User::with_role(request.name, request.email, password_hash, role);

        // The credential must be consumed before the account is persisted;
        // a code taken since the lookup fails the registration
        if let Some(credential) = &credential {
            let consumed = resources
                .database
                .mark_credential_used(credential.id, user.id)
                .await?;
            if !consumed {
                return Err(AppError::invalid_input(
                    "Invalid or already used credential code",
                ));
            }
        }

        resources.database.create_user(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "registered new user");

        let session = Self::session_response(&resources, &user)?;
        Ok((StatusCode::CREATED, Json(session)).into_response())
    }

    /// Handle login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let user = resources
            .database
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let valid = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;
        if !valid {
            return Err(AppError::auth_invalid("Invalid credentials"));
        }

        tracing::info!(user_id = %user.id, "user logged in");

        let session = Self::session_response(&resources, &user)?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }

    fn session_response(
        resources: &Arc<ServerResources>,
        user: &User,
    ) -> Result<SessionResponse, AppError> {
        let token = resources
            .auth_manager
            .generate_token(user)
            .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;
        let expires_at = Utc::now() + Duration::seconds(resources.auth_manager.token_expiry_secs());

        Ok(SessionResponse {
            token,
            expires_at: expires_at.to_rfc3339(),
            user: SessionUser {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                role: user.role,
            },
        })
    }
}
