// ABOUTME: Instructor credential endpoints - issuing, listing and revocation
// ABOUTME: Deleting a consumed credential demotes the linked user to athlete
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{InstructorCredential, Role};
use crate::pagination::{PageParams, Paginated};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
pub struct IssueCredentialRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Filter by usage state
    pub is_used: Option<bool>,
    /// Code substring filter
    pub search: Option<String>,
}

/// Instructor credential routes
pub struct CredentialRoutes;

impl CredentialRoutes {
    /// Create the credential routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/credentials",
                post(Self::handle_issue).get(Self::handle_list),
            )
            .route(
                "/api/credentials/:id",
                get(Self::handle_get).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Issue a new credential (admin only)
    async fn handle_issue(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<IssueCredentialRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Admin)?;

        if !InstructorCredential::is_valid_code(&request.code) {
            return Err(AppError::invalid_input(
                "Credential code must be exactly 9 digits",
            ));
        }
        if resources
            .database
            .get_credential_by_code(&request.code)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Credential code already exists"));
        }

        let credential = InstructorCredential::new(request.code);
        resources.database.create_credential(&credential).await?;

        tracing::info!(credential_id = %credential.id, "issued instructor credential");

        Ok((StatusCode::CREATED, Json(credential)).into_response())
    }

    /// Paginated credential listing (admin only)
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<CredentialQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Admin)?;

        let params = PageParams::from_query(query.page, query.page_size);
        let (credentials, total) = resources
            .database
            .list_credentials(query.is_used, query.search.as_deref(), params)
            .await?;

        let page = Paginated::new(credentials, total, params);
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Fetch one credential
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(credential_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let credential = resources
            .database
            .get_credential(credential_id)
            .await?
            .ok_or_else(|| AppError::not_found("Credential"))?;

        Ok((StatusCode::OK, Json(credential)).into_response())
    }

    /// Delete a credential (admin only). A consumed credential demotes the
    /// linked instructor back to athlete.
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(credential_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Admin)?;

        let credential = resources
            .database
            .get_credential(credential_id)
            .await?
            .ok_or_else(|| AppError::not_found("Credential"))?;

        if let Some(user_id) = credential.used_by {
            resources
                .database
                .update_user_role(user_id, Role::Athlete)
                .await?;
            resources.database.set_instructor(user_id, None).await?;
            tracing::info!(%user_id, "demoted user after credential revocation");
        }

        resources.database.delete_credential(credential_id).await?;

        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
