// ABOUTME: Instructor directory endpoints - listings, join flow and removal
// ABOUTME: The public directory is the only unauthenticated listing in the API
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Role;
use crate::pagination::{PageParams, Paginated};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Name or email substring filter
    pub search: Option<String>,
}

/// Instructor directory routes
pub struct InstructorRoutes;

impl InstructorRoutes {
    /// Create the instructor routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/instructors", get(Self::handle_list))
            .route("/api/instructors/public", get(Self::handle_public_list))
            .route("/api/instructors/:id/join", post(Self::handle_join))
            .route("/api/instructors/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Paginated instructor listing for authenticated members
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<DirectoryQuery>,
    ) -> Result<Response, AppError> {
        resources.auth_middleware.authenticate(&headers)?;

        let params = PageParams::from_query(query.page, query.page_size);
        let (instructors, total) = resources
            .database
            .list_instructors(query.search.as_deref(), params)
            .await?;

        let page = Paginated::new(instructors, total, params);
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Public directory, names only
    async fn handle_public_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let instructors = resources.database.list_all_instructors().await?;
        let listing: Vec<_> = instructors
            .iter()
            .map(|i| json!({ "id": i.id, "name": i.name }))
            .collect();

        Ok((StatusCode::OK, Json(listing)).into_response())
    }

    /// Link the calling athlete to an instructor
    async fn handle_join(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(instructor_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        if auth.role != Role::Athlete {
            return Err(AppError::forbidden("Only athletes can join an instructor"));
        }

        let instructor = resources
            .database
            .get_user(instructor_id)
            .await?
            .filter(|u| u.role == Role::Instructor)
            .ok_or_else(|| AppError::not_found("Instructor"))?;

        resources
            .database
            .set_instructor(auth.user_id, Some(instructor.id))
            .await?;

        tracing::info!(athlete_id = %auth.user_id, %instructor_id, "athlete joined instructor");

        Ok((
            StatusCode::OK,
            Json(json!({ "instructor_id": instructor.id, "instructor_name": instructor.name })),
        )
            .into_response())
    }

    /// Remove an instructor account (admin only)
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(instructor_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Admin)?;

        let deleted = resources.database.delete_instructor(instructor_id).await?;
        if !deleted {
            return Err(AppError::not_found("Instructor"));
        }

        tracing::info!(%instructor_id, "deleted instructor");

        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
