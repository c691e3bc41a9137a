// ABOUTME: User endpoints - role-specific profile, athlete rosters and belt updates
// ABOUTME: Instructors only see and promote athletes linked to them
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Belt, Role};
use crate::pagination::{PageParams, Paginated};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Name or email substring filter
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BeltUpdateRequest {
    pub belt: String,
}

/// User profile and roster routes
pub struct UserRoutes;

impl UserRoutes {
    /// Create the user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/users/me", get(Self::handle_me))
            .route("/api/users/athletes", get(Self::handle_list_athletes))
            .route(
                "/api/users/athletes/:id/belt",
                put(Self::handle_update_belt),
            )
            .with_state(resources)
    }

    /// Role-specific profile projection. Athletes see their progression
    /// fields, instructors their roster size, admins the bare account.
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        let user = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let profile = match user.role {
            Role::Athlete => json!({
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
                "belt": user.belt,
                "instructor_id": user.instructor_id,
                "joined_date": user.joined_date,
                "birth_date": user.birth_date,
                "phone": user.phone,
                "gender": user.gender,
            }),
            Role::Instructor => {
                let athlete_count = resources.database.count_athletes_of(user.id).await?;
                json!({
                    "id": user.id,
                    "name": user.name,
                    "email": user.email,
                    "role": user.role,
                    "athlete_count": athlete_count,
                })
            }
            Role::Admin => json!({
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
            }),
        };

        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// List athletes. Instructors see their own roster, admins see everyone.
    async fn handle_list_athletes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RosterQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let scope = if auth.role == Role::Admin {
            None
        } else {
            Some(auth.user_id)
        };

        let params = PageParams::from_query(query.page, query.page_size);
        let (athletes, total) = resources
            .database
            .list_athletes(scope, query.search.as_deref(), params)
            .await?;

        let page = Paginated::new(athletes, total, params);
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Set an athlete's belt. The athlete must train under the caller.
    async fn handle_update_belt(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(athlete_id): Path<Uuid>,
        Json(request): Json<BeltUpdateRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let belt: Belt = request.belt.parse()?;

        let updated = resources
            .database
            .update_athlete_belt(athlete_id, auth.user_id, belt)
            .await?;
        if !updated {
            return Err(AppError::not_found("Athlete"));
        }

        tracing::info!(%athlete_id, belt = %belt, "updated athlete belt");

        Ok((StatusCode::OK, Json(json!({ "id": athlete_id, "belt": belt }))).into_response())
    }
}
