// ABOUTME: Exam endpoints - CRUD, sessions, registration, results and promotion
// ABOUTME: Registration enforces capacity, duplicate and belt-eligibility rules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Belt, Exam, ExamResult, ExamSession, Role, DEFAULT_MAX_PARTICIPANTS};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
pub struct ExamRequest {
    pub name: String,
    pub exam_date: DateTime<Utc>,
    /// Eligible belts in order, last entry is the target belt
    pub belt_levels: Vec<String>,
    pub max_participants: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub date: DateTime<Utc>,
    pub time: String,
    pub location: String,
    pub max_participants: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    pub grade: f64,
    #[serde(default)]
    pub observations: Option<String>,
}

/// Exam, session, registration and result routes
pub struct ExamRoutes;

impl ExamRoutes {
    /// Create the exam routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/exams", post(Self::handle_create).get(Self::handle_list))
            .route("/api/exams/mine", get(Self::handle_list_mine))
            .route("/api/exams/own", get(Self::handle_list_own))
            .route(
                "/api/exams/:id",
                put(Self::handle_update).delete(Self::handle_delete),
            )
            .route("/api/exams/:id/participants", get(Self::handle_participants))
            .route(
                "/api/exams/:id/sessions",
                get(Self::handle_list_sessions).post(Self::handle_create_session),
            )
            .route(
                "/api/exams/:id/sessions/:sid",
                put(Self::handle_update_session).delete(Self::handle_delete_session),
            )
            .route("/api/exams/sessions/:sid/register", post(Self::handle_register))
            .route(
                "/api/exams/sessions/:sid/unregister",
                post(Self::handle_unregister),
            )
            .route(
                "/api/exams/:id/results/:athlete",
                post(Self::handle_record_result),
            )
            .route("/api/exams/:id/promote/:athlete", post(Self::handle_promote))
            .with_state(resources)
    }

    fn parse_belt_levels(levels: &[String]) -> Result<Vec<Belt>, AppError> {
        if levels.is_empty() {
            return Err(AppError::invalid_input(
                "Exam must list at least one belt level",
            ));
        }
        levels.iter().map(|b| b.parse()).collect()
    }

    /// Create an exam
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ExamRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let belt_levels = Self::parse_belt_levels(&request.belt_levels)?;
        let now = Utc::now();
        let exam = Exam {
            id: Uuid::new_v4(),
            name: request.name,
            exam_date: request.exam_date,
            belt_levels,
            max_participants: request.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            created_by: auth.user_id,
            created_at: now,
            updated_at: now,
        };
        resources.database.create_exam(&exam).await?;

        tracing::info!(exam_id = %exam.id, "created exam");

        Ok((StatusCode::CREATED, Json(exam)).into_response())
    }

    /// List all exams
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        resources.auth_middleware.authenticate(&headers)?;
        let exams = resources.database.list_exams().await?;
        Ok((StatusCode::OK, Json(exams)).into_response())
    }

    /// Exams the calling athlete is registered for
    async fn handle_list_mine(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        let exams = resources.database.list_exams_for_athlete(auth.user_id).await?;
        Ok((StatusCode::OK, Json(exams)).into_response())
    }

    /// Exams created by the calling instructor
    async fn handle_list_own(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;
        let exams = resources.database.list_exams_by_creator(auth.user_id).await?;
        Ok((StatusCode::OK, Json(exams)).into_response())
    }

    /// Update an exam, creator only
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(exam_id): Path<Uuid>,
        Json(request): Json<ExamRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let belt_levels = Self::parse_belt_levels(&request.belt_levels)?;
        let now = Utc::now();
        let exam = Exam {
            id: exam_id,
            name: request.name,
            exam_date: request.exam_date,
            belt_levels,
            max_participants: request.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            created_by: auth.user_id,
            created_at: now,
            updated_at: now,
        };

        // The update is scoped to the creator, someone else's exam looks absent
        if !resources.database.update_exam(&exam).await? {
            return Err(AppError::not_found("Exam"));
        }

        Ok((StatusCode::OK, Json(exam)).into_response())
    }

    /// Delete an exam, creator only
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(exam_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        if !resources.database.delete_exam(exam_id, auth.user_id).await? {
            return Err(AppError::not_found("Exam"));
        }

        tracing::info!(%exam_id, "deleted exam");

        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Unique participants across all sessions of an exam
    async fn handle_participants(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(exam_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        if resources.database.get_exam(exam_id).await?.is_none() {
            return Err(AppError::not_found("Exam"));
        }

        let participants = resources.database.list_exam_participants(exam_id).await?;
        let listing: Vec<_> = participants
            .iter()
            .map(|p| json!({ "id": p.id, "name": p.name, "email": p.email, "belt": p.belt }))
            .collect();

        Ok((StatusCode::OK, Json(listing)).into_response())
    }

    /// List sessions of an exam
    async fn handle_list_sessions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(exam_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources.auth_middleware.authenticate(&headers)?;

        if resources.database.get_exam(exam_id).await?.is_none() {
            return Err(AppError::not_found("Exam"));
        }

        let sessions = resources.database.list_sessions(exam_id).await?;
        Ok((StatusCode::OK, Json(sessions)).into_response())
    }

    async fn owned_exam(
        resources: &Arc<ServerResources>,
        exam_id: Uuid,
        owner: Uuid,
    ) -> Result<Exam, AppError> {
        resources
            .database
            .get_exam(exam_id)
            .await?
            .filter(|e| e.created_by == owner)
            .ok_or_else(|| AppError::not_found("Exam"))
    }

    /// Schedule a session for an exam, creator only
    async fn handle_create_session(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(exam_id): Path<Uuid>,
        Json(request): Json<SessionRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let exam = Self::owned_exam(&resources, exam_id, auth.user_id).await?;

        let session = ExamSession {
            id: Uuid::new_v4(),
            exam_id: exam.id,
            date: request.date,
            time: request.time,
            location: request.location,
            max_participants: request.max_participants.unwrap_or(exam.max_participants),
            participants: Vec::new(),
        };
        resources.database.create_session(&session).await?;

        Ok((StatusCode::CREATED, Json(session)).into_response())
    }

    /// Update a session, creator only
    async fn handle_update_session(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((exam_id, session_id)): Path<(Uuid, Uuid)>,
        Json(request): Json<SessionRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let exam = Self::owned_exam(&resources, exam_id, auth.user_id).await?;

        let mut session = ExamSession {
            id: session_id,
            exam_id: exam.id,
            date: request.date,
            time: request.time,
            location: request.location,
            max_participants: request.max_participants.unwrap_or(exam.max_participants),
            participants: Vec::new(),
        };
        if !resources.database.update_session(&session).await? {
            return Err(AppError::not_found("Session"));
        }

        // Registrations survive the update
        session.participants = resources
            .database
            .list_session_participants(session_id)
            .await?;

        Ok((StatusCode::OK, Json(session)).into_response())
    }

    /// Delete a session, creator only
    async fn handle_delete_session(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((exam_id, session_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        Self::owned_exam(&resources, exam_id, auth.user_id).await?;

        if !resources.database.delete_session(exam_id, session_id).await? {
            return Err(AppError::not_found("Session"));
        }

        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Register the calling athlete for a session.
    ///
    /// Checks in order: session exists, no duplicate registration, free
    /// capacity, and the athlete's belt is eligible for the exam.
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        if auth.role != Role::Athlete {
            return Err(AppError::forbidden("Only athletes can register for exams"));
        }

        let session = resources
            .database
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))?;
        let exam = resources
            .database
            .get_exam(session.exam_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam"))?;

        if session.is_registered(auth.user_id) {
            return Err(AppError::conflict("Already registered for this session"));
        }
        if !session.has_capacity() {
            return Err(AppError::invalid_input("Session is full"));
        }

        let athlete = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        if !exam.is_eligible(athlete.belt) {
            return Err(AppError::forbidden(format!(
                "Belt {} is not eligible for this exam",
                athlete.belt
            )));
        }

        resources
            .database
            .register_participant(session_id, auth.user_id)
            .await?;

        tracing::info!(%session_id, athlete_id = %auth.user_id, "registered for exam session");

        Ok((
            StatusCode::OK,
            Json(json!({ "session_id": session_id, "exam_id": exam.id })),
        )
            .into_response())
    }

    /// Remove the calling athlete's registration from a session
    async fn handle_unregister(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        if auth.role != Role::Athlete {
            return Err(AppError::forbidden(
                "Only athletes can unregister from exams",
            ));
        }

        if resources.database.get_session(session_id).await?.is_none() {
            return Err(AppError::not_found("Session"));
        }

        let removed = resources
            .database
            .unregister_participant(session_id, auth.user_id)
            .await?;
        if !removed {
            return Err(AppError::invalid_input("Not registered for this session"));
        }

        Ok((StatusCode::OK, Json(json!({ "session_id": session_id }))).into_response())
    }

    /// Record a grade for a registered athlete
    async fn handle_record_result(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((exam_id, athlete_id)): Path<(Uuid, Uuid)>,
        Json(request): Json<ResultRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        if resources.database.get_exam(exam_id).await?.is_none() {
            return Err(AppError::not_found("Exam"));
        }
        if !resources
            .database
            .is_exam_participant(exam_id, athlete_id)
            .await?
        {
            return Err(AppError::not_found("Registration"));
        }
        if resources
            .database
            .get_result(exam_id, athlete_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "A result is already recorded for this athlete",
            ));
        }
        if !(0.0..=10.0).contains(&request.grade) {
            return Err(AppError::invalid_input("Grade must be between 0 and 10"));
        }

        let result = ExamResult {
            exam_id,
            athlete_id,
            grade: request.grade,
            observations: request.observations,
            recorded_at: Utc::now(),
        };
        resources.database.create_result(&result).await?;

        tracing::info!(%exam_id, %athlete_id, grade = request.grade, "recorded exam result");

        Ok((StatusCode::CREATED, Json(result)).into_response())
    }

    /// Promote an athlete to the exam's final belt after a passing result
    async fn handle_promote(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((exam_id, athlete_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let exam = resources
            .database
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam"))?;

        let result = resources
            .database
            .get_result(exam_id, athlete_id)
            .await?
            .ok_or_else(|| AppError::invalid_input("No result recorded for this athlete"))?;
        if !result.is_passing() {
            return Err(AppError::invalid_input(
                "Athlete was not approved in this exam",
            ));
        }

        let belt = exam
            .final_belt()
            .ok_or_else(|| AppError::invalid_input("Exam has no target belt"))?;
        if !resources.database.update_user_belt(athlete_id, belt).await? {
            return Err(AppError::not_found("Athlete"));
        }

        tracing::info!(%exam_id, %athlete_id, belt = %belt, "promoted athlete");

        Ok((
            StatusCode::OK,
            Json(json!({ "athlete_id": athlete_id, "belt": belt })),
        )
            .into_response())
    }
}
