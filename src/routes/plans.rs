// ABOUTME: Monthly subscription plan endpoints
// ABOUTME: Updates may not grow capacity and must actually change something
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{GraduationScope, MonthlyPlan, Role};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub name: String,
    pub price: f64,
    pub duration_months: u32,
    pub graduation_scopes: Vec<String>,
    pub weekly_classes: u32,
    #[serde(default)]
    pub private_lessons_included: bool,
    #[serde(default)]
    pub student_capacity: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PlanRequest {
    fn into_plan(self, id: Uuid) -> Result<MonthlyPlan, AppError> {
        let graduation_scopes = self
            .graduation_scopes
            .iter()
            .map(|s| s.parse::<GraduationScope>())
            .collect::<Result<Vec<_>, _>>()?;

        let plan = MonthlyPlan {
            id,
            name: self.name,
            price: self.price,
            duration_months: self.duration_months,
            graduation_scopes,
            weekly_classes: self.weekly_classes,
            private_lessons_included: self.private_lessons_included,
            student_capacity: self.student_capacity,
            description: self.description,
            created_at: None,
            updated_at: None,
        };
        plan.validate()?;
        Ok(plan)
    }
}

/// Monthly plan routes
pub struct PlanRoutes;

impl PlanRoutes {
    /// Create the plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/plans", post(Self::handle_create).get(Self::handle_list))
            .route("/api/plans/:id", put(Self::handle_update))
            .with_state(resources)
    }

    /// Create a plan (admin only)
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<PlanRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Admin)?;

        let plan = request.into_plan(Uuid::new_v4())?;
        resources.database.create_plan(&plan).await?;

        tracing::info!(plan_id = %plan.id, "created plan");

        Ok((StatusCode::CREATED, Json(plan)).into_response())
    }

    /// List all plans
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        resources.auth_middleware.authenticate(&headers)?;
        let plans = resources.database.list_plans().await?;
        Ok((StatusCode::OK, Json(plans)).into_response())
    }

    /// Update a plan (admin only). Capacity may only shrink and the update
    /// must change at least one field.
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
        Json(request): Json<PlanRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Admin)?;

        let existing = resources
            .database
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Plan"))?;

        let plan = request.into_plan(plan_id)?;

        // A missing capacity counts as zero, so adding one is an increase
        match (existing.student_capacity, plan.student_capacity) {
            (current, Some(new)) if new > current.unwrap_or(0) => {
                return Err(AppError::invalid_input(
                    "Student capacity cannot be increased",
                ));
            }
            (Some(_), None) => {
                return Err(AppError::invalid_input(
                    "Student capacity cannot be removed",
                ));
            }
            _ => {}
        }

        if existing.same_content(&plan) {
            return Err(AppError::invalid_input("No changes in the update"));
        }

        if !resources.database.update_plan(&plan).await? {
            return Err(AppError::not_found("Plan"));
        }

        Ok((StatusCode::OK, Json(plan)).into_response())
    }
}
