// ABOUTME: Monthly fee endpoints - billing, listings, payment and history
// ABOUTME: Pending fees past their due date are reported late on read
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Months, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::FeeRecord;
use crate::errors::AppError;
use crate::models::{FeeStatus, MonthlyFee, PaymentMethod, PaymentRecord, Role};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
pub struct PayFeeRequest {
    pub payment_method: String,
}

/// Monthly fee routes
pub struct FeeRoutes;

impl FeeRoutes {
    /// Create the fee routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/fees/plans/:plan_id", post(Self::handle_create))
            .route("/api/fees/mine", get(Self::handle_list_mine))
            .route("/api/fees/athletes", get(Self::handle_list_all))
            .route("/api/fees/:id/pay", put(Self::handle_pay))
            .route("/api/fees/history", get(Self::handle_history))
            .with_state(resources)
    }

    fn with_effective_status(mut records: Vec<FeeRecord>) -> Vec<FeeRecord> {
        let now = Utc::now();
        for record in &mut records {
            record.fee.status = record.fee.effective_status(now);
        }
        records
    }

    /// Bill the calling athlete for a plan
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        if auth.role != Role::Athlete {
            return Err(AppError::forbidden("Only athletes can be billed for a plan"));
        }

        let plan = resources
            .database
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Plan"))?;

        let now = Utc::now();
        let fee = MonthlyFee {
            id: Uuid::new_v4(),
            user_id: auth.user_id,
            plan_id: plan.id,
            amount: plan.price,
            due_date: now + Months::new(1),
            payment_date: None,
            status: FeeStatus::Pending,
            payment_method: None,
            notes: None,
            created_at: now,
        };
        resources.database.create_fee(&fee).await?;

        tracing::info!(fee_id = %fee.id, %plan_id, "created monthly fee");

        Ok((StatusCode::CREATED, Json(fee)).into_response())
    }

    /// The caller's fees with plan info
    async fn handle_list_mine(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        let fees = resources.database.list_fees_for_user(auth.user_id).await?;
        Ok((StatusCode::OK, Json(Self::with_effective_status(fees))).into_response())
    }

    /// All fees with member and plan info (staff only)
    async fn handle_list_all(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;
        let fees = resources.database.list_all_fees().await?;
        Ok((StatusCode::OK, Json(Self::with_effective_status(fees))).into_response())
    }

    /// Mark a fee as paid and write the audit record (staff only)
    async fn handle_pay(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(fee_id): Path<Uuid>,
        Json(request): Json<PayFeeRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        auth.require(Role::Instructor)?;

        let method: PaymentMethod = request.payment_method.parse()?;

        let fee = resources
            .database
            .get_fee(fee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fee"))?;
        if fee.status == FeeStatus::Paid {
            return Err(AppError::conflict("Fee is already paid"));
        }

        let now = Utc::now();
        resources.database.mark_fee_paid(fee_id, method, now).await?;

        let record = PaymentRecord {
            id: Uuid::new_v4(),
            user_id: fee.user_id,
            fee_id: fee.id,
            amount: fee.amount,
            paid_at: now,
            marked_by: auth.user_id,
        };
        resources.database.create_payment_record(&record).await?;

        tracing::info!(%fee_id, marked_by = %auth.user_id, "marked fee as paid");

        Ok((StatusCode::OK, Json(record)).into_response())
    }

    /// The caller's payment history
    async fn handle_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers)?;
        let records = resources.database.list_payment_records(auth.user_id).await?;
        Ok((StatusCode::OK, Json(records)).into_response())
    }
}
