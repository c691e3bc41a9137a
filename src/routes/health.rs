// ABOUTME: Liveness and readiness endpoints
// ABOUTME: Used by deployment probes, no authentication
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

/// Health check routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health routes
    pub fn routes() -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
    }

    async fn handle_health() -> Response {
        (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
    }

    async fn handle_ready() -> Response {
        (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response()
    }
}
