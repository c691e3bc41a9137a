// ABOUTME: HTTP route modules for the academy API
// ABOUTME: Assembles the per-resource routers into the full application router
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

mod auth;
mod credentials;
mod exams;
mod fees;
mod health;
mod instructors;
mod plans;
mod users;

pub use auth::AuthRoutes;
pub use credentials::CredentialRoutes;
pub use exams::ExamRoutes;
pub use fees::FeeRoutes;
pub use health::HealthRoutes;
pub use instructors::InstructorRoutes;
pub use plans::PlanRoutes;
pub use users::UserRoutes;

use std::sync::Arc;

use axum::Router;

use crate::resources::ServerResources;

/// Build the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(UserRoutes::routes(resources.clone()))
        .merge(InstructorRoutes::routes(resources.clone()))
        .merge(ExamRoutes::routes(resources.clone()))
        .merge(PlanRoutes::routes(resources.clone()))
        .merge(FeeRoutes::routes(resources.clone()))
        .merge(CredentialRoutes::routes(resources))
}
