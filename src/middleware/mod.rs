// ABOUTME: Request middleware for the HTTP API
// ABOUTME: Bearer-token authentication and role checks shared by the routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

mod auth;

pub use auth::{AuthMiddleware, AuthUser};
