// ABOUTME: Shared server resources created once at startup
// ABOUTME: Arc-shared database, auth manager and configuration for the routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::middleware::AuthMiddleware;

/// Centralized resource management for the server.
///
/// Constructed once at startup and passed as `Arc<ServerResources>` to every
/// route module instead of cloning individual resources.
pub struct ServerResources {
    pub database: Arc<Database>,
    pub auth_manager: Arc<AuthManager>,
    pub auth_middleware: Arc<AuthMiddleware>,
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create new server resources with proper Arc sharing
    #[must_use]
    pub fn new(database: Database, auth_manager: AuthManager, config: Arc<ServerConfig>) -> Self {
        let auth_middleware = Arc::new(AuthMiddleware::new(auth_manager.clone()));
        Self {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            auth_middleware,
            config,
        }
    }
}
