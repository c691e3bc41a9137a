// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common database, auth, and user creation helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test setup for `dojo_server` integration tests.

use std::sync::{Arc, Once};

use anyhow::Result;
use uuid::Uuid;

use dojo_server::auth::AuthManager;
use dojo_server::config::environment::{AuthConfig, DatabaseConfig, ServerConfig};
use dojo_server::database::{test_utils, Database};
use dojo_server::models::{Belt, Role, User};
use dojo_server::resources::ServerResources;

static INIT_LOGGER: Once = Once::new();

/// Low bcrypt cost to keep tests fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Test server configuration
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 8081,
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        auth: AuthConfig {
            jwt_secret: "test_jwt_secret".into(),
            token_expiry_hours: 24,
        },
    }
}

/// Build full server resources around an in-memory database
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    init_test_logging();
    let database = test_utils::create_test_db().await?;
    let config = test_config();
    let auth_manager = AuthManager::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.token_expiry_hours,
    );
    Ok(Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(config),
    )))
}

/// Insert a user with the given role and return it
pub async fn create_user(
    database: &Database,
    name: &str,
    email: &str,
    role: Role,
) -> Result<User> {
    let hash = bcrypt::hash("password123", TEST_BCRYPT_COST)?;
    let user = User::with_role(name.into(), email.into(), hash, role);
    database.create_user(&user).await?;
    Ok(user)
}

/// Insert an athlete with a specific belt and instructor link
pub async fn create_athlete(
    database: &Database,
    name: &str,
    email: &str,
    belt: Belt,
    instructor_id: Option<Uuid>,
) -> Result<User> {
    let mut user = create_user(database, name, email, Role::Athlete).await?;
    database.update_user_belt(user.id, belt).await?;
    database.set_instructor(user.id, instructor_id).await?;
    user.belt = belt;
    user.instructor_id = instructor_id;
    Ok(user)
}

/// Issue a bearer token for a user
pub fn bearer_token(resources: &Arc<ServerResources>, user: &User) -> String {
    let token = resources
        .auth_manager
        .generate_token(user)
        .expect("token generation");
    format!("Bearer {token}")
}
