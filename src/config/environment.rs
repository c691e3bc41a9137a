// ABOUTME: Environment-based server configuration with sane development defaults
// ABOUTME: Reads HTTP port, database URL and JWT settings from the process environment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Environment-only configuration. Every setting has a development default;
//! production deployments override through environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Default HTTP port, matching the legacy deployment
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default JWT lifetime in hours
pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    pub url: String,
}

/// JWT settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 signing
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub token_expiry_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is unset or a numeric variable
    /// fails to parse.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("Invalid HTTP_PORT: {value}"))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/dojo.db".into());

        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set, the server cannot sign tokens without it")?;

        let token_expiry_hours = match env::var("TOKEN_EXPIRY_HOURS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("Invalid TOKEN_EXPIRY_HOURS: {value}"))?,
            Err(_) => DEFAULT_TOKEN_EXPIRY_HOURS,
        };

        Ok(Self {
            http_port,
            database: DatabaseConfig { url: database_url },
            auth: AuthConfig {
                jwt_secret,
                token_expiry_hours,
            },
        })
    }

    /// One-line startup summary, safe to log (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} token_expiry={}h",
            self.http_port, self.database.url, self.auth.token_expiry_hours
        )
    }
}
