// ABOUTME: Database management over a sqlx SQLite pool
// ABOUTME: Owns migrations and the per-domain query modules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Database Management
//!
//! Storage for users, exams, billing and instructor credentials. Each domain
//! module extends [`Database`] with its migrations and queries.

mod billing;
mod credentials;
mod exams;
pub mod test_utils;
mod users;

pub use billing::FeeRecord;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for academy data
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_exams().await?;
        self.migrate_billing().await?;
        self.migrate_credentials().await?;
        Ok(())
    }
}
