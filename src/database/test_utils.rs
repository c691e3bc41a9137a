// ABOUTME: Test utilities for database operations and in-memory test database creation
// ABOUTME: Provides helper functions for creating isolated test database instances
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::Result;

use super::Database;

/// Create an in-memory database for tests
///
/// # Errors
///
/// Returns an error if database initialization fails
pub async fn create_test_db() -> Result<Database> {
    // Each connection gets its own isolated instance
    Database::new("sqlite::memory:").await
}
