// ABOUTME: Instructor credential storage - single-use registration codes
// ABOUTME: Code lookup, usage marking and filtered paginated listings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::InstructorCredential;
use crate::pagination::PageParams;

impl Database {
    pub(super) async fn migrate_credentials(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS instructor_credentials (
                id TEXT PRIMARY KEY,
                code TEXT UNIQUE NOT NULL,
                is_used BOOLEAN NOT NULL DEFAULT FALSE,
                used_by TEXT REFERENCES users(id),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_credentials_code ON instructor_credentials(code)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a new instructor credential
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including a duplicate code).
    pub async fn create_credential(&self, credential: &InstructorCredential) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO instructor_credentials (id, code, is_used, used_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(credential.id.to_string())
        .bind(&credential.code)
        .bind(credential.is_used)
        .bind(credential.used_by.map(|id| id.to_string()))
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(credential.id)
    }

    /// Get a credential by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_credential(&self, credential_id: Uuid) -> Result<Option<InstructorCredential>> {
        let row = sqlx::query("SELECT * FROM instructor_credentials WHERE id = ?")
            .bind(credential_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_credential(&r)).transpose()
    }

    /// Get a credential by its code
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_credential_by_code(&self, code: &str) -> Result<Option<InstructorCredential>> {
        let row = sqlx::query("SELECT * FROM instructor_credentials WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_credential(&r)).transpose()
    }

    /// Mark a credential as consumed by a newly registered instructor
    ///
    /// Returns `false` when the credential doesn't exist or was already used.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_credential_used(&self, credential_id: Uuid, used_by: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE instructor_credentials
            SET is_used = TRUE, used_by = ?, updated_at = ?
            WHERE id = ? AND is_used = FALSE
            ",
        )
        .bind(used_by.to_string())
        .bind(Utc::now())
        .bind(credential_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List credentials, optionally filtered by usage state and a code search
    /// term, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_credentials(
        &self,
        is_used: Option<bool>,
        search: Option<&str>,
        params: PageParams,
    ) -> Result<(Vec<InstructorCredential>, i64)> {
        let pattern = search.map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM instructor_credentials
            WHERE (?1 IS NULL OR is_used = ?1)
              AND (?2 IS NULL OR code LIKE ?2)
            ",
        )
        .bind(is_used)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r"
            SELECT * FROM instructor_credentials
            WHERE (?1 IS NULL OR is_used = ?1)
              AND (?2 IS NULL OR code LIKE ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            ",
        )
        .bind(is_used)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let credentials = rows
            .iter()
            .map(Self::row_to_credential)
            .collect::<Result<Vec<_>>>()?;

        Ok((credentials, total))
    }

    /// Delete a credential
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_credential(&self, credential_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM instructor_credentials WHERE id = ?")
            .bind(credential_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_credential(row: &sqlx::sqlite::SqliteRow) -> Result<InstructorCredential> {
        let id: String = row.get("id");
        let used_by: Option<String> = row.get("used_by");

        Ok(InstructorCredential {
            id: Uuid::parse_str(&id).context("invalid credential id in database")?,
            code: row.get("code"),
            is_used: row.get("is_used"),
            used_by: used_by
                .map(|id| Uuid::parse_str(&id))
                .transpose()
                .context("invalid credential user in database")?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
