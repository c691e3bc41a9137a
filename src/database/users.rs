// ABOUTME: User storage - accounts, roles, belts and instructor links
// ABOUTME: Queries for registration, rosters and belt promotion
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{Belt, Role, User};
use crate::pagination::PageParams;

impl Database {
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'ATHLETE',
                belt TEXT NOT NULL DEFAULT 'WHITE',
                birth_date DATETIME,
                phone TEXT,
                gender TEXT,
                suspended BOOLEAN NOT NULL DEFAULT FALSE,
                instructor_id TEXT REFERENCES users(id),
                joined_date DATETIME NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_instructor ON users(instructor_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a new user account
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including a duplicate email).
    pub async fn create_user(&self, user: &User) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, role, belt, birth_date,
                               phone, gender, suspended, instructor_id, joined_date,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.belt.as_str())
        .bind(user.birth_date)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(user.suspended)
        .bind(user.instructor_id.map(|id| id.to_string()))
        .bind(user.joined_date)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Get a user by email address
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Update the belt of an athlete supervised by the given instructor
    ///
    /// Returns `false` when no athlete with that ID is linked to the
    /// instructor, so callers can distinguish "not yours" from success.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_athlete_belt(
        &self,
        athlete_id: Uuid,
        instructor_id: Uuid,
        belt: Belt,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE users SET belt = ?, updated_at = ?
            WHERE id = ? AND role = 'ATHLETE' AND instructor_id = ?
            ",
        )
        .bind(belt.as_str())
        .bind(Utc::now())
        .bind(athlete_id.to_string())
        .bind(instructor_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update a user's belt without an ownership check (admin promotions)
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_user_belt(&self, user_id: Uuid, belt: Belt) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET belt = ?, updated_at = ? WHERE id = ?")
            .bind(belt.as_str())
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Change a user's role
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_user_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Link or unlink an athlete to an instructor
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_instructor(&self, user_id: Uuid, instructor_id: Option<Uuid>) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET instructor_id = ?, updated_at = ? WHERE id = ?")
            .bind(instructor_id.map(|id| id.to_string()))
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List athletes, optionally restricted to one instructor's roster and
    /// filtered by a name/email search term
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_athletes(
        &self,
        instructor_id: Option<Uuid>,
        search: Option<&str>,
        params: PageParams,
    ) -> Result<(Vec<User>, i64)> {
        let instructor = instructor_id.map(|id| id.to_string());
        let pattern = search.map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM users
            WHERE role = 'ATHLETE'
              AND (?1 IS NULL OR instructor_id = ?1)
              AND (?2 IS NULL OR name LIKE ?2 OR email LIKE ?2)
            ",
        )
        .bind(&instructor)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r"
            SELECT * FROM users
            WHERE role = 'ATHLETE'
              AND (?1 IS NULL OR instructor_id = ?1)
              AND (?2 IS NULL OR name LIKE ?2 OR email LIKE ?2)
            ORDER BY name ASC
            LIMIT ?3 OFFSET ?4
            ",
        )
        .bind(&instructor)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .iter()
            .map(Self::row_to_user)
            .collect::<Result<Vec<_>>>()?;

        Ok((users, total))
    }

    /// List instructors, optionally filtered by a name/email search term
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_instructors(
        &self,
        search: Option<&str>,
        params: PageParams,
    ) -> Result<(Vec<User>, i64)> {
        let pattern = search.map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM users
            WHERE role = 'INSTRUCTOR'
              AND (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1)
            ",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r"
            SELECT * FROM users
            WHERE role = 'INSTRUCTOR'
              AND (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1)
            ORDER BY name ASC
            LIMIT ?2 OFFSET ?3
            ",
        )
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .iter()
            .map(Self::row_to_user)
            .collect::<Result<Vec<_>>>()?;

        Ok((users, total))
    }

    /// List every instructor, for the unauthenticated public directory
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all_instructors(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users WHERE role = 'INSTRUCTOR' ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Count athletes currently linked to an instructor
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_athletes_of(&self, instructor_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'ATHLETE' AND instructor_id = ?",
        )
        .bind(instructor_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Delete an instructor account, unlinking any athletes first
    ///
    /// Returns `false` when no instructor with that ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error if either statement fails.
    pub async fn delete_instructor(&self, instructor_id: Uuid) -> Result<bool> {
        sqlx::query(
            "UPDATE users SET instructor_id = NULL, updated_at = ? WHERE instructor_id = ?",
        )
        .bind(Utc::now())
        .bind(instructor_id.to_string())
        .execute(&self.pool)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'INSTRUCTOR'")
            .bind(instructor_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub(super) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.get("id");
        let role: String = row.get("role");
        let belt: String = row.get("belt");
        let instructor_id: Option<String> = row.get("instructor_id");

        Ok(User {
            id: Uuid::parse_str(&id).context("invalid user id in database")?,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: role.parse()?,
            belt: belt.parse()?,
            birth_date: row.get::<Option<DateTime<Utc>>, _>("birth_date"),
            phone: row.get("phone"),
            gender: row.get("gender"),
            suspended: row.get("suspended"),
            instructor_id: instructor_id
                .map(|id| Uuid::parse_str(&id))
                .transpose()
                .context("invalid instructor reference in database")?,
            joined_date: row.get("joined_date"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
