// ABOUTME: Exam storage - exams, sessions, registrations and results
// ABOUTME: Capacity counting and creator-scoped updates for the exam routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{Exam, ExamResult, ExamSession, User};

impl Database {
    pub(super) async fn migrate_exams(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exams (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                exam_date DATETIME NOT NULL,
                belt_levels TEXT NOT NULL,
                max_participants INTEGER NOT NULL DEFAULT 10,
                created_by TEXT NOT NULL REFERENCES users(id),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exam_sessions (
                id TEXT PRIMARY KEY,
                exam_id TEXT NOT NULL REFERENCES exams(id),
                session_date DATETIME NOT NULL,
                session_time TEXT NOT NULL,
                location TEXT NOT NULL,
                max_participants INTEGER NOT NULL DEFAULT 10,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exam_registrations (
                session_id TEXT NOT NULL REFERENCES exam_sessions(id),
                athlete_id TEXT NOT NULL REFERENCES users(id),
                registered_at DATETIME NOT NULL,
                PRIMARY KEY (session_id, athlete_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exam_results (
                exam_id TEXT NOT NULL REFERENCES exams(id),
                athlete_id TEXT NOT NULL REFERENCES users(id),
                grade REAL NOT NULL,
                observations TEXT,
                recorded_at DATETIME NOT NULL,
                PRIMARY KEY (exam_id, athlete_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_exams_creator ON exams(created_by)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_exam ON exam_sessions(exam_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_registrations_athlete ON exam_registrations(athlete_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a new exam
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_exam(&self, exam: &Exam) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO exams (id, name, exam_date, belt_levels, max_participants,
                               created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(exam.id.to_string())
        .bind(&exam.name)
        .bind(exam.exam_date)
        .bind(serde_json::to_string(&exam.belt_levels)?)
        .bind(i64::from(exam.max_participants))
        .bind(exam.created_by.to_string())
        .bind(exam.created_at)
        .bind(exam.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(exam.id)
    }

    /// Get an exam by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_exam(&self, exam_id: Uuid) -> Result<Option<Exam>> {
        let row = sqlx::query("SELECT * FROM exams WHERE id = ?")
            .bind(exam_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_exam(&r)).transpose()
    }

    /// List all exams, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_exams(&self) -> Result<Vec<Exam>> {
        let rows = sqlx::query("SELECT * FROM exams ORDER BY exam_date DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_exam).collect()
    }

    /// List exams created by one instructor, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_exams_by_creator(&self, creator: Uuid) -> Result<Vec<Exam>> {
        let rows = sqlx::query("SELECT * FROM exams WHERE created_by = ? ORDER BY exam_date DESC")
            .bind(creator.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_exam).collect()
    }

    /// List exams an athlete is registered for through any session
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_exams_for_athlete(&self, athlete_id: Uuid) -> Result<Vec<Exam>> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT e.* FROM exams e
            JOIN exam_sessions s ON s.exam_id = e.id
            JOIN exam_registrations r ON r.session_id = s.id
            WHERE r.athlete_id = ?
            ORDER BY e.exam_date DESC
            ",
        )
        .bind(athlete_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_exam).collect()
    }

    /// Update an exam, scoped to its creator
    ///
    /// Returns `false` when the exam doesn't exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_exam(&self, exam: &Exam) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE exams
            SET name = ?, exam_date = ?, belt_levels = ?, max_participants = ?, updated_at = ?
            WHERE id = ? AND created_by = ?
            ",
        )
        .bind(&exam.name)
        .bind(exam.exam_date)
        .bind(serde_json::to_string(&exam.belt_levels)?)
        .bind(i64::from(exam.max_participants))
        .bind(Utc::now())
        .bind(exam.id.to_string())
        .bind(exam.created_by.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an exam and everything under it, scoped to its creator
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub async fn delete_exam(&self, exam_id: Uuid, creator: Uuid) -> Result<bool> {
        let id = exam_id.to_string();

        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM exams WHERE id = ? AND created_by = ?")
                .bind(&id)
                .bind(creator.to_string())
                .fetch_one(&self.pool)
                .await?;
        if owned == 0 {
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM exam_registrations WHERE session_id IN
               (SELECT id FROM exam_sessions WHERE exam_id = ?)",
        )
        .bind(&id)
        .execute(&self.pool)
        .await?;
        sqlx::query("DELETE FROM exam_sessions WHERE exam_id = ?")
            .bind(&id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM exam_results WHERE exam_id = ?")
            .bind(&id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM exams WHERE id = ?")
            .bind(&id)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    /// Create a session for an exam
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_session(&self, session: &ExamSession) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO exam_sessions (id, exam_id, session_date, session_time,
                                       location, max_participants, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(session.id.to_string())
        .bind(session.exam_id.to_string())
        .bind(session.date)
        .bind(&session.time)
        .bind(&session.location)
        .bind(i64::from(session.max_participants))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(session.id)
    }

    /// Get a session with its participant list
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn get_session(&self, session_id: Uuid) -> Result<Option<ExamSession>> {
        let row = sqlx::query("SELECT * FROM exam_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut session = Self::row_to_session(&row)?;
        session.participants = self.list_session_participants(session.id).await?;
        Ok(Some(session))
    }

    /// List sessions of an exam with their participant lists
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn list_sessions(&self, exam_id: Uuid) -> Result<Vec<ExamSession>> {
        let rows = sqlx::query(
            "SELECT * FROM exam_sessions WHERE exam_id = ? ORDER BY session_date ASC",
        )
        .bind(exam_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut session = Self::row_to_session(row)?;
            session.participants = self.list_session_participants(session.id).await?;
            sessions.push(session);
        }
        Ok(sessions)
    }

    /// Update a session, scoped to its parent exam
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_session(&self, session: &ExamSession) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE exam_sessions
            SET session_date = ?, session_time = ?, location = ?, max_participants = ?
            WHERE id = ? AND exam_id = ?
            ",
        )
        .bind(session.date)
        .bind(&session.time)
        .bind(&session.location)
        .bind(i64::from(session.max_participants))
        .bind(session.id.to_string())
        .bind(session.exam_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a session and its registrations, scoped to its parent exam
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub async fn delete_session(&self, exam_id: Uuid, session_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exam_sessions WHERE id = ? AND exam_id = ?")
            .bind(session_id.to_string())
            .bind(exam_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM exam_registrations WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    /// Registered athlete IDs for a session, oldest registration first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_session_participants(&self, session_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT athlete_id FROM exam_registrations WHERE session_id = ? ORDER BY registered_at ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("athlete_id");
                Uuid::parse_str(&id).context("invalid athlete id in registration")
            })
            .collect()
    }

    /// Register an athlete for a session
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including duplicates; callers
    /// check for an existing registration first).
    pub async fn register_participant(&self, session_id: Uuid, athlete_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO exam_registrations (session_id, athlete_id, registered_at) VALUES (?, ?, ?)",
        )
        .bind(session_id.to_string())
        .bind(athlete_id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove an athlete's registration from a session
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn unregister_participant(&self, session_id: Uuid, athlete_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM exam_registrations WHERE session_id = ? AND athlete_id = ?",
        )
        .bind(session_id.to_string())
        .bind(athlete_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether an athlete is registered for any session of an exam
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_exam_participant(&self, exam_id: Uuid, athlete_id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM exam_registrations r
            JOIN exam_sessions s ON s.id = r.session_id
            WHERE s.exam_id = ? AND r.athlete_id = ?
            ",
        )
        .bind(exam_id.to_string())
        .bind(athlete_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Unique athletes registered across all sessions of an exam
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_exam_participants(&self, exam_id: Uuid) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT u.* FROM users u
            JOIN exam_registrations r ON r.athlete_id = u.id
            JOIN exam_sessions s ON s.id = r.session_id
            WHERE s.exam_id = ?
            ORDER BY u.name ASC
            ",
        )
        .bind(exam_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Get the recorded result for one athlete in one exam
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_result(&self, exam_id: Uuid, athlete_id: Uuid) -> Result<Option<ExamResult>> {
        let row = sqlx::query("SELECT * FROM exam_results WHERE exam_id = ? AND athlete_id = ?")
            .bind(exam_id.to_string())
            .bind(athlete_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_result(&r)).transpose()
    }

    /// Record a result for one athlete in one exam
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including an existing result;
    /// callers check first).
    pub async fn create_result(&self, result: &ExamResult) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO exam_results (exam_id, athlete_id, grade, observations, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(result.exam_id.to_string())
        .bind(result.athlete_id.to_string())
        .bind(result.grade)
        .bind(&result.observations)
        .bind(result.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_exam(row: &sqlx::sqlite::SqliteRow) -> Result<Exam> {
        let id: String = row.get("id");
        let created_by: String = row.get("created_by");
        let belt_levels: String = row.get("belt_levels");

        Ok(Exam {
            id: Uuid::parse_str(&id).context("invalid exam id in database")?,
            name: row.get("name"),
            exam_date: row.get("exam_date"),
            belt_levels: serde_json::from_str(&belt_levels)
                .context("invalid belt levels in database")?,
            max_participants: u32::try_from(row.get::<i64, _>("max_participants"))
                .context("invalid exam capacity in database")?,
            created_by: Uuid::parse_str(&created_by).context("invalid exam creator in database")?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<ExamSession> {
        let id: String = row.get("id");
        let exam_id: String = row.get("exam_id");

        Ok(ExamSession {
            id: Uuid::parse_str(&id).context("invalid session id in database")?,
            exam_id: Uuid::parse_str(&exam_id).context("invalid session exam in database")?,
            date: row.get("session_date"),
            time: row.get("session_time"),
            location: row.get("location"),
            max_participants: u32::try_from(row.get::<i64, _>("max_participants"))
                .context("invalid session capacity in database")?,
            participants: Vec::new(),
        })
    }

    fn row_to_result(row: &sqlx::sqlite::SqliteRow) -> Result<ExamResult> {
        let exam_id: String = row.get("exam_id");
        let athlete_id: String = row.get("athlete_id");

        Ok(ExamResult {
            exam_id: Uuid::parse_str(&exam_id).context("invalid result exam in database")?,
            athlete_id: Uuid::parse_str(&athlete_id)
                .context("invalid result athlete in database")?,
            grade: row.get("grade"),
            observations: row.get("observations"),
            recorded_at: row.get("recorded_at"),
        })
    }
}
