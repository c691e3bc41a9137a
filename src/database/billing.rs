// ABOUTME: Billing storage - monthly plans, fees and payment audit records
// ABOUTME: Plan-joined fee listings for the fee routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{MonthlyFee, MonthlyPlan, PaymentMethod, PaymentRecord};

/// A fee joined with the plan it was generated from and, for staff-facing
/// listings, the billed member's name.
#[derive(Debug, Clone, Serialize)]
pub struct FeeRecord {
    #[serde(flatten)]
    pub fee: MonthlyFee,
    pub plan_name: String,
    pub plan_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Database {
    pub(super) async fn migrate_billing(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS monthly_plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                duration_months INTEGER NOT NULL,
                graduation_scopes TEXT NOT NULL,
                weekly_classes INTEGER NOT NULL,
                private_lessons_included BOOLEAN NOT NULL DEFAULT FALSE,
                student_capacity INTEGER,
                description TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS monthly_fees (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                plan_id TEXT NOT NULL REFERENCES monthly_plans(id),
                amount REAL NOT NULL,
                due_date DATETIME NOT NULL,
                payment_date DATETIME,
                status TEXT NOT NULL DEFAULT 'pending',
                payment_method TEXT,
                notes TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS payment_records (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                fee_id TEXT NOT NULL REFERENCES monthly_fees(id),
                amount REAL NOT NULL,
                paid_at DATETIME NOT NULL,
                marked_by TEXT NOT NULL REFERENCES users(id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_fees_user ON monthly_fees(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_user ON payment_records(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a new monthly plan
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_plan(&self, plan: &MonthlyPlan) -> Result<Uuid> {
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO monthly_plans (id, name, price, duration_months, graduation_scopes,
                                       weekly_classes, private_lessons_included, student_capacity,
                                       description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(plan.id.to_string())
        .bind(&plan.name)
        .bind(plan.price)
        .bind(i64::from(plan.duration_months))
        .bind(serde_json::to_string(&plan.graduation_scopes)?)
        .bind(i64::from(plan.weekly_classes))
        .bind(plan.private_lessons_included)
        .bind(plan.student_capacity.map(i64::from))
        .bind(&plan.description)
        .bind(plan.created_at.unwrap_or(now))
        .bind(plan.updated_at.unwrap_or(now))
        .execute(&self.pool)
        .await?;

        Ok(plan.id)
    }

    /// Get a plan by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_plan(&self, plan_id: Uuid) -> Result<Option<MonthlyPlan>> {
        let row = sqlx::query("SELECT * FROM monthly_plans WHERE id = ?")
            .bind(plan_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_plan(&r)).transpose()
    }

    /// List all plans, cheapest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_plans(&self) -> Result<Vec<MonthlyPlan>> {
        let rows = sqlx::query("SELECT * FROM monthly_plans ORDER BY price ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_plan).collect()
    }

    /// Update a plan
    ///
    /// Returns `false` when no plan with that ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_plan(&self, plan: &MonthlyPlan) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE monthly_plans
            SET name = ?, price = ?, duration_months = ?, graduation_scopes = ?,
                weekly_classes = ?, private_lessons_included = ?, student_capacity = ?,
                description = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&plan.name)
        .bind(plan.price)
        .bind(i64::from(plan.duration_months))
        .bind(serde_json::to_string(&plan.graduation_scopes)?)
        .bind(i64::from(plan.weekly_classes))
        .bind(plan.private_lessons_included)
        .bind(plan.student_capacity.map(i64::from))
        .bind(&plan.description)
        .bind(Utc::now())
        .bind(plan.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a new monthly fee
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_fee(&self, fee: &MonthlyFee) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO monthly_fees (id, user_id, plan_id, amount, due_date, payment_date,
                                      status, payment_method, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(fee.id.to_string())
        .bind(fee.user_id.to_string())
        .bind(fee.plan_id.to_string())
        .bind(fee.amount)
        .bind(fee.due_date)
        .bind(fee.payment_date)
        .bind(fee.status.as_str())
        .bind(fee.payment_method.map(|m| m.as_str()))
        .bind(&fee.notes)
        .bind(fee.created_at)
        .execute(&self.pool)
        .await?;

        Ok(fee.id)
    }

    /// Get a fee by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn get_fee(&self, fee_id: Uuid) -> Result<Option<MonthlyFee>> {
        let row = sqlx::query("SELECT * FROM monthly_fees WHERE id = ?")
            .bind(fee_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_fee(&r)).transpose()
    }

    /// List a member's fees joined with their plan, newest due date first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_fees_for_user(&self, user_id: Uuid) -> Result<Vec<FeeRecord>> {
        let rows = sqlx::query(
            r"
            SELECT f.*, p.name AS plan_name, p.price AS plan_price
            FROM monthly_fees f
            JOIN monthly_plans p ON p.id = f.plan_id
            WHERE f.user_id = ?
            ORDER BY f.due_date DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FeeRecord {
                    fee: Self::row_to_fee(row)?,
                    plan_name: row.get("plan_name"),
                    plan_price: row.get("plan_price"),
                    user_name: None,
                })
            })
            .collect()
    }

    /// List every fee joined with its plan and member name, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all_fees(&self) -> Result<Vec<FeeRecord>> {
        let rows = sqlx::query(
            r"
            SELECT f.*, p.name AS plan_name, p.price AS plan_price, u.name AS user_name
            FROM monthly_fees f
            JOIN monthly_plans p ON p.id = f.plan_id
            JOIN users u ON u.id = f.user_id
            ORDER BY f.due_date DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FeeRecord {
                    fee: Self::row_to_fee(row)?,
                    plan_name: row.get("plan_name"),
                    plan_price: row.get("plan_price"),
                    user_name: row.get("user_name"),
                })
            })
            .collect()
    }

    /// Mark a fee as paid
    ///
    /// Returns `false` when no unpaid fee with that ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_fee_paid(
        &self,
        fee_id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE monthly_fees
            SET status = 'paid', payment_method = ?, payment_date = ?
            WHERE id = ? AND status != 'paid'
            ",
        )
        .bind(method.as_str())
        .bind(paid_at)
        .bind(fee_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write a payment audit record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_payment_record(&self, record: &PaymentRecord) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO payment_records (id, user_id, fee_id, amount, paid_at, marked_by)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.fee_id.to_string())
        .bind(record.amount)
        .bind(record.paid_at)
        .bind(record.marked_by.to_string())
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    /// Payment history of a member, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_payment_records(&self, user_id: Uuid) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM payment_records WHERE user_id = ? ORDER BY paid_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_payment_record).collect()
    }

    fn row_to_plan(row: &sqlx::sqlite::SqliteRow) -> Result<MonthlyPlan> {
        let id: String = row.get("id");
        let scopes: String = row.get("graduation_scopes");

        Ok(MonthlyPlan {
            id: Uuid::parse_str(&id).context("invalid plan id in database")?,
            name: row.get("name"),
            price: row.get("price"),
            duration_months: u32::try_from(row.get::<i64, _>("duration_months"))
                .context("invalid plan duration in database")?,
            graduation_scopes: serde_json::from_str(&scopes)
                .context("invalid graduation scopes in database")?,
            weekly_classes: u32::try_from(row.get::<i64, _>("weekly_classes"))
                .context("invalid weekly class count in database")?,
            private_lessons_included: row.get("private_lessons_included"),
            student_capacity: row
                .get::<Option<i64>, _>("student_capacity")
                .map(u32::try_from)
                .transpose()
                .context("invalid student capacity in database")?,
            description: row.get("description"),
            created_at: Some(row.get("created_at")),
            updated_at: Some(row.get("updated_at")),
        })
    }

    fn row_to_fee(row: &sqlx::sqlite::SqliteRow) -> Result<MonthlyFee> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let plan_id: String = row.get("plan_id");
        let status: String = row.get("status");
        let payment_method: Option<String> = row.get("payment_method");

        Ok(MonthlyFee {
            id: Uuid::parse_str(&id).context("invalid fee id in database")?,
            user_id: Uuid::parse_str(&user_id).context("invalid fee user in database")?,
            plan_id: Uuid::parse_str(&plan_id).context("invalid fee plan in database")?,
            amount: row.get("amount"),
            due_date: row.get("due_date"),
            payment_date: row.get("payment_date"),
            status: status.parse()?,
            payment_method: payment_method.map(|m| m.parse()).transpose()?,
            notes: row.get("notes"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_payment_record(row: &sqlx::sqlite::SqliteRow) -> Result<PaymentRecord> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let fee_id: String = row.get("fee_id");
        let marked_by: String = row.get("marked_by");

        Ok(PaymentRecord {
            id: Uuid::parse_str(&id).context("invalid payment record id in database")?,
            user_id: Uuid::parse_str(&user_id).context("invalid payment user in database")?,
            fee_id: Uuid::parse_str(&fee_id).context("invalid payment fee in database")?,
            amount: row.get("amount"),
            paid_at: row.get("paid_at"),
            marked_by: Uuid::parse_str(&marked_by)
                .context("invalid payment marker in database")?,
        })
    }
}
