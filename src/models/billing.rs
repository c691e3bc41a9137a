// ABOUTME: Subscription plan and monthly fee models with payment audit records
// ABOUTME: Plan validation rules and lazy late-status evaluation for fees
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Maximum length of a plan description
pub const MAX_PLAN_DESCRIPTION_LEN: usize = 500;

/// Scope of graduation events covered by a plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraduationScope {
    International,
    National,
    Regional,
}

impl GraduationScope {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::International => "international",
            Self::National => "national",
            Self::Regional => "regional",
        }
    }
}

impl FromStr for GraduationScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "international" => Ok(Self::International),
            "national" => Ok(Self::National),
            "regional" => Ok(Self::Regional),
            _ => Err(AppError::invalid_input(format!(
                "Invalid graduation scope: {s}"
            ))),
        }
    }
}

/// A subscription tier offered by the academy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyPlan {
    /// Unique plan identifier
    pub id: Uuid,
    /// Plan name
    pub name: String,
    /// Monthly price
    pub price: f64,
    /// Contract duration in months
    pub duration_months: u32,
    /// Graduation scopes covered by the plan (non-empty)
    pub graduation_scopes: Vec<GraduationScope>,
    /// Classes per week included
    pub weekly_classes: u32,
    /// Whether private lessons are included
    pub private_lessons_included: bool,
    /// Maximum enrolled students, unlimited when absent
    pub student_capacity: Option<u32>,
    /// Short plan description
    pub description: Option<String>,
    /// When the plan was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonthlyPlan {
    /// Validate the plan invariants shared by create and update
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error when a bound is violated.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_input("Plan name is required"));
        }
        if self.price < 0.0 {
            return Err(AppError::invalid_input("Plan price must not be negative"));
        }
        if self.duration_months < 1 {
            return Err(AppError::invalid_input(
                "Plan duration must be at least one month",
            ));
        }
        if self.weekly_classes < 1 {
            return Err(AppError::invalid_input(
                "Plan must include at least one weekly class",
            ));
        }
        if self.graduation_scopes.is_empty() {
            return Err(AppError::invalid_input(
                "Plan must list at least one graduation scope",
            ));
        }
        if self.student_capacity == Some(0) {
            return Err(AppError::invalid_input(
                "Student capacity must be at least one",
            ));
        }
        if let Some(description) = &self.description {
            if description.len() > MAX_PLAN_DESCRIPTION_LEN {
                return Err(AppError::invalid_input(format!(
                    "Plan description exceeds {MAX_PLAN_DESCRIPTION_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// Field-wise comparison ignoring timestamps, used by the no-op update guard
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.name == other.name
            && (self.price - other.price).abs() < f64::EPSILON
            && self.duration_months == other.duration_months
            && self.graduation_scopes == other.graduation_scopes
            && self.weekly_classes == other.weekly_classes
            && self.private_lessons_included == other.private_lessons_included
            && self.student_capacity == other.student_capacity
            && self.description == other.description
    }
}

/// Billing state of a monthly fee
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeeStatus {
    #[default]
    Pending,
    Paid,
    Late,
}

impl FeeStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Late => "late",
        }
    }
}

impl Display for FeeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "late" => Ok(Self::Late),
            _ => Err(AppError::invalid_input(format!("Invalid fee status: {s}"))),
        }
    }
}

/// Accepted payment methods. Only cash exists today; the enum keeps new
/// methods additive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
}

impl PaymentMethod {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            _ => Err(AppError::invalid_input(format!(
                "Invalid payment method: {s}"
            ))),
        }
    }
}

/// One month of a plan billed to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyFee {
    /// Unique fee identifier
    pub id: Uuid,
    /// Billed user
    pub user_id: Uuid,
    /// Plan the fee was generated from
    pub plan_id: Uuid,
    /// Amount due (plan price at billing time)
    pub amount: f64,
    /// Payment deadline
    pub due_date: DateTime<Utc>,
    /// When the fee was settled
    pub payment_date: Option<DateTime<Utc>>,
    /// Stored billing state (see [`MonthlyFee::effective_status`])
    pub status: FeeStatus,
    /// How the fee was settled, required once paid
    pub payment_method: Option<PaymentMethod>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the fee was created
    pub created_at: DateTime<Utc>,
}

impl MonthlyFee {
    /// Status as reported by the API: a pending fee past its due date is
    /// late. There is no scheduler flipping rows, the transition happens
    /// on read.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> FeeStatus {
        if self.status == FeeStatus::Pending && self.due_date < now {
            FeeStatus::Late
        } else {
            self.status
        }
    }
}

/// Audit entry written when an instructor marks a fee as paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Unique record identifier
    pub id: Uuid,
    /// User the fee belongs to
    pub user_id: Uuid,
    /// Settled fee
    pub fee_id: Uuid,
    /// Amount settled
    pub amount: f64,
    /// When the payment was registered
    pub paid_at: DateTime<Utc>,
    /// Instructor or admin who marked the fee paid
    pub marked_by: Uuid,
}
