// ABOUTME: User model with role hierarchy and belt progression ladder
// ABOUTME: Role, Belt and User definitions shared by auth middleware and routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Account role. Roles form a linear hierarchy: each role implies every
/// role below it (`ATHLETE < INSTRUCTOR < ADMIN`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum Role {
    /// Regular academy member
    #[default]
    Athlete,
    /// Teaching staff, manages athletes and exams
    Instructor,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Position in the role hierarchy (higher outranks lower)
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::Athlete => 1,
            Self::Instructor => 2,
            Self::Admin => 3,
        }
    }

    /// Check whether this role satisfies `required` under the hierarchy
    #[must_use]
    pub const fn has_permission(&self, required: Self) -> bool {
        self.level() >= required.level()
    }

    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Athlete => "ATHLETE",
            Self::Instructor => "INSTRUCTOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ATHLETE" => Ok(Self::Athlete),
            "INSTRUCTOR" => Ok(Self::Instructor),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(AppError::invalid_input(format!("Invalid role: {s}"))),
        }
    }
}

/// Belt graduation. Ordering matches progression (white first, black last).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum Belt {
    #[default]
    White,
    Blue,
    Purple,
    Brown,
    Black,
}

impl Belt {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::White => "WHITE",
            Self::Blue => "BLUE",
            Self::Purple => "PURPLE",
            Self::Brown => "BROWN",
            Self::Black => "BLACK",
        }
    }
}

impl Display for Belt {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Belt {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WHITE" => Ok(Self::White),
            "BLUE" => Ok(Self::Blue),
            "PURPLE" => Ok(Self::Purple),
            "BROWN" => Ok(Self::Brown),
            "BLACK" => Ok(Self::Black),
            _ => Err(AppError::invalid_input(format!("Invalid belt: {s}"))),
        }
    }
}

/// An academy member.
///
/// Only athletes carry a belt and an instructor reference; instructors and
/// admins keep the columns at their defaults and the API never surfaces them
/// for those roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address (unique, used for login)
    pub email: String,
    /// Hashed password for authentication
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Current belt graduation (meaningful for athletes)
    pub belt: Belt,
    /// Date of birth
    pub birth_date: Option<DateTime<Utc>>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Gender ("male" or "female" in the legacy data)
    pub gender: Option<String>,
    /// Whether the account is suspended
    pub suspended: bool,
    /// Instructor this athlete trains under
    pub instructor_id: Option<Uuid>,
    /// When the member joined the academy
    pub joined_date: DateTime<Utc>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new athlete account with default belt and no instructor
    #[must_use]
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role: Role::Athlete,
            belt: Belt::White,
            birth_date: None,
            phone: None,
            gender: None,
            suspended: false,
            instructor_id: None,
            joined_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new account with an explicit role
    #[must_use]
    pub fn with_role(name: String, email: String, password_hash: String, role: Role) -> Self {
        let mut user = Self::new(name, email, password_hash);
        user.role = role;
        user
    }
}
