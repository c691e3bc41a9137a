// ABOUTME: Domain model definitions for the academy backend
// ABOUTME: Users, belt exams, billing entities and instructor credentials
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Core data structures shared by routes and the database layer.

pub mod billing;
pub mod credential;
pub mod exam;
pub mod user;

pub use billing::{
    FeeStatus, GraduationScope, MonthlyFee, MonthlyPlan, PaymentMethod, PaymentRecord,
};
pub use credential::InstructorCredential;
pub use exam::{Exam, ExamResult, ExamSession, DEFAULT_MAX_PARTICIPANTS, PASSING_GRADE};
pub use user::{Belt, Role, User};
