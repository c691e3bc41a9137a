// ABOUTME: Belt-progression exam models with sessions, registrations and results
// ABOUTME: Capacity and belt-eligibility helpers used by the registration routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Belt;

/// Minimum grade for belt promotion
pub const PASSING_GRADE: f64 = 7.0;

/// Default session/exam capacity when none is given
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 10;

/// A graduation event created by an instructor.
///
/// `belt_levels` lists the belts eligible to register, in order; the last
/// entry is the target belt awarded on promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    /// Unique exam identifier
    pub id: Uuid,
    /// Exam name
    pub name: String,
    /// Date of the graduation event
    pub exam_date: DateTime<Utc>,
    /// Eligible belts, last entry is the target belt
    pub belt_levels: Vec<Belt>,
    /// Default capacity for sessions of this exam
    pub max_participants: u32,
    /// Instructor who created the exam
    pub created_by: Uuid,
    /// When the exam was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    /// The belt awarded when an athlete passes this exam
    #[must_use]
    pub fn final_belt(&self) -> Option<Belt> {
        self.belt_levels.last().copied()
    }

    /// Check whether an athlete holding `belt` may register
    #[must_use]
    pub fn is_eligible(&self, belt: Belt) -> bool {
        self.belt_levels.contains(&belt)
    }
}

/// A scheduled sitting of an exam, with a bounded participant list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    /// Unique session identifier
    pub id: Uuid,
    /// Exam this session belongs to
    pub exam_id: Uuid,
    /// Session date
    pub date: DateTime<Utc>,
    /// Time of day, free-form ("19:30")
    pub time: String,
    /// Where the session takes place
    pub location: String,
    /// Capacity bound for `participants`
    pub max_participants: u32,
    /// Registered athletes
    pub participants: Vec<Uuid>,
}

impl ExamSession {
    /// Whether the session can still take registrations
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        (self.participants.len() as u32) < self.max_participants
    }

    /// Whether the athlete is already registered
    #[must_use]
    pub fn is_registered(&self, athlete_id: Uuid) -> bool {
        self.participants.contains(&athlete_id)
    }
}

/// A grade recorded for one athlete in one exam. At most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    /// Exam the result belongs to
    pub exam_id: Uuid,
    /// Graded athlete
    pub athlete_id: Uuid,
    /// Grade on a 0-10 scale
    pub grade: f64,
    /// Free-form examiner notes
    pub observations: Option<String>,
    /// When the result was recorded
    pub recorded_at: DateTime<Utc>,
}

impl ExamResult {
    /// Whether the grade qualifies the athlete for promotion
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.grade >= PASSING_GRADE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exam(belts: Vec<Belt>) -> Exam {
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4(),
            name: "Winter graduation".into(),
            exam_date: now,
            belt_levels: belts,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_final_belt_is_last_entry() {
        let e = exam(vec![Belt::White, Belt::Blue]);
        assert_eq!(e.final_belt(), Some(Belt::Blue));
        assert_eq!(exam(vec![]).final_belt(), None);
    }

    #[test]
    fn test_eligibility() {
        let e = exam(vec![Belt::White, Belt::Blue]);
        assert!(e.is_eligible(Belt::White));
        assert!(!e.is_eligible(Belt::Black));
    }

    #[test]
    fn test_session_capacity() {
        let mut session = ExamSession {
            id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            date: Utc::now(),
            time: "19:00".into(),
            location: "Main mat".into(),
            max_participants: 1,
            participants: vec![],
        };
        assert!(session.has_capacity());
        let athlete = Uuid::new_v4();
        session.participants.push(athlete);
        assert!(!session.has_capacity());
        assert!(session.is_registered(athlete));
        assert!(!session.is_registered(Uuid::new_v4()));
    }

    #[test]
    fn test_passing_grade_boundary() {
        let mut result = ExamResult {
            exam_id: Uuid::new_v4(),
            athlete_id: Uuid::new_v4(),
            grade: PASSING_GRADE,
            observations: None,
            recorded_at: Utc::now(),
        };
        assert!(result.is_passing());
        result.grade = 6.9;
        assert!(!result.is_passing());
    }
}
