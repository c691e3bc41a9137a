// ABOUTME: Pre-issued instructor credential model gating instructor self-registration
// ABOUTME: Nine-digit single-use codes issued by admins
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Required length of a credential code
pub const CREDENTIAL_CODE_LEN: usize = 9;

/// A pre-issued instructor id. Registering with an unused code grants the
/// INSTRUCTOR role and consumes the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorCredential {
    /// Unique credential identifier
    pub id: Uuid,
    /// The 9-digit code handed to the instructor
    pub code: String,
    /// Whether the code has been consumed
    pub is_used: bool,
    /// User who consumed the code
    pub used_by: Option<Uuid>,
    /// When the credential was issued
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl InstructorCredential {
    /// Create a fresh, unused credential
    #[must_use]
    pub fn new(code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code,
            is_used: false,
            used_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Codes are exactly nine ASCII digits
    #[must_use]
    pub fn is_valid_code(code: &str) -> bool {
        code.len() == CREDENTIAL_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_validation() {
        assert!(InstructorCredential::is_valid_code("123456789"));
        assert!(!InstructorCredential::is_valid_code("12345678"));
        assert!(!InstructorCredential::is_valid_code("1234567890"));
        assert!(!InstructorCredential::is_valid_code("12345678a"));
        assert!(!InstructorCredential::is_valid_code("12345678９"));
    }

    #[test]
    fn test_new_credential_is_unused() {
        let credential = InstructorCredential::new("987654321".into());
        assert!(!credential.is_used);
        assert!(credential.used_by.is_none());
    }
}
