//! Input validation for rescheduling problems.
//!
//! Checks structural integrity of people, commitments, and meeting
//! requests before any grid or model is built. Detects:
//! - Duplicate person IDs and duplicate meeting titles
//! - Commitments filed under the wrong owner
//! - Commitments ending before they start
//! - Meetings with a non-positive duration or no attendees
//! - Meetings requiring unknown people

use crate::models::{MeetingRequest, Person};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two people share an ID, or two meetings share a title.
    DuplicateId,
    /// A commitment's `owner_id` differs from the person holding it.
    OwnerMismatch,
    /// A commitment ends before it starts.
    NegativeDuration,
    /// A meeting asks for zero or negative minutes.
    NonPositiveDuration,
    /// A meeting has no required people.
    NoAttendees,
    /// A meeting references a person that doesn't exist.
    UnknownPerson,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input of a rescheduling problem.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(people: &[Person], meetings: &[MeetingRequest]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut person_ids = HashSet::new();
    for p in people {
        if !person_ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate person ID: {}", p.id),
            ));
        }

        for c in &p.commitments {
            if c.owner_id != p.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OwnerMismatch,
                    format!(
                        "Commitment '{}' is owned by '{}' but listed under '{}'",
                        c.title, c.owner_id, p.id
                    ),
                ));
            }
            if c.end < c.start {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeDuration,
                    format!("Commitment '{}' of '{}' ends before it starts", c.title, p.id),
                ));
            }
        }
    }

    let mut titles = HashSet::new();
    for m in meetings {
        if !titles.insert(m.title.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate meeting title: {}", m.title),
            ));
        }
        if m.duration_minutes <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveDuration,
                format!(
                    "Meeting '{}' has a non-positive duration of {} minutes",
                    m.title, m.duration_minutes
                ),
            ));
        }
        if m.required_person_ids.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoAttendees,
                format!("Meeting '{}' requires nobody", m.title),
            ));
        }
        for id in &m.required_person_ids {
            if !person_ids.contains(id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownPerson,
                    format!("Meeting '{}' requires unknown person '{}'", m.title, id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
