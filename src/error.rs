//! Error taxonomy for rescheduling.
//!
//! Per-item problems are detected while encoding and surface immediately
//! with the offending item's identity. Global failures come back from the
//! solver and are never reported as an empty success.

use thiserror::Error;

use crate::models::ItemKind;
use crate::validation::ValidationError;

/// Errors produced by the rescheduling engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Bad granularity, empty time span, or malformed input values.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An item's own window cannot hold its duration at any slot.
    #[error("{kind} '{item}' cannot fit its duration inside its window")]
    InfeasibleWindow {
        /// Title of the offending item.
        item: String,
        /// Whether the item is a meeting or a commitment.
        kind: ItemKind,
    },

    /// The solver proved there is no schedule, or gave up undecided.
    #[error("no feasible schedule: {0}")]
    NoFeasibleSchedule(String),

    /// The search budget ran out before any schedule was found.
    #[error("solver budget exhausted after {nodes} nodes ({elapsed_ms} ms) without a decision")]
    SolverTimeout {
        /// Search nodes explored.
        nodes: u64,
        /// Wall-clock time spent in the solver.
        elapsed_ms: u64,
    },

    /// Structural input checks failed.
    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors.first() {
        Some(first) => format!("{} problem(s), first: {}", errors.len(), first.message),
        None => "no details".to_string(),
    }
}

/// Result alias for rescheduling operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_infeasible_window_message_names_item() {
        let err = ScheduleError::InfeasibleWindow {
            item: "Standup".into(),
            kind: ItemKind::Meeting,
        };
        assert_eq!(
            err.to_string(),
            "meeting request 'Standup' cannot fit its duration inside its window"
        );
    }

    #[test]
    fn test_invalid_input_message() {
        let err = ScheduleError::InvalidInput(vec![ValidationError::new(
            ValidationErrorKind::DuplicateId,
            "Duplicate person ID: alice",
        )]);
        let msg = err.to_string();
        assert!(msg.contains("1 problem(s)"));
        assert!(msg.contains("alice"));
    }
}
