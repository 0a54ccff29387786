//! Rescheduler configuration.
//!
//! All fields have defaults; a config can be built in code with the
//! `with_*` setters or deserialized (missing fields fall back to defaults).

use serde::{Deserialize, Serialize};

use crate::cp::SolverConfig;
use crate::error::{Result, ScheduleError};

/// Default slot width in minutes.
pub const DEFAULT_GRANULARITY_MINUTES: i64 = 15;

/// Widest accepted slot: one day.
pub const MAX_GRANULARITY_MINUTES: i64 = 24 * 60;

/// Longest accepted horizon extension: one leap year.
pub const MAX_RESCHEDULE_HORIZON_MINUTES: i64 = 366 * 24 * 60;

/// Which rescheduled commitments are attached to each meeting result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffScope {
    /// Every meeting result carries the full list of moved commitments.
    #[default]
    Global,
    /// A meeting result carries only commitments owned by its required people.
    Participants,
}

/// Configuration for a [`Rescheduler`](crate::scheduler::Rescheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Width of one grid slot (minutes, 1..=[`MAX_GRANULARITY_MINUTES`]).
    pub granularity_minutes: i64,
    /// Extra minutes appended to the end of the grid so that commitments
    /// may move past the latest input bound
    /// (0..=[`MAX_RESCHEDULE_HORIZON_MINUTES`]).
    pub reschedule_horizon_minutes: i64,
    /// Scope of the per-meeting rescheduling diff.
    pub diff_scope: DiffScope,
    /// Search budget for the solver backend.
    pub solver: SolverConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            reschedule_horizon_minutes: 0,
            diff_scope: DiffScope::Global,
            solver: SolverConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the slot width.
    pub fn with_granularity(mut self, minutes: i64) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    /// Sets the horizon extension.
    pub fn with_reschedule_horizon(mut self, minutes: i64) -> Self {
        self.reschedule_horizon_minutes = minutes;
        self
    }

    /// Sets the diff scope.
    pub fn with_diff_scope(mut self, scope: DiffScope) -> Self {
        self.diff_scope = scope;
        self
    }

    /// Sets the solver budget.
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.granularity_minutes <= 0 {
            return Err(ScheduleError::Configuration(format!(
                "granularity must be positive, got {} minutes",
                self.granularity_minutes
            )));
        }
        if self.granularity_minutes > MAX_GRANULARITY_MINUTES {
            return Err(ScheduleError::Configuration(format!(
                "granularity must be at most {MAX_GRANULARITY_MINUTES} minutes, got {}",
                self.granularity_minutes
            )));
        }
        if self.reschedule_horizon_minutes < 0 {
            return Err(ScheduleError::Configuration(format!(
                "reschedule horizon must not be negative, got {} minutes",
                self.reschedule_horizon_minutes
            )));
        }
        if self.reschedule_horizon_minutes > MAX_RESCHEDULE_HORIZON_MINUTES {
            return Err(ScheduleError::Configuration(format!(
                "reschedule horizon must be at most {MAX_RESCHEDULE_HORIZON_MINUTES} minutes, got {}",
                self.reschedule_horizon_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.granularity_minutes, 15);
        assert_eq!(config.reschedule_horizon_minutes, 0);
        assert_eq!(config.diff_scope, DiffScope::Global);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .with_granularity(30)
            .with_reschedule_horizon(60)
            .with_diff_scope(DiffScope::Participants)
            .with_solver(SolverConfig::default().with_node_limit(10));

        assert_eq!(config.granularity_minutes, 30);
        assert_eq!(config.reschedule_horizon_minutes, 60);
        assert_eq!(config.diff_scope, DiffScope::Participants);
        assert_eq!(config.solver.node_limit, Some(10));
    }

    #[test]
    fn test_rejects_non_positive_granularity() {
        let err = SchedulerConfig::new().with_granularity(0).validate().unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));

        let err = SchedulerConfig::new().with_granularity(-15).validate().unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }

    #[test]
    fn test_rejects_negative_horizon() {
        let err = SchedulerConfig::new()
            .with_reschedule_horizon(-1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        for config in [
            SchedulerConfig::new().with_granularity(MAX_GRANULARITY_MINUTES + 1),
            SchedulerConfig::new().with_granularity(i64::MAX),
            SchedulerConfig::new().with_reschedule_horizon(MAX_RESCHEDULE_HORIZON_MINUTES + 1),
            SchedulerConfig::new().with_reschedule_horizon(i64::MAX / 2),
        ] {
            assert!(matches!(config.validate(), Err(ScheduleError::Configuration(_))));
        }

        let edge = SchedulerConfig::new()
            .with_granularity(MAX_GRANULARITY_MINUTES)
            .with_reschedule_horizon(MAX_RESCHEDULE_HORIZON_MINUTES);
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"granularity_minutes": 5, "diff_scope": "participants"}"#)
                .unwrap();
        assert_eq!(config.granularity_minutes, 5);
        assert_eq!(config.diff_scope, DiffScope::Participants);
        assert_eq!(config.reschedule_horizon_minutes, 0);
        assert_eq!(config.solver, SolverConfig::default());
    }
}
