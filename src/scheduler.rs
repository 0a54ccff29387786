//! Rescheduling entry point.
//!
//! # Algorithm
//!
//! 1. Validate the configuration and the input records.
//! 2. Build the slot grid over every commitment and meeting window.
//! 3. Encode slot-index variables and per-person disjunctive non-overlap.
//! 4. Add moved indicators and the rank-weighted disruption objective.
//! 5. Solve with the configured [`CpSolver`].
//! 6. Extract intervals and the diff of moved commitments.
//!
//! Each call builds an independent model; a `Rescheduler` holds no state
//! between calls and can be shared across threads when its solver can.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::cp::{BranchAndBoundSolver, CpSolution, CpSolver};
use crate::encoder::{Encoding, ModelEncoder};
use crate::error::{Result, ScheduleError};
use crate::extract::ScheduleExtractor;
use crate::grid::SlotGrid;
use crate::models::{Commitment, MeetingRequest, Person, Schedule};
use crate::objective::{add_disruption_objective, MovedIndicator};
use crate::validation::validate_input;

/// Input container for one rescheduling call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReschedulingProblem {
    /// Calendar owners with their commitments.
    pub people: Vec<Person>,
    /// Meetings to place.
    #[serde(default)]
    pub meetings: Vec<MeetingRequest>,
}

impl ReschedulingProblem {
    /// Creates a problem.
    pub fn new(people: Vec<Person>, meetings: Vec<MeetingRequest>) -> Self {
        Self { people, meetings }
    }

    /// Creates a problem from a flat commitment list, one person per owner.
    pub fn from_commitments(
        commitments: impl IntoIterator<Item = Commitment>,
        meetings: Vec<MeetingRequest>,
    ) -> Self {
        Self {
            people: Person::group_by_owner(commitments),
            meetings,
        }
    }

    /// Adds a person.
    pub fn with_person(mut self, person: Person) -> Self {
        self.people.push(person);
        self
    }

    /// Adds a meeting request.
    pub fn with_meeting(mut self, meeting: MeetingRequest) -> Self {
        self.meetings.push(meeting);
        self
    }
}

/// An encoded problem, ready to be solved.
#[derive(Debug, Clone)]
pub struct PreparedModel {
    /// The slot grid.
    pub grid: SlotGrid,
    /// Variables and constraints.
    pub encoding: Encoding,
    /// One moved indicator per commitment.
    pub indicators: Vec<MovedIndicator>,
}

/// Disruption-minimizing meeting rescheduler.
///
/// # Horizon
///
/// The grid ends at the latest commitment end or meeting window bound.
/// With the default config (`reschedule_horizon_minutes = 0`) a calendar
/// booked across a meeting's whole window has no free slot to move into:
/// one person fully booked 09:00–17:00 and a 30-minute meeting allowed
/// only in 09:00–17:00 yields [`ScheduleError::NoFeasibleSchedule`]. Set
/// [`SchedulerConfig::reschedule_horizon_minutes`] (for example with
/// [`SchedulerConfig::with_reschedule_horizon`]) to let displaced
/// commitments run past that bound; with 30 minutes the booking moves to
/// 09:30–17:30 and the meeting takes 09:00.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use u_reschedule::models::{Commitment, MeetingRequest, Person};
/// use u_reschedule::{Rescheduler, SchedulerConfig};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 3, 4, h, 0, 0).unwrap();
/// let people = vec![
///     Person::new("alice").with_commitment(Commitment::new("Review", "alice", at(9), at(10)).with_rank(1)),
/// ];
/// let meetings = vec![MeetingRequest::new("Sync", 30, at(9), at(17)).with_required("alice")];
///
/// let schedule = Rescheduler::new(SchedulerConfig::default())
///     .schedule(&people, &meetings)
///     .unwrap();
/// assert!(schedule.rescheduled.is_empty());
/// assert!(schedule.meeting("Sync").unwrap().start >= at(10));
/// ```
#[derive(Debug, Clone)]
pub struct Rescheduler<S: CpSolver = BranchAndBoundSolver> {
    config: SchedulerConfig,
    solver: S,
}

impl Rescheduler<BranchAndBoundSolver> {
    /// Creates a rescheduler backed by the built-in solver.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_solver(config, BranchAndBoundSolver::new())
    }
}

impl Default for Rescheduler<BranchAndBoundSolver> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<S: CpSolver> Rescheduler<S> {
    /// Creates a rescheduler backed by `solver`.
    pub fn with_solver(config: SchedulerConfig, solver: S) -> Self {
        Self { config, solver }
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validates the input and builds the model without solving it.
    ///
    /// # Errors
    /// - `Configuration` for a bad config or an empty time span.
    /// - `InvalidInput` when structural checks fail.
    /// - `InfeasibleWindow` for the first item that cannot fit its window.
    pub fn build_model(
        &self,
        people: &[Person],
        meetings: &[MeetingRequest],
    ) -> Result<PreparedModel> {
        self.config.validate()?;
        validate_input(people, meetings).map_err(ScheduleError::InvalidInput)?;

        let grid = SlotGrid::build(
            people,
            meetings,
            self.config.granularity_minutes,
            self.config.reschedule_horizon_minutes,
        )?;
        let mut encoding = ModelEncoder::new(&grid, people, meetings).encode()?;
        let indicators =
            add_disruption_objective(&mut encoding.model, &grid, people, &encoding.commitments);

        Ok(PreparedModel {
            grid,
            encoding,
            indicators,
        })
    }

    /// Places every meeting and returns the schedule with minimal disruption.
    ///
    /// # Errors
    /// Everything [`build_model`](Self::build_model) reports, plus
    /// `NoFeasibleSchedule` and `SolverTimeout` from the solve step.
    pub fn schedule(&self, people: &[Person], meetings: &[MeetingRequest]) -> Result<Schedule> {
        let prepared = self.build_model(people, meetings)?;
        let solution = self.solve(&prepared);

        ScheduleExtractor::new(
            &prepared.grid,
            people,
            meetings,
            &prepared.encoding,
            &prepared.indicators,
        )
        .extract(&solution, self.config.diff_scope)
    }

    /// Schedules a bundled problem.
    pub fn schedule_problem(&self, problem: &ReschedulingProblem) -> Result<Schedule> {
        self.schedule(&problem.people, &problem.meetings)
    }

    fn solve(&self, prepared: &PreparedModel) -> CpSolution {
        let model = &prepared.encoding.model;
        let solution = self.solver.solve(model, &self.config.solver);
        debug_assert!(!solution.is_solution_found() || model.is_satisfied_by(&solution));

        info!(
            status = ?solution.status,
            objective = solution.objective,
            nodes = solution.stats.nodes,
            elapsed_ms = solution.stats.elapsed_ms,
            "solved rescheduling model"
        );
        if solution.stats.budget_exhausted {
            warn!(
                nodes = solution.stats.nodes,
                elapsed_ms = solution.stats.elapsed_ms,
                "search budget exhausted"
            );
        }
        solution
    }
}
