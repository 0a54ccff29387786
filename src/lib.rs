//! Disruption-minimizing meeting rescheduling.
//!
//! Places new group meetings on people's calendars, moving existing
//! commitments only when needed and preferring to move the least important
//! ones. Time is discretized into a slot grid, every item becomes a
//! slot-index variable, each person is a unit-capacity resource, and the
//! rank-weighted count of moved commitments is minimized.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Commitment`, `Person`, `MeetingRequest`,
//!   `TimeWindow`, `Schedule`
//! - **`grid`**: Slot grid over the relevant time span
//! - **`encoder`**: Slot-index variables and pairwise disjunctive non-overlap
//! - **`objective`**: Rank weights and moved indicators
//! - **`cp`**: Solver-neutral model, `CpSolver` trait, built-in branch-and-bound
//! - **`extract`**: Solution → intervals and diff of moved commitments
//! - **`scheduler`**: `Rescheduler`, the end-to-end pipeline
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown people)
//! - **`config`**: `SchedulerConfig`
//! - **`error`**: `ScheduleError`
//!
//! # Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

pub mod config;
pub mod cp;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod grid;
pub mod models;
pub mod objective;
pub mod scheduler;
pub mod validation;

pub use config::{DiffScope, SchedulerConfig};
pub use error::{Result, ScheduleError};
pub use scheduler::{ReschedulingProblem, Rescheduler};
