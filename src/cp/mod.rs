//! Constraint programming layer.
//!
//! The rescheduler describes its problem as a [`CpModel`] and hands it to
//! any [`CpSolver`]. The model needs only bounded integer variables with
//! explicit domains, boolean indicators, half-reified relations, clauses,
//! and a linear minimization objective, so a MIP or CP-SAT backend can
//! implement the trait by translating the model. [`BranchAndBoundSolver`]
//! is the built-in backend.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod model;
mod search;
mod solution;

pub use model::{BoolVar, Constraint, CpModel, IntVar, IntVarDef, Literal, ObjectiveTerm};
pub use search::BranchAndBoundSolver;
pub use solution::{CpSolution, SearchStats, SolveStatus, SolverConfig};

/// A backend able to solve a [`CpModel`].
///
/// Implementations must return `Optimal` or `Feasible` only with a full
/// assignment that satisfies the model, and should stop when the
/// configured budget is spent, reporting `SearchStats::budget_exhausted`.
pub trait CpSolver {
    /// Solves `model` within `config`'s budget.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}
