//! Solver configuration and results.

use serde::{Deserialize, Serialize};

use super::{BoolVar, IntVar, Literal};

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// A solution was found; the budget ran out before proving optimality.
    Feasible,
    /// No solution exists.
    Infeasible,
    /// The solver stopped without a solution and without a proof.
    Unknown,
}

impl SolveStatus {
    /// Whether a solution is available.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Search budget.
///
/// `node_limit` is deterministic: identical inputs explore identical trees.
/// `time_limit_ms` is not, so results under a time limit may vary between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock limit (ms). `None` = unlimited.
    pub time_limit_ms: Option<u64>,
    /// Maximum search nodes. `None` = unlimited.
    pub node_limit: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            node_limit: Some(500_000),
        }
    }
}

impl SolverConfig {
    /// No limits at all.
    pub fn unlimited() -> Self {
        Self {
            time_limit_ms: None,
            node_limit: None,
        }
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }
}

/// Search statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Value assignments tried.
    pub nodes: u64,
    /// Wall-clock time (ms).
    pub elapsed_ms: u64,
    /// Whether a limit stopped the search.
    pub budget_exhausted: bool,
}

/// A solver result.
///
/// When `status.has_solution()`, `int_values` and `bool_values` hold one
/// entry per model variable, indexed by the variable handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpSolution {
    pub status: SolveStatus,
    pub int_values: Vec<i64>,
    pub bool_values: Vec<bool>,
    pub objective: i64,
    pub stats: SearchStats,
}

impl CpSolution {
    /// A result carrying no assignment.
    pub fn without_solution(status: SolveStatus, stats: SearchStats) -> Self {
        Self {
            status,
            int_values: Vec::new(),
            bool_values: Vec::new(),
            objective: 0,
            stats,
        }
    }

    /// Whether a solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }

    /// Value of an integer variable.
    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.int_values.get(var.index()).copied()
    }

    /// Value of a boolean variable.
    pub fn bool_value(&self, var: BoolVar) -> Option<bool> {
        self.bool_values.get(var.index()).copied()
    }

    /// Value of a literal.
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.bool_value(lit.var).map(|v| lit.eval(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Unknown.has_solution());
    }

    #[test]
    fn test_solver_config() {
        let default = SolverConfig::default();
        assert_eq!(default.node_limit, Some(500_000));
        assert_eq!(default.time_limit_ms, None);

        let c = SolverConfig::unlimited().with_time_limit_ms(500);
        assert_eq!(c.time_limit_ms, Some(500));
        assert_eq!(c.node_limit, None);
    }

    #[test]
    fn test_solution_accessors() {
        let s = CpSolution {
            status: SolveStatus::Optimal,
            int_values: vec![4, 7],
            bool_values: vec![true],
            objective: 3,
            stats: SearchStats::default(),
        };
        assert!(s.is_solution_found());
        assert_eq!(s.value(IntVar(1)), Some(7));
        assert_eq!(s.value(IntVar(2)), None);
        assert_eq!(s.bool_value(BoolVar(0)), Some(true));
        assert_eq!(s.literal_value(BoolVar(0).not()), Some(false));

        let empty = CpSolution::without_solution(SolveStatus::Infeasible, SearchStats::default());
        assert!(!empty.is_solution_found());
        assert_eq!(empty.value(IntVar(0)), None);
    }

    #[test]
    fn test_status_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&SolveStatus::Optimal).unwrap(), "\"OPTIMAL\"");
    }
}
