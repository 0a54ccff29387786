//! Depth-first branch-and-bound backend.
//!
//! # Algorithm
//!
//! 1. Every integer variable keeps a live domain. After each assignment,
//!    forward checking removes the values of unassigned neighbours that
//!    would fail a relation, force a boolean both ways, or kill a clause.
//! 2. Branch on the unassigned variable with the fewest live values; ties
//!    go to unhinted variables, then model position.
//! 3. Values are tried cheapest first: the cost of the objective literals
//!    the variable alone decides, then the cost the value takes away from
//!    the cheapest values of unassigned neighbours, then hint and
//!    ascending order.
//! 4. Bound: cost of forced literals plus, for every unassigned variable,
//!    the cheapest live value of the literals it alone decides. A branch
//!    whose bound reaches the incumbent is cut.
//! 5. At a leaf, the remaining booleans are completed exactly: unit
//!    propagation over the clauses, then branching, keeping the cheapest
//!    completion.
//!
//! Exhaustive search yields `Optimal` or `Infeasible`. A node or time
//! limit yields `Feasible` (incumbent kept) or `Unknown`.
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling", Ch. 1
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems" (forward checking, fail-first)
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete
//!   Programming Problems"

use std::time::Instant;

use tracing::debug;

use super::{
    Constraint, CpModel, CpSolution, CpSolver, Literal, SearchStats, SolveStatus, SolverConfig,
};

/// Neighbours with more equally cheap values than this are left out of
/// the value-ordering estimate.
const DAMAGE_SCAN_LIMIT: usize = 8;

/// Built-in exact solver for small and medium models.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let mut search = Search::new(model, config);
        search.run();
        search.finish()
    }
}

struct Incumbent {
    ints: Vec<i64>,
    bools: Vec<bool>,
    objective: i64,
}

/// Which integer variable decides a boolean on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Unclaimed,
    Var(usize),
    Shared,
}

/// Undo record.
#[derive(Debug, Clone, Copy)]
enum Change {
    Assigned(usize),
    Forced(usize, bool),
    Pruned(usize, usize),
}

struct Search<'a> {
    model: &'a CpModel,
    config: &'a SolverConfig,
    started: Instant,
    /// var → candidate values, hint first then ascending
    values_of: Vec<Vec<i64>>,
    hinted: Vec<bool>,
    /// var → value position → cost of the literals only this var decides
    own_cost: Vec<Vec<i64>>,
    alive: Vec<Vec<bool>>,
    alive_count: Vec<usize>,
    /// int var → relation constraints reading it
    relations_of: Vec<Vec<usize>>,
    /// bool var → clauses mentioning it
    clauses_of: Vec<Vec<usize>>,
    /// int var → int vars sharing a relation
    neighbours: Vec<Vec<usize>>,
    cost_true: Vec<i64>,
    cost_false: Vec<i64>,
    values: Vec<Option<i64>>,
    forced_true: Vec<u32>,
    forced_false: Vec<u32>,
    trail: Vec<Change>,
    /// objective floor from forced literals (free ones at their cheaper value)
    forced_bound: i64,
    best: Option<Incumbent>,
    nodes: u64,
    exhausted: bool,
}

impl<'a> Search<'a> {
    fn new(model: &'a CpModel, config: &'a SolverConfig) -> Self {
        let n_int = model.int_var_count();
        let n_bool = model.bool_var_count();

        let mut relations_of = vec![Vec::new(); n_int];
        let mut clauses_of = vec![Vec::new(); n_bool];
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n_int];
        let mut owner = vec![Owner::Unclaimed; n_bool];
        for (ci, c) in model.constraints().iter().enumerate() {
            match c {
                Constraint::AtLeastOne(lits) => {
                    for lit in lits {
                        clauses_of[lit.var.index()].push(ci);
                    }
                }
                relation => {
                    let vars = relation.int_vars();
                    for v in &vars {
                        relations_of[v.index()].push(ci);
                        for w in &vars {
                            if w != v {
                                neighbours[v.index()].push(w.index());
                            }
                        }
                    }
                    if let Some(lit) = relation.enforcement() {
                        let b = lit.var.index();
                        owner[b] = match (owner[b], vars.as_slice()) {
                            (Owner::Unclaimed, [x]) => Owner::Var(x.index()),
                            (Owner::Var(y), [x]) if y == x.index() => Owner::Var(y),
                            _ => Owner::Shared,
                        };
                    }
                }
            }
        }
        for list in relations_of
            .iter_mut()
            .chain(clauses_of.iter_mut())
            .chain(neighbours.iter_mut())
        {
            list.sort_unstable();
            list.dedup();
        }

        let mut cost_true = vec![0; n_bool];
        let mut cost_false = vec![0; n_bool];
        for term in model.objective_terms() {
            if term.literal.negated {
                cost_false[term.literal.var.index()] += term.weight;
            } else {
                cost_true[term.literal.var.index()] += term.weight;
            }
        }
        let forced_bound = cost_true
            .iter()
            .zip(&cost_false)
            .map(|(&t, &f)| t.min(f))
            .sum();

        let defs = model.int_vars();
        let values_of: Vec<Vec<i64>> = defs
            .iter()
            .map(|def| match def.hint.filter(|h| def.allows(*h)) {
                Some(hint) => std::iter::once(hint)
                    .chain(def.domain.iter().copied().filter(|&v| v != hint))
                    .collect(),
                None => def.domain.clone(),
            })
            .collect();
        let hinted = defs.iter().map(|def| def.hint.is_some()).collect();

        let mut own_cost = Vec::with_capacity(n_int);
        let mut alive = Vec::with_capacity(n_int);
        for (x, candidates) in values_of.iter().enumerate() {
            let costs: Vec<Option<i64>> = candidates
                .iter()
                .map(|&v| {
                    unary_cost(model, &relations_of[x], &owner, &cost_true, &cost_false, x, v)
                })
                .collect();
            alive.push(costs.iter().map(Option::is_some).collect::<Vec<bool>>());
            own_cost.push(costs.into_iter().map(|c| c.unwrap_or(0)).collect::<Vec<i64>>());
        }
        let alive_count = alive
            .iter()
            .map(|a: &Vec<bool>| a.iter().filter(|&&ok| ok).count())
            .collect();

        Self {
            model,
            config,
            started: Instant::now(),
            values_of,
            hinted,
            own_cost,
            alive,
            alive_count,
            relations_of,
            clauses_of,
            neighbours,
            cost_true,
            cost_false,
            values: vec![None; n_int],
            forced_true: vec![0; n_bool],
            forced_false: vec![0; n_bool],
            trail: Vec::new(),
            forced_bound,
            best: None,
            nodes: 0,
            exhausted: false,
        }
    }

    fn run(&mut self) {
        let Some(var) = self.select_var() else {
            self.record_leaf();
            return;
        };
        let Some(floor) = self.cheapest_alive(var) else {
            return;
        };
        let bound = self.bound();

        for j in self.order_values(var, bound, floor) {
            let own = self.own_cost[var][j];
            if self.incumbent_at_most(bound - floor + own) {
                // candidates are sorted by own cost
                break;
            }
            if self.over_budget() {
                return;
            }
            self.nodes += 1;
            let mark = self.trail.len();
            let value = self.values_of[var][j];
            if self.place(var, value) && self.forward_check(var) {
                let bound = self.bound();
                if !self.incumbent_at_most(bound) {
                    self.run();
                }
            }
            self.undo_to(mark);
            if self.exhausted {
                return;
            }
        }
    }

    fn over_budget(&mut self) -> bool {
        if self.exhausted {
            return true;
        }
        if self.config.node_limit.is_some_and(|limit| self.nodes >= limit) {
            self.exhausted = true;
        } else if let Some(limit) = self.config.time_limit_ms {
            if self.nodes % 64 == 0 && self.started.elapsed().as_millis() as u64 >= limit {
                self.exhausted = true;
            }
        }
        self.exhausted
    }

    /// Whether an incumbent exists with objective `<= value`.
    fn incumbent_at_most(&self, value: i64) -> bool {
        self.best.as_ref().is_some_and(|best| best.objective <= value)
    }

    /// Unassigned variable with the fewest live values, unhinted first.
    fn select_var(&self) -> Option<usize> {
        (0..self.values.len())
            .filter(|&x| self.values[x].is_none())
            .min_by_key(|&x| (self.alive_count[x], self.hinted[x], x))
    }

    fn cheapest_alive(&self, var: usize) -> Option<i64> {
        self.alive_positions(var)
            .map(|j| self.own_cost[var][j])
            .min()
    }

    fn alive_positions(&self, var: usize) -> impl Iterator<Item = usize> + '_ {
        self.alive[var]
            .iter()
            .enumerate()
            .filter(|(_, &ok)| ok)
            .map(|(j, _)| j)
    }

    /// Objective lower bound of the current node.
    fn bound(&self) -> i64 {
        let open: i64 = (0..self.values.len())
            .filter(|&x| self.values[x].is_none())
            .filter_map(|x| self.cheapest_alive(x))
            .sum();
        self.forced_bound + open
    }

    /// Live value positions of `var`, cheapest first.
    fn order_values(&mut self, var: usize, bound: i64, floor: i64) -> Vec<usize> {
        let positions: Vec<usize> = self.alive_positions(var).collect();
        let mut keyed = Vec::with_capacity(positions.len());
        for j in positions {
            let own = self.own_cost[var][j];
            let damage = if self.incumbent_at_most(bound - floor + own) {
                0
            } else {
                self.damage(var, self.values_of[var][j])
            };
            keyed.push((own, damage, j));
        }
        keyed.sort_unstable();
        keyed.into_iter().map(|(_, _, j)| j).collect()
    }

    /// Cost that `var = value` takes away from unassigned neighbours whose
    /// cheapest live values it rules out.
    fn damage(&mut self, var: usize, value: i64) -> i64 {
        let mark = self.trail.len();
        if !self.place(var, value) {
            self.undo_to(mark);
            return i64::MAX;
        }

        let mut total: i64 = 0;
        for k in 0..self.neighbours[var].len() {
            let y = self.neighbours[var][k];
            if self.values[y].is_some() {
                continue;
            }
            let Some(floor) = self.cheapest_alive(y) else {
                continue;
            };
            let cheapest: Vec<usize> = self
                .alive_positions(y)
                .filter(|&j| self.own_cost[y][j] == floor)
                .collect();
            if cheapest.len() > DAMAGE_SCAN_LIMIT {
                continue;
            }
            let mut survives = false;
            for j in cheapest {
                if self.consistent(y, self.values_of[y][j]) {
                    survives = true;
                    break;
                }
            }
            if !survives {
                let next = self
                    .alive_positions(y)
                    .map(|j| self.own_cost[y][j])
                    .filter(|&c| c > floor)
                    .min();
                let loss = next.map_or(i64::MAX / 4, |c| c - floor);
                total = total.saturating_add(loss);
            }
        }

        self.undo_to(mark);
        total
    }

    /// Assigns `var = value` and forces the enforcement literals of the
    /// relations it fails. Returns `false` on conflict; the caller must
    /// `undo_to` either way.
    fn place(&mut self, var: usize, value: i64) -> bool {
        self.values[var] = Some(value);
        self.trail.push(Change::Assigned(var));
        let model = self.model;
        for k in 0..self.relations_of[var].len() {
            let c = &model.constraints()[self.relations_of[var][k]];
            let values = &self.values;
            if c.relation_holds(|v| values[v.index()]) == Some(false) {
                if let Some(lit) = c.enforcement() {
                    // the enforcement literal must be false
                    if !self.force(lit.var.index(), lit.negated) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Whether `var = value` is compatible with the current assignment.
    fn consistent(&mut self, var: usize, value: i64) -> bool {
        let mark = self.trail.len();
        let ok = self.place(var, value);
        self.undo_to(mark);
        ok
    }

    /// Prunes neighbour values incompatible with the assignment of `var`.
    fn forward_check(&mut self, var: usize) -> bool {
        for k in 0..self.neighbours[var].len() {
            let y = self.neighbours[var][k];
            if self.values[y].is_some() {
                continue;
            }
            for j in 0..self.values_of[y].len() {
                if !self.alive[y][j] {
                    continue;
                }
                if !self.consistent(y, self.values_of[y][j]) {
                    self.alive[y][j] = false;
                    self.alive_count[y] -= 1;
                    self.trail.push(Change::Pruned(y, j));
                }
            }
            if self.alive_count[y] == 0 {
                return false;
            }
        }
        true
    }

    fn force(&mut self, b: usize, value: bool) -> bool {
        let first = if value {
            self.forced_true[b] += 1;
            self.forced_true[b] == 1
        } else {
            self.forced_false[b] += 1;
            self.forced_false[b] == 1
        };
        self.trail.push(Change::Forced(b, value));
        if first {
            self.forced_bound += self.bound_delta(b, value);
        }

        if self.forced_true[b] > 0 && self.forced_false[b] > 0 {
            return false;
        }
        let model = self.model;
        self.clauses_of[b].iter().all(|&ci| match &model.constraints()[ci] {
            Constraint::AtLeastOne(lits) => lits.iter().any(|&l| !self.is_dead(l)),
            _ => true,
        })
    }

    /// Lower-bound change when `b` first becomes forced to `value`.
    fn bound_delta(&self, b: usize, value: bool) -> i64 {
        let chosen = if value { self.cost_true[b] } else { self.cost_false[b] };
        chosen - self.cost_true[b].min(self.cost_false[b])
    }

    fn is_dead(&self, lit: Literal) -> bool {
        let b = lit.var.index();
        if lit.negated {
            self.forced_true[b] > 0
        } else {
            self.forced_false[b] > 0
        }
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(change) = self.trail.pop() else {
                break;
            };
            match change {
                Change::Assigned(var) => self.values[var] = None,
                Change::Forced(b, value) => {
                    let now_free = if value {
                        self.forced_true[b] -= 1;
                        self.forced_true[b] == 0
                    } else {
                        self.forced_false[b] -= 1;
                        self.forced_false[b] == 0
                    };
                    if now_free {
                        self.forced_bound -= self.bound_delta(b, value);
                    }
                }
                Change::Pruned(var, j) => {
                    self.alive[var][j] = true;
                    self.alive_count[var] += 1;
                }
            }
        }
    }

    fn record_leaf(&mut self) {
        let partial: Vec<Option<bool>> = (0..self.model.bool_var_count())
            .map(|b| {
                if self.forced_true[b] > 0 {
                    Some(true)
                } else if self.forced_false[b] > 0 {
                    Some(false)
                } else {
                    None
                }
            })
            .collect();
        let limit = self.best.as_ref().map(|b| b.objective);
        let Some((bools, objective)) = self.complete_bools(partial, limit) else {
            return;
        };
        let ints = self.values.iter().map(|v| v.unwrap_or_default()).collect();
        self.best = Some(Incumbent {
            ints,
            bools,
            objective,
        });
    }

    /// Cheapest clause-satisfying completion of `partial` with objective
    /// below `limit`.
    fn complete_bools(
        &mut self,
        mut partial: Vec<Option<bool>>,
        limit: Option<i64>,
    ) -> Option<(Vec<bool>, i64)> {
        if !self.propagate_units(&mut partial) {
            return None;
        }
        let floor: i64 = partial
            .iter()
            .enumerate()
            .map(|(b, v)| match v {
                Some(true) => self.cost_true[b],
                Some(false) => self.cost_false[b],
                None => self.cost_true[b].min(self.cost_false[b]),
            })
            .sum();
        if limit.is_some_and(|l| floor >= l) {
            return None;
        }

        let Some(lit) = self.open_clause_literal(&partial) else {
            let bools: Vec<bool> = partial
                .iter()
                .enumerate()
                .map(|(b, v)| v.unwrap_or(self.cost_true[b] < self.cost_false[b]))
                .collect();
            return Some((bools, floor));
        };

        self.nodes += 1;
        let b = lit.var.index();
        let mut limit = limit;
        let mut found = None;
        // satisfy the clause first
        for value in [!lit.negated, lit.negated] {
            let mut next = partial.clone();
            next[b] = Some(value);
            if let Some(completion) = self.complete_bools(next, limit) {
                limit = Some(completion.1);
                found = Some(completion);
            }
        }
        found
    }

    /// Fixes literals of unit clauses until none is left. Returns `false`
    /// when a clause has every literal false.
    fn propagate_units(&self, partial: &mut [Option<bool>]) -> bool {
        loop {
            let mut changed = false;
            for c in self.model.constraints() {
                let Constraint::AtLeastOne(lits) = c else {
                    continue;
                };
                let mut satisfied = false;
                let mut free = None;
                let mut free_count = 0;
                for &l in lits {
                    match partial[l.var.index()] {
                        Some(v) if l.eval(v) => {
                            satisfied = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            free_count += 1;
                            free = Some(l);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match (free_count, free) {
                    (0, _) => return false,
                    (1, Some(l)) => {
                        partial[l.var.index()] = Some(!l.negated);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return true;
            }
        }
    }

    /// A free literal of the first clause not yet satisfied.
    fn open_clause_literal(&self, partial: &[Option<bool>]) -> Option<Literal> {
        self.model.constraints().iter().find_map(|c| {
            let Constraint::AtLeastOne(lits) = c else {
                return None;
            };
            let satisfied = lits
                .iter()
                .any(|l| partial[l.var.index()].is_some_and(|v| l.eval(v)));
            if satisfied {
                return None;
            }
            lits.iter()
                .find(|l| partial[l.var.index()].is_none())
                .copied()
        })
    }

    fn finish(self) -> CpSolution {
        let stats = SearchStats {
            nodes: self.nodes,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            budget_exhausted: self.exhausted,
        };
        debug!(
            model = self.model.name(),
            nodes = stats.nodes,
            elapsed_ms = stats.elapsed_ms,
            exhausted = stats.budget_exhausted,
            "branch-and-bound search finished"
        );
        match (self.best, self.exhausted) {
            (Some(best), exhausted) => CpSolution {
                status: if exhausted {
                    SolveStatus::Feasible
                } else {
                    SolveStatus::Optimal
                },
                int_values: best.ints,
                bool_values: best.bools,
                objective: best.objective,
                stats,
            },
            (None, true) => CpSolution::without_solution(SolveStatus::Unknown, stats),
            (None, false) => CpSolution::without_solution(SolveStatus::Infeasible, stats),
        }
    }
}

/// Cost above the floor of the booleans that `x = v` decides on its own,
/// or `None` if those booleans would be forced both ways.
fn unary_cost(
    model: &CpModel,
    relations: &[usize],
    owner: &[Owner],
    cost_true: &[i64],
    cost_false: &[i64],
    x: usize,
    v: i64,
) -> Option<i64> {
    let mut forced: Vec<(usize, bool)> = Vec::new();
    for &ci in relations {
        let c = &model.constraints()[ci];
        let Some(lit) = c.enforcement() else {
            continue;
        };
        let b = lit.var.index();
        if owner[b] != Owner::Var(x) {
            continue;
        }
        if c.relation_holds(|_| Some(v)) == Some(false) {
            let value = lit.negated;
            match forced.iter().find(|(fb, _)| *fb == b) {
                Some(&(_, other)) if other != value => return None,
                Some(_) => {}
                None => forced.push((b, value)),
            }
        }
    }
    Some(
        forced
            .iter()
            .map(|&(b, value)| {
                let chosen = if value { cost_true[b] } else { cost_false[b] };
                chosen - cost_true[b].min(cost_false[b])
            })
            .sum(),
    )
}
