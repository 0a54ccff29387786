//! Vendor-neutral constraint model.
//!
//! The model is a plain description: bounded integer variables with
//! explicit domains, boolean variables, half-reified relations
//! (`literal ⇒ relation`), clauses, and a linear objective over literals.
//! Any backend that supports those building blocks can implement
//! [`CpSolver`](super::CpSolver) against it.

use serde::{Deserialize, Serialize};

use super::CpSolution;

/// Handle to an integer decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntVar(pub(crate) usize);

/// Handle to a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoolVar(pub(crate) usize);

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Underlying variable.
    pub var: BoolVar,
    /// Whether the literal is `¬var`.
    pub negated: bool,
}

impl IntVar {
    /// Position of the variable in the model.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl BoolVar {
    /// Position of the variable in the model.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// The positive literal `var`.
    #[inline]
    pub fn lit(self) -> Literal {
        Literal {
            var: self,
            negated: false,
        }
    }

    /// The negative literal `¬var`.
    #[inline]
    pub fn not(self) -> Literal {
        Literal {
            var: self,
            negated: true,
        }
    }
}

impl Literal {
    /// Truth value of this literal given its variable's value.
    #[inline]
    pub fn eval(self, var_value: bool) -> bool {
        var_value != self.negated
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Self {
        var.lit()
    }
}

/// Integer variable definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntVarDef {
    /// Variable name (diagnostics only).
    pub name: String,
    /// Allowed values, sorted ascending without duplicates.
    pub domain: Vec<i64>,
    /// Preferred value to try first.
    pub hint: Option<i64>,
}

impl IntVarDef {
    /// Whether `value` is in the domain.
    pub fn allows(&self, value: i64) -> bool {
        self.domain.binary_search(&value).is_ok()
    }
}

/// A model constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// `enforce ⇒ before + offset ≤ after`.
    LessOrEqual {
        before: IntVar,
        offset: i64,
        after: IntVar,
        enforce: Literal,
    },
    /// `enforce ⇒ var = value`.
    Equals {
        var: IntVar,
        value: i64,
        enforce: Literal,
    },
    /// `enforce ⇒ var ≠ value`.
    NotEquals {
        var: IntVar,
        value: i64,
        enforce: Literal,
    },
    /// At least one literal holds.
    AtLeastOne(Vec<Literal>),
}

impl Constraint {
    /// Enforcement literal of a half-reified relation. `None` for clauses.
    pub fn enforcement(&self) -> Option<Literal> {
        match self {
            Constraint::LessOrEqual { enforce, .. }
            | Constraint::Equals { enforce, .. }
            | Constraint::NotEquals { enforce, .. } => Some(*enforce),
            Constraint::AtLeastOne(_) => None,
        }
    }

    /// Integer variables read by the relation.
    pub fn int_vars(&self) -> Vec<IntVar> {
        match self {
            Constraint::LessOrEqual { before, after, .. } => vec![*before, *after],
            Constraint::Equals { var, .. } | Constraint::NotEquals { var, .. } => vec![*var],
            Constraint::AtLeastOne(_) => Vec::new(),
        }
    }

    /// Evaluates the relation for fully known integer values.
    ///
    /// `value_of` returns `None` for unassigned variables, in which case
    /// the result is `None` too. Clauses always return `None`.
    pub fn relation_holds(&self, value_of: impl Fn(IntVar) -> Option<i64>) -> Option<bool> {
        match self {
            Constraint::LessOrEqual {
                before,
                offset,
                after,
                ..
            } => Some(value_of(*before)? + offset <= value_of(*after)?),
            Constraint::Equals { var, value, .. } => Some(value_of(*var)? == *value),
            Constraint::NotEquals { var, value, .. } => Some(value_of(*var)? != *value),
            Constraint::AtLeastOne(_) => None,
        }
    }
}

/// Linear objective term: `weight` is paid when `literal` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveTerm {
    pub literal: Literal,
    pub weight: i64,
}

/// A constraint optimization model (minimization).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpModel {
    name: String,
    int_vars: Vec<IntVarDef>,
    bool_vars: Vec<String>,
    constraints: Vec<Constraint>,
    objective: Vec<ObjectiveTerm>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an integer variable restricted to `domain`.
    pub fn new_int_var(
        &mut self,
        name: impl Into<String>,
        domain: impl IntoIterator<Item = i64>,
    ) -> IntVar {
        let mut domain: Vec<i64> = domain.into_iter().collect();
        domain.sort_unstable();
        domain.dedup();
        self.int_vars.push(IntVarDef {
            name: name.into(),
            domain,
            hint: None,
        });
        IntVar(self.int_vars.len() - 1)
    }

    /// Suggests a value to try first. Ignored if outside the domain.
    pub fn set_hint(&mut self, var: IntVar, value: i64) {
        self.int_vars[var.0].hint = Some(value);
    }

    /// Adds a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.bool_vars.push(name.into());
        BoolVar(self.bool_vars.len() - 1)
    }

    /// Adds `enforce ⇒ before + offset ≤ after`.
    pub fn add_less_or_equal_if(
        &mut self,
        before: IntVar,
        offset: i64,
        after: IntVar,
        enforce: Literal,
    ) {
        self.constraints.push(Constraint::LessOrEqual {
            before,
            offset,
            after,
            enforce,
        });
    }

    /// Adds `enforce ⇒ var = value`.
    pub fn add_equals_if(&mut self, var: IntVar, value: i64, enforce: Literal) {
        self.constraints
            .push(Constraint::Equals { var, value, enforce });
    }

    /// Adds `enforce ⇒ var ≠ value`.
    pub fn add_not_equals_if(&mut self, var: IntVar, value: i64, enforce: Literal) {
        self.constraints
            .push(Constraint::NotEquals { var, value, enforce });
    }

    /// Adds a clause: at least one of `literals` holds.
    pub fn add_at_least_one(&mut self, literals: impl IntoIterator<Item = Literal>) {
        self.constraints
            .push(Constraint::AtLeastOne(literals.into_iter().collect()));
    }

    /// Adds `weight · literal` to the minimization target.
    pub fn add_objective_term(&mut self, literal: Literal, weight: i64) {
        self.objective.push(ObjectiveTerm { literal, weight });
    }

    /// Integer variable definition.
    pub fn int_var(&self, var: IntVar) -> &IntVarDef {
        &self.int_vars[var.0]
    }

    /// All integer variable definitions.
    pub fn int_vars(&self) -> &[IntVarDef] {
        &self.int_vars
    }

    /// Boolean variable name.
    pub fn bool_var_name(&self, var: BoolVar) -> &str {
        &self.bool_vars[var.0]
    }

    /// All constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Objective terms.
    pub fn objective_terms(&self) -> &[ObjectiveTerm] {
        &self.objective
    }

    /// Number of integer variables.
    pub fn int_var_count(&self) -> usize {
        self.int_vars.len()
    }

    /// Number of boolean variables.
    pub fn bool_var_count(&self) -> usize {
        self.bool_vars.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value of a full boolean assignment.
    pub fn objective_value(&self, bool_values: &[bool]) -> i64 {
        self.objective
            .iter()
            .filter(|t| t.literal.eval(bool_values[t.literal.var.0]))
            .map(|t| t.weight)
            .sum()
    }

    /// Whether a solution assigns every variable and satisfies every
    /// domain and constraint.
    pub fn is_satisfied_by(&self, solution: &CpSolution) -> bool {
        if solution.int_values.len() != self.int_vars.len()
            || solution.bool_values.len() != self.bool_vars.len()
        {
            return false;
        }

        let domains_ok = self
            .int_vars
            .iter()
            .zip(&solution.int_values)
            .all(|(def, &v)| def.allows(v));
        if !domains_ok {
            return false;
        }

        let bool_of = |lit: Literal| lit.eval(solution.bool_values[lit.var.0]);
        self.constraints.iter().all(|c| match c {
            Constraint::AtLeastOne(lits) => lits.iter().any(|&l| bool_of(l)),
            relation => {
                let enforced = relation.enforcement().is_some_and(bool_of);
                !enforced
                    || relation
                        .relation_holds(|v| solution.int_values.get(v.0).copied())
                        .unwrap_or(false)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{SearchStats, SolveStatus};

    fn solution(ints: Vec<i64>, bools: Vec<bool>) -> CpSolution {
        CpSolution {
            status: SolveStatus::Feasible,
            int_values: ints,
            bool_values: bools,
            objective: 0,
            stats: SearchStats::default(),
        }
    }

    #[test]
    fn test_build_model() {
        let mut model = CpModel::new("m");
        let x = model.new_int_var("x", [3, 1, 2, 2]);
        let b = model.new_bool_var("b");
        model.set_hint(x, 2);
        model.add_equals_if(x, 2, b.lit());
        model.add_at_least_one([b.lit()]);
        model.add_objective_term(b.not(), 7);

        assert_eq!(model.name(), "m");
        assert_eq!(model.int_var(x).domain, vec![1, 2, 3]);
        assert_eq!(model.int_var(x).hint, Some(2));
        assert_eq!(model.bool_var_name(b), "b");
        assert_eq!(model.int_var_count(), 1);
        assert_eq!(model.bool_var_count(), 1);
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.objective_terms().len(), 1);
    }

    #[test]
    fn test_literal_eval() {
        let b = BoolVar(0);
        assert!(b.lit().eval(true));
        assert!(!b.lit().eval(false));
        assert!(b.not().eval(false));
        assert_eq!(Literal::from(b), b.lit());
    }

    #[test]
    fn test_is_satisfied_by() {
        let mut model = CpModel::new("disjunction");
        let x = model.new_int_var("x", 0..10);
        let y = model.new_int_var("y", 0..10);
        let x_first = model.new_bool_var("x_first");
        let y_first = model.new_bool_var("y_first");
        model.add_less_or_equal_if(x, 3, y, x_first.lit());
        model.add_less_or_equal_if(y, 2, x, y_first.lit());
        model.add_at_least_one([x_first.lit(), y_first.lit()]);

        assert!(model.is_satisfied_by(&solution(vec![0, 3], vec![true, false])));
        assert!(model.is_satisfied_by(&solution(vec![5, 3], vec![false, true])));
        // overlapping
        assert!(!model.is_satisfied_by(&solution(vec![0, 2], vec![true, false])));
        assert!(!model.is_satisfied_by(&solution(vec![0, 2], vec![false, false])));
        // out of domain
        assert!(!model.is_satisfied_by(&solution(vec![0, 12], vec![true, false])));
        // wrong arity
        assert!(!model.is_satisfied_by(&solution(vec![0], vec![true, false])));
    }

    #[test]
    fn test_objective_value() {
        let mut model = CpModel::new("obj");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.add_objective_term(a.lit(), 100);
        model.add_objective_term(b.not(), 1);

        assert_eq!(model.objective_value(&[true, true]), 100);
        assert_eq!(model.objective_value(&[true, false]), 101);
        assert_eq!(model.objective_value(&[false, true]), 0);
    }
}
