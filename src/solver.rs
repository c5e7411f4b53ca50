//! Solver façade (component G)
//!
//! `SimplexSolver` is the crate's public entry point: it owns the
//! variable registry, the tableau, the distinguished objective row, a
//! `constraint id -> installed variables` map used for removal, the edit
//! session state, and the optional [`PivotTrace`]. Every other module in
//! this crate is a building block this façade assembles into the
//! add/remove/edit/resolve protocol.
//!
//! A constraint's canonical expression is normalised to `E ⋈ 0`, which
//! this module reads as the implicit equation `E = 0` (after augmenting
//! `E` with a slack/dummy/error term to turn the inequality or soft
//! equality into a hard one). Solving that equation for a chosen
//! variable — [`Expression::new_subject`] — is what turns it into an
//! actual tableau row.

use std::collections::{HashMap, HashSet};

use crate::config::SolverConfig;
use crate::constraint::{Constraint, RelationalOperator};
use crate::error::{CassowaryError, CassowaryResult};
use crate::expression::Expression;
use crate::simplex::{dual_optimize, primal_optimize};
use crate::strength::Strength;
use crate::tableau::Tableau;
use crate::trace::PivotTrace;
use crate::variable::{Variable, VariableRegistry};

/// The variables a single installed [`Constraint`] contributed to the
/// tableau, kept so `remove_constraint` can undo exactly what
/// `add_constraint` did.
#[derive(Debug, Clone)]
struct Installed {
    /// The variable used as this constraint's handle: a slack for a
    /// plain inequality, a dummy for a required equality, or `e+` for a
    /// non-required equality/inequality.
    marker: Variable,
    /// `e+`/`e-` (or a single `e`) for a non-required constraint; empty
    /// for a required one.
    error_vars: Vec<Variable>,
}

/// Bookkeeping for one external variable currently under edit.
#[derive(Debug, Clone, Copy)]
struct EditInfo {
    constraint_id: u64,
    eplus: Variable,
    eminus: Variable,
    prior_suggested: f64,
}

/// The incremental Cassowary constraint solver.
pub struct SimplexSolver {
    registry: VariableRegistry,
    tableau: Tableau,
    objective: Variable,
    config: SolverConfig,
    trace: Option<PivotTrace>,
    installed: HashMap<u64, Installed>,
    external_vars: HashSet<Variable>,
    edit_vars: HashMap<Variable, EditInfo>,
    edit_depth: usize,
}

impl Default for SimplexSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimplexSolver {
    /// Create a solver with default configuration.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    /// Create a solver with a custom configuration.
    pub fn with_config(config: SolverConfig) -> Self {
        let mut registry = VariableRegistry::new();
        let objective = registry.new_objective("z");
        let mut tableau = Tableau::new();
        tableau.add_row(objective, Expression::from_constant(0.0));
        let trace = config.trace.then(PivotTrace::default);
        SimplexSolver {
            registry,
            tableau,
            objective,
            config,
            trace,
            installed: HashMap::new(),
            external_vars: HashSet::new(),
            edit_vars: HashMap::new(),
            edit_depth: 0,
        }
    }

    /// The solver's current configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The pivot trace, if tracing was enabled via `SolverConfig::with_trace`.
    pub fn trace(&self) -> Option<&PivotTrace> {
        self.trace.as_ref()
    }

    /// Allocate a new external variable, visible to the client via
    /// [`Self::value`].
    pub fn new_external(&mut self, name: impl Into<String>, value: f64) -> Variable {
        let v = self.registry.new_external(name, value);
        self.external_vars.insert(v);
        v
    }

    /// The current (last solved) value of an external variable.
    pub fn value(&self, v: Variable) -> f64 {
        self.registry.value(v)
    }

    // ---- add / remove constraint ---------------------------------------

    /// Install `constraint`, driving the tableau back to BFS and an
    /// optimal objective. Rolls back every tableau mutation if the
    /// constraint turns out to be an inconsistent required constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> CassowaryResult<()> {
        let snapshot = self.tableau.clone();
        let installed_snapshot = self.installed.clone();

        match self.add_constraint_inner(&constraint) {
            Ok(installed) => {
                self.installed.insert(constraint.id(), installed);
                Ok(())
            }
            Err(err) => {
                self.tableau = snapshot;
                self.installed = installed_snapshot;
                Err(err)
            }
        }
    }

    fn add_constraint_inner(&mut self, constraint: &Constraint) -> CassowaryResult<Installed> {
        let mut expr = self.substitute_basic_variables(constraint.expression().clone());
        let epsilon = self.config.epsilon;

        let mut error_vars = Vec::new();
        let marker = match (constraint.operator(), constraint.is_required()) {
            (RelationalOperator::Equal, true) => {
                let d = self.registry.new_dummy();
                expr.add_variable(d, 1.0, epsilon, None);
                d
            }
            (RelationalOperator::Equal, false) => {
                let (eplus, eminus) = self.registry.new_error_pair();
                self.add_error_to_objective(eplus, constraint.strength(), constraint.weight())?;
                self.add_error_to_objective(eminus, constraint.strength(), constraint.weight())?;
                expr.add_variable(eplus, 1.0, epsilon, None);
                expr.add_variable(eminus, -1.0, epsilon, None);
                error_vars.push(eplus);
                error_vars.push(eminus);
                eplus
            }
            (_, true) => {
                // expr >= 0, augmented as expr - s = 0 with s >= 0.
                let s = self.registry.new_slack();
                expr.add_variable(s, -1.0, epsilon, None);
                s
            }
            (_, false) => {
                // expr >= 0 only softly: expr - s + e = 0, e absorbing
                // any violation, penalised in the objective.
                let s = self.registry.new_slack();
                expr.add_variable(s, -1.0, epsilon, None);
                let e = self.registry.new_error();
                self.add_error_to_objective(e, constraint.strength(), constraint.weight())?;
                expr.add_variable(e, 1.0, epsilon, None);
                error_vars.push(e);
                s
            }
        };

        match self.choose_subject(&expr, marker) {
            Some(chosen) => {
                // `expr` is the body of the equation `expr = 0`; solving
                // it for `chosen` turns it into `chosen`'s actual row.
                expr.new_subject(chosen, epsilon)?;
                self.install_row(chosen, expr);
            }
            None => {
                self.run_artificial_phase(expr)?;
            }
        }

        self.solve()?;
        Ok(Installed { marker, error_vars })
    }

    /// Repeatedly replace any basic variable appearing in `expr` with its
    /// row, leaving only parametric variables.
    fn substitute_basic_variables(&self, mut expr: Expression) -> Expression {
        loop {
            let basic = expr.terms().find(|(v, _)| self.tableau.is_basic(*v));
            let Some((v, _)) = basic else { return expr };
            let row = self.tableau.row(v).expect("checked is_basic above").clone();
            expr.substitute_out(v, &row, self.config.epsilon, None);
        }
    }

    /// The standard "choose subject" procedure for a fresh equation
    /// `expr = 0`: prefer an unrestricted variable (always safe, no
    /// feasibility to check since it carries no non-negativity
    /// constraint); else `marker` itself — the slack/dummy/e+ this
    /// constraint just introduced, and only that variable, not any other
    /// pivotable term `expr` happens to contain — if it is pivotable with
    /// a negative coefficient (solving for it keeps the resulting row's
    /// constant sign compatible with its restriction); else, if every
    /// remaining term is a dummy, the dummy itself, but only when the
    /// equation's constant is already ~zero (otherwise no subject can
    /// make the row feasible and phase-1 is required).
    ///
    /// `expr` has already been through [`Self::substitute_basic_variables`],
    /// so besides `marker` it can contain restricted/pivotable variables
    /// belonging to other, already-installed rows (e.g. the error
    /// variables of an unrelated stay, dragged in by substitution).
    /// Choosing one of those as the new row's subject would make it basic
    /// here while it is still a stale non-basic term in its own row,
    /// corrupting the tableau's row/column invariants — so the second
    /// branch only ever considers `marker`.
    fn choose_subject(&self, expr: &Expression, marker: Variable) -> Option<Variable> {
        let epsilon = self.config.epsilon;
        if let Some((v, _)) = expr.terms().find(|(v, c)| !v.is_restricted() && c.abs() > epsilon) {
            return Some(v);
        }
        if marker.is_pivotable() && expr.coefficient_for(marker) < -epsilon {
            return Some(marker);
        }
        if expr.terms().all(|(v, _)| v.is_dummy()) && expr.constant().abs() <= epsilon {
            if let Some((v, _)) = expr.terms().find(|(_, c)| c.abs() > epsilon) {
                return Some(v);
            }
        }
        None
    }

    /// Install `subject = expr` as a new row, marking it infeasible right
    /// away if its constant already violates T3 (the caller's subsequent
    /// `solve` drives feasibility back via dual optimisation).
    fn install_row(&mut self, subject: Variable, expr: Expression) {
        self.tableau.add_row(subject, expr);
        self.tableau.recheck_feasibility(subject, self.config.epsilon);
    }

    /// Phase-1: introduce an artificial variable whose row is the
    /// augmented equation itself, minimise it via primal simplex under a
    /// temporary objective equal to that same expression (so the
    /// objective row and the artificial's row start identical and a
    /// shared pivot keeps them identical throughout), and either drive it
    /// out of the basis (constraint accepted) or raise `RequiredFailure`
    /// (constraint inconsistent with what's already installed).
    fn run_artificial_phase(&mut self, expr: Expression) -> CassowaryResult<()> {
        let epsilon = self.config.epsilon;
        let artificial = self.registry.new_slack();
        self.install_row(artificial, expr.clone());

        let saved_objective = self.tableau.remove_row(self.objective);
        self.tableau.add_row(self.objective, expr);

        if self.tableau.has_infeasible_rows() {
            dual_optimize(&mut self.tableau, self.objective, &self.config, self.trace.as_mut())?;
        }
        primal_optimize(&mut self.tableau, self.objective, &self.config, self.trace.as_mut())?;

        let minimum = self.tableau.row(self.objective).map(|r| r.constant()).unwrap_or(0.0);

        self.tableau.remove_row(self.objective);
        match saved_objective {
            Some(obj) => self.tableau.add_row(self.objective, obj),
            None => self.tableau.add_row(self.objective, Expression::from_constant(0.0)),
        }

        if minimum.abs() > epsilon {
            self.tableau.remove_row(artificial);
            return Err(CassowaryError::RequiredFailure);
        }

        if self.tableau.is_basic(artificial) {
            let row = self.tableau.row(artificial).expect("just checked is_basic").clone();
            self.tableau.remove_row(artificial);
            match row.any_pivotable_variable() {
                Ok(pivot_var) => {
                    let mut new_row = row;
                    new_row.new_subject(pivot_var, epsilon)?;
                    self.install_row(pivot_var, new_row);
                }
                Err(_) if row.is_constant() => {
                    // The row collapsed to a bare (near-zero) constant:
                    // nothing left to represent, safe to drop outright.
                }
                Err(err) => return Err(err),
            }
        }

        self.tableau.substitute_everywhere(artificial, &Expression::from_constant(0.0), epsilon);
        Ok(())
    }

    /// Fold `strength · weight` of `error_var` into the objective row.
    fn add_error_to_objective(&mut self, error_var: Variable, strength: Strength, weight: f64) -> CassowaryResult<()> {
        let coeff = strength.as_objective_weight(weight);
        self.tableau.add_term(self.objective, error_var, coeff, self.config.epsilon)
    }

    /// Zero out whatever contribution `error_var` currently makes to the
    /// objective row (its coefficient there reflects every pivot since it
    /// was introduced, not just the value it was added with).
    fn remove_error_from_objective(&mut self, error_var: Variable) -> CassowaryResult<()> {
        let current = self.tableau.row(self.objective).map(|r| r.coefficient_for(error_var)).unwrap_or(0.0);
        if current != 0.0 {
            self.tableau.add_term(self.objective, error_var, -current, self.config.epsilon)?;
        }
        Ok(())
    }

    /// Restore feasibility (if the last mutation left any row infeasible)
    /// and then re-optimise the objective, writing external values back.
    pub fn solve(&mut self) -> CassowaryResult<()> {
        if self.tableau.has_infeasible_rows() {
            dual_optimize(&mut self.tableau, self.objective, &self.config, self.trace.as_mut())?;
        }
        primal_optimize(&mut self.tableau, self.objective, &self.config, self.trace.as_mut())?;
        self.write_back_values();
        Ok(())
    }

    /// Install a WEAK `v == v.value()` stay constraint, keeping `v` near
    /// its current value when otherwise unconstrained.
    pub fn add_stay(&mut self, v: Variable) -> CassowaryResult<()> {
        self.add_stay_with(v, Strength::WEAK, 1.0)
    }

    /// Install a `v == v.value()` stay constraint at a caller-supplied
    /// strength and weight.
    pub fn add_stay_with(&mut self, v: Variable, strength: Strength, weight: f64) -> CassowaryResult<()> {
        let value = self.registry.value(v);
        let constraint = Constraint::new(v, RelationalOperator::Equal, value, strength, weight)?;
        self.add_constraint(constraint)
    }

    /// Remove a previously installed constraint, restoring BFS and
    /// optimality afterward.
    pub fn remove_constraint(&mut self, constraint: &Constraint) -> CassowaryResult<()> {
        let installed = self.installed.remove(&constraint.id()).ok_or(CassowaryError::ConstraintNotFound)?;
        self.uninstall(installed)
    }

    fn uninstall(&mut self, installed: Installed) -> CassowaryResult<()> {
        for &e in &installed.error_vars {
            self.remove_error_from_objective(e)?;
        }

        if !self.tableau.is_basic(installed.marker) {
            self.pivot_marker_into_basis(installed.marker)?;
        }
        self.tableau.remove_row(installed.marker);

        for &e in &installed.error_vars {
            self.tableau.substitute_everywhere(e, &Expression::from_constant(0.0), self.config.epsilon);
        }

        self.solve()
    }

    /// Pivot `marker` into the basis so its row can be dropped: prefer a
    /// restricted basic row where the ratio test is well-defined, falling
    /// back to any row mentioning `marker`.
    fn pivot_marker_into_basis(&mut self, marker: Variable) -> CassowaryResult<()> {
        let mut best: Option<(Variable, f64)> = None;
        let mut fallback: Option<Variable> = None;

        for (basic, row) in self.tableau.rows() {
            let coeff = row.coefficient_for(marker);
            if coeff == 0.0 {
                continue;
            }
            fallback.get_or_insert(basic);
            if basic.is_restricted() && coeff < 0.0 {
                let ratio = -row.constant() / coeff;
                best = crate::simplex::better_candidate(best, (basic, ratio));
            }
        }

        let leaving = best.map(|(v, _)| v).or(fallback);
        let Some(leaving) = leaving else {
            // marker appears in no row: it is already effectively zero
            // and can be dropped with no pivot.
            return Ok(());
        };

        let mut row = self.tableau.remove_row(leaving).expect("leaving came from tableau.rows()");
        row.change_subject(leaving, marker, self.config.epsilon)?;
        self.tableau.pivot(marker, leaving, row, self.config.epsilon);
        Ok(())
    }

    // ---- edit protocol --------------------------------------------------

    /// Install a STRONG `v == v.value()` edit constraint, preparing `v`
    /// for `suggest_value` calls within a `begin_edit`/`end_edit` bracket.
    pub fn add_edit_var(&mut self, v: Variable) -> CassowaryResult<()> {
        self.add_edit_var_with(v, Strength::STRONG, 1.0)
    }

    /// Install an edit constraint at a caller-supplied strength and
    /// weight (must not be [`Strength::REQUIRED`] — an edit variable has
    /// to be able to yield to `suggest_value`).
    pub fn add_edit_var_with(&mut self, v: Variable, strength: Strength, weight: f64) -> CassowaryResult<()> {
        let value = self.registry.value(v);
        let constraint = Constraint::new(v, RelationalOperator::Equal, value, strength, weight)?;
        let id = constraint.id();
        self.add_constraint(constraint)?;
        let installed = self.installed.get(&id).expect("just installed");
        if installed.error_vars.len() != 2 {
            return Err(CassowaryError::InternalError(
                "add_edit_var: edit constraint did not produce an error pair (strength must not be REQUIRED)".into(),
            ));
        }
        let eplus = installed.error_vars[0];
        let eminus = installed.error_vars[1];
        self.edit_vars.insert(v, EditInfo { constraint_id: id, eplus, eminus, prior_suggested: value });
        Ok(())
    }

    /// Enter a (possibly nested) edit session.
    pub fn begin_edit(&mut self) {
        self.edit_depth += 1;
    }

    /// Suggest a new value for an edit variable, applying the delta
    /// directly to its error-pair rows and flagging any row this makes
    /// infeasible for the next `resolve`.
    pub fn suggest_value(&mut self, v: Variable, value: f64) -> CassowaryResult<()> {
        if self.edit_depth == 0 {
            return Err(CassowaryError::NoActiveEdit);
        }
        let info = self
            .edit_vars
            .get_mut(&v)
            .ok_or_else(|| CassowaryError::InternalError(format!("{:?} has no active edit variable", v)))?;
        let delta = value - info.prior_suggested;
        info.prior_suggested = value;
        let (eplus, eminus) = (info.eplus, info.eminus);

        self.tableau.perturb(eplus, delta, self.config.epsilon);
        self.tableau.perturb(eminus, -delta, self.config.epsilon);
        Ok(())
    }

    /// Run dual optimisation to repair feasibility after one or more
    /// `suggest_value` calls, then write external values back. Does not
    /// re-run primal optimisation: a constant-only perturbation cannot
    /// disturb T4 once it already held.
    pub fn resolve(&mut self) -> CassowaryResult<()> {
        dual_optimize(&mut self.tableau, self.objective, &self.config, self.trace.as_mut())?;
        self.write_back_values();
        Ok(())
    }

    /// Leave an edit session. Once the outermost `end_edit` matching the
    /// first `begin_edit` returns, every edit constraint installed since
    /// is removed.
    pub fn end_edit(&mut self) -> CassowaryResult<()> {
        if self.edit_depth == 0 {
            return Err(CassowaryError::NoActiveEdit);
        }
        self.edit_depth -= 1;
        if self.edit_depth == 0 {
            let vars: Vec<Variable> = self.edit_vars.keys().copied().collect();
            for v in vars {
                if let Some(info) = self.edit_vars.remove(&v) {
                    if let Some(installed) = self.installed.remove(&info.constraint_id) {
                        self.uninstall(installed)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_back_values(&mut self) {
        let externals: Vec<Variable> = self.external_vars.iter().copied().collect();
        for x in externals {
            if let Some(row) = self.tableau.row(x) {
                self.registry.set_value(x, row.constant());
            } else {
                self.registry.set_value(x, 0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stay_keeps_unconstrained_variable_at_its_value() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 5.0);
        solver.add_stay(x).unwrap();
        assert!((solver.value(x) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn required_equality_overrides_stay() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 0.0);
        solver.add_stay(x).unwrap();
        let c = x.eq(10.0).unwrap();
        solver.add_constraint(c).unwrap();
        assert!((solver.value(x) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn inequality_clamps_variable() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 0.0);
        solver.add_stay(x).unwrap();
        solver.add_constraint(x.leq(10.0).unwrap()).unwrap();
        solver.add_constraint(x.geq(3.0).unwrap()).unwrap();
        assert!(solver.value(x) >= 3.0 - 1e-6);
        assert!(solver.value(x) <= 10.0 + 1e-6);
    }

    #[test]
    fn conflicting_required_constraints_fail_without_corrupting_state() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 0.0);
        solver.add_constraint(x.eq(1.0).unwrap()).unwrap();
        let result = solver.add_constraint(x.eq(2.0).unwrap());
        assert!(result.is_err());
        assert!((solver.value(x) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn removing_a_constraint_relaxes_the_variable() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 0.0);
        solver.add_stay(x).unwrap();
        let c = x.eq(10.0).unwrap();
        solver.add_constraint(c.clone()).unwrap();
        assert!((solver.value(x) - 10.0).abs() < 1e-6);

        solver.remove_constraint(&c).unwrap();
        solver.add_stay(x).unwrap();
        assert!((solver.value(x) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn edit_session_streams_suggested_values() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 0.0);
        solver.add_stay(x).unwrap();
        solver.add_edit_var(x).unwrap();
        solver.begin_edit();
        solver.suggest_value(x, 42.0).unwrap();
        solver.resolve().unwrap();
        assert!((solver.value(x) - 42.0).abs() < 1e-6);
        solver.end_edit().unwrap();
    }

    #[test]
    fn suggest_value_without_edit_session_is_an_error() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_external("x", 0.0);
        let result = solver.suggest_value(x, 1.0);
        assert!(matches!(result, Err(CassowaryError::NoActiveEdit)));
    }

    #[test]
    fn linear_relation_between_two_externals_is_maintained() {
        let mut solver = SimplexSolver::new();
        let left = solver.new_external("left", 0.0);
        let width = solver.new_external("width", 0.0);
        let right = solver.new_external("right", 0.0);
        solver.add_stay(left).unwrap();
        solver.add_stay(width).unwrap();
        solver.add_constraint(width.eq_with(50.0, Strength::STRONG, 1.0).unwrap()).unwrap();
        solver
            .add_constraint(Expression::from_single_variable(right).eq(left + width).unwrap())
            .unwrap();
        assert!((solver.value(width) - 50.0).abs() < 1e-6);
        assert!((solver.value(right) - (solver.value(left) + 50.0)).abs() < 1e-6);
    }
}
