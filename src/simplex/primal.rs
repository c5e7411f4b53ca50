//! Primal optimisation: drive every pivotable non-basic variable's
//! objective coefficient to non-negative (invariant T4).
//!
//! Used both for phase-1 (minimising a freshly introduced artificial
//! variable down to zero) and phase-2 (optimising the real weighted-error
//! objective) — the two phases differ only in what the objective row
//! currently contains, not in this loop's logic.

use crate::config::SolverConfig;
use crate::error::{CassowaryError, CassowaryResult};
use crate::tableau::Tableau;
use crate::trace::{Phase, PivotTrace};
use crate::variable::Variable;

use super::{better_candidate, perform_pivot, IterationBudget};

/// Run primal simplex on `tableau` until every pivotable non-basic
/// variable has a non-negative coefficient in the row for `objective`, or
/// the configured iteration ceiling is exceeded.
pub fn optimize(
    tableau: &mut Tableau,
    objective: Variable,
    config: &SolverConfig,
    mut trace: Option<&mut PivotTrace>,
) -> CassowaryResult<()> {
    let mut budget = IterationBudget::new(config);

    loop {
        let Some(entering) = most_negative_pivotable(tableau, objective, config.epsilon) else {
            return Ok(());
        };

        budget.tick()?;

        let Some(leaving) = ratio_test(tableau, entering) else {
            return Err(CassowaryError::InternalError(
                "primal optimisation: objective is unbounded below".into(),
            ));
        };

        perform_pivot(tableau, entering, leaving, config.epsilon, Phase::Primal, trace.as_deref_mut())?;
    }
}

/// The pivotable non-basic variable with the most negative coefficient in
/// the objective row, if any remain (i.e. T4 is violated).
fn most_negative_pivotable(tableau: &Tableau, objective: Variable, epsilon: f64) -> Option<Variable> {
    let row = tableau.row(objective)?;
    let mut best: Option<(Variable, f64)> = None;
    for (v, c) in row.terms() {
        if v.is_pivotable() && c < -epsilon {
            best = better_candidate(best, (v, c));
        }
    }
    best.map(|(v, _)| v)
}

/// Among restricted basic rows whose coefficient for `entering` is
/// negative, the row minimising `-constant / coefficient` — the maximal
/// amount `entering` can increase before that row's restricted basic
/// variable would go negative.
fn ratio_test(tableau: &Tableau, entering: Variable) -> Option<Variable> {
    let mut best: Option<(Variable, f64)> = None;
    for (basic, row) in tableau.rows() {
        if !basic.is_restricted() {
            continue;
        }
        let coeff = row.coefficient_for(entering);
        if coeff < 0.0 {
            let ratio = -row.constant() / coeff;
            best = better_candidate(best, (basic, ratio));
        }
    }
    best.map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::expression::Expression;
    use crate::variable::VariableRegistry;

    #[test]
    fn optimizes_simple_objective_to_zero_negative_coefficients() {
        let mut reg = VariableRegistry::new();
        let z = reg.new_objective("z");
        let s1 = reg.new_slack();
        let s2 = reg.new_slack();

        let mut tableau = Tableau::new();
        // Row: s1 = 10 - s2  (s2 non-basic, parametric)
        tableau.add_row(s1, Expression::from_variable(s2, -1.0, 10.0));
        // Objective: z = -3*s2  (minimising pulls s2 up until s1 hits 0)
        tableau.add_row(z, Expression::from_variable(s2, -3.0, 0.0));

        let config = SolverConfig::default();
        optimize(&mut tableau, z, &config, None).unwrap();

        let obj_row = tableau.row(z).unwrap();
        assert!(obj_row.coefficient_for(s1) >= -config.epsilon);
        assert!(obj_row.coefficient_for(s2) >= -config.epsilon);
    }

    #[test]
    fn unbounded_objective_is_an_internal_error() {
        let mut reg = VariableRegistry::new();
        let z = reg.new_objective("z");
        let s = reg.new_slack();
        let mut tableau = Tableau::new();
        // Objective keeps decreasing as s grows, and no row bounds it.
        tableau.add_row(z, Expression::from_variable(s, -1.0, 0.0));

        let config = SolverConfig::default();
        let result = optimize(&mut tableau, z, &config, None);
        assert!(result.is_err());
    }

    #[test]
    fn iteration_limit_is_respected() {
        let mut reg = VariableRegistry::new();
        let z = reg.new_objective("z");
        let s1 = reg.new_slack();
        let s2 = reg.new_slack();
        let mut tableau = Tableau::new();
        tableau.add_row(s1, Expression::from_variable(s2, -1.0, 10.0));
        tableau.add_row(z, Expression::from_variable(s2, -3.0, 0.0));

        let config = SolverConfig::default().with_max_iterations(0);
        let result = optimize(&mut tableau, z, &config, None);
        assert!(matches!(result, Err(CassowaryError::IterationLimit { limit: 0 })));
    }
}
