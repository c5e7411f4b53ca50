//! Dual optimisation: post-edit infeasibility repair.
//!
//! After `suggest_value` or constraint removal perturbs row constants, some
//! restricted basic variables may have gone negative (tracked in
//! [`Tableau`]'s `infeasible_rows`). This loop restores feasibility one row
//! at a time while preserving the optimality primal simplex already
//! established — it only pivots a negative row's own terms, never touches
//! T4 elsewhere.

use crate::config::SolverConfig;
use crate::error::{CassowaryError, CassowaryResult};
use crate::tableau::Tableau;
use crate::trace::{Phase, PivotTrace};
use crate::variable::Variable;

use super::{better_candidate, perform_pivot, IterationBudget};

/// Drain `tableau`'s infeasible rows one at a time until none remain, or
/// the configured iteration ceiling is exceeded.
pub fn optimize(
    tableau: &mut Tableau,
    objective: Variable,
    config: &SolverConfig,
    mut trace: Option<&mut PivotTrace>,
) -> CassowaryResult<()> {
    let mut budget = IterationBudget::new(config);

    while let Some(basic) = tableau.take_infeasible_row() {
        if !tableau.is_basic(basic) {
            continue;
        }
        let Some(row) = tableau.row(basic) else { continue };
        if row.constant() >= -config.epsilon {
            continue;
        }

        budget.tick()?;

        let Some(entering) = entering_by_min_ratio(tableau, objective, basic) else {
            return Err(CassowaryError::InternalError(
                "dual optimisation: no pivotable variable to restore feasibility (primal infeasible)".into(),
            ));
        };

        perform_pivot(tableau, entering, basic, config.epsilon, Phase::Dual, trace.as_deref_mut())?;
    }

    Ok(())
}

/// Among the infeasible row's terms with a positive coefficient on a
/// pivotable variable, the one minimising
/// `objective.coefficient_for(v) / row.coefficient_for(v)`.
fn entering_by_min_ratio(tableau: &Tableau, objective: Variable, basic: Variable) -> Option<Variable> {
    let row = tableau.row(basic)?;
    let obj_row = tableau.row(objective)?;
    let mut best: Option<(Variable, f64)> = None;
    for (v, c) in row.terms() {
        if v.is_pivotable() && c > 0.0 {
            let ratio = obj_row.coefficient_for(v) / c;
            best = better_candidate(best, (v, ratio));
        }
    }
    best.map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::variable::VariableRegistry;

    #[test]
    fn restores_feasibility_by_pivoting_on_min_ratio() {
        let mut reg = VariableRegistry::new();
        let z = reg.new_objective("z");
        let b = reg.new_slack();
        let v = reg.new_slack();

        let mut tableau = Tableau::new();
        // b = -2 + 3v  (infeasible: constant < 0, b restricted)
        tableau.add_row(b, Expression::from_variable(v, 3.0, -2.0));
        // objective row mentions v so the ratio test has something to compare.
        tableau.add_row(z, Expression::from_variable(v, 1.0, 0.0));
        tableau.mark_infeasible(b);

        let config = SolverConfig::default();
        optimize(&mut tableau, z, &config, None).unwrap();

        assert!(!tableau.has_infeasible_rows());
    }

    #[test]
    fn no_entering_candidate_is_internal_error() {
        let mut reg = VariableRegistry::new();
        let z = reg.new_objective("z");
        let b = reg.new_slack();
        let d = reg.new_dummy();

        let mut tableau = Tableau::new();
        // b's row mentions only a non-pivotable dummy with negative coefficient.
        tableau.add_row(b, Expression::from_variable(d, -1.0, -5.0));
        tableau.add_row(z, Expression::from_constant(0.0));
        tableau.mark_infeasible(b);

        let config = SolverConfig::default();
        let result = optimize(&mut tableau, z, &config, None);
        assert!(result.is_err());
    }
}
