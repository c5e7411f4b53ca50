//! Simplex kernel (component F)
//!
//! The objective row is an ordinary [`crate::expression::Expression`]
//! stored in the [`Tableau`] under the distinguished objective
//! [`Variable`] — it is pivoted exactly like any other row, which is what
//! lets phase-1 (driving artificial variables out) and phase-2 (the real
//! objective) share one primal loop, and what lets dual optimisation's
//! pivots update the objective row for free via [`Tableau::pivot`]'s
//! normal substitution pass.

pub mod dual;
pub mod primal;

use crate::config::SolverConfig;
use crate::error::{CassowaryError, CassowaryResult};
use crate::tableau::Tableau;
use crate::trace::{Phase, PivotEvent, PivotTrace};
use crate::variable::Variable;

pub use dual::optimize as dual_optimize;
pub use primal::optimize as primal_optimize;

/// Counts loop iterations against `SolverConfig::max_iterations`,
/// shared by the primal and dual loops so both are bound by the same
/// ceiling semantics.
pub(crate) struct IterationBudget {
    limit: Option<usize>,
    spent: usize,
}

impl IterationBudget {
    pub(crate) fn new(config: &SolverConfig) -> Self {
        IterationBudget { limit: config.max_iterations, spent: 0 }
    }

    /// Charge one iteration; errors once the configured ceiling is
    /// exceeded.
    pub(crate) fn tick(&mut self) -> CassowaryResult<()> {
        self.spent += 1;
        if let Some(limit) = self.limit {
            if self.spent > limit {
                return Err(CassowaryError::IterationLimit { limit });
            }
        }
        Ok(())
    }
}

/// Exchange `leaving` out of the basis for `entering`, updating every row
/// (including the objective row, if it mentions `entering`) via
/// [`Tableau::pivot`]. Shared by the primal and dual loops.
pub(crate) fn perform_pivot(
    tableau: &mut Tableau,
    entering: Variable,
    leaving: Variable,
    epsilon: f64,
    phase: Phase,
    trace: Option<&mut PivotTrace>,
) -> CassowaryResult<()> {
    let mut entering_row = tableau.remove_row(leaving).ok_or_else(|| {
        CassowaryError::InternalError(format!("perform_pivot: {:?} is not a basic variable", leaving))
    })?;
    entering_row.change_subject(leaving, entering, epsilon)?;
    let row_count = tableau.row_count() + 1;
    tableau.pivot(entering, leaving, entering_row, epsilon);
    if let Some(trace) = trace {
        trace.record(PivotEvent { entering, leaving, row_count, phase });
    }
    Ok(())
}

/// Deterministic tie-break for "most negative" / "minimal ratio" scans:
/// prefer the variable with the smaller allocation index, so repeated
/// solves of the same constraint set always pick the same pivot.
pub(crate) fn better_candidate(best: Option<(Variable, f64)>, candidate: (Variable, f64)) -> Option<(Variable, f64)> {
    match best {
        None => Some(candidate),
        Some((best_var, best_val)) => {
            if candidate.1 < best_val || (candidate.1 == best_val && candidate.0.index() < best_var.index()) {
                Some(candidate)
            } else {
                Some((best_var, best_val))
            }
        }
    }
}
