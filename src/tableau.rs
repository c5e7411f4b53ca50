//! The sparse simplex tableau (component E)
//!
//! A `Tableau` is a bipartite index over [`Expression`] rows: `rows` maps a
//! basic variable to the expression defining it, and `columns` is the
//! reverse index — for each non-basic variable, the set of rows that
//! mention it. Keeping both directions lets a pivot update exactly the
//! rows that need it instead of scanning the whole tableau (invariant
//! T2/T4).

use std::collections::{HashMap, HashSet};

use crate::error::{CassowaryError, CassowaryResult};
use crate::expression::{Expression, RowContext};
use crate::variable::Variable;

/// The sparse row/column index the simplex kernel pivots over.
#[derive(Debug, Clone, Default)]
pub struct Tableau {
    /// `basic variable -> expression defining it` (`basic = expr`).
    rows: HashMap<Variable, Expression>,
    /// `non-basic variable -> set of basic variables whose row mentions it`.
    columns: HashMap<Variable, HashSet<Variable>>,
    /// Restricted basic variables whose row constant is currently negative
    /// (invariant T3's transient exception). Dual optimisation drains this.
    infeasible_rows: HashSet<Variable>,
}

impl Tableau {
    /// An empty tableau.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `v` is currently a basic variable (has a row).
    pub fn is_basic(&self, v: Variable) -> bool {
        self.rows.contains_key(&v)
    }

    /// The row for `v`, if `v` is basic.
    pub fn row(&self, v: Variable) -> Option<&Expression> {
        self.rows.get(&v)
    }

    /// Number of rows currently in the tableau.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Every basic variable and its defining row, e.g. for an objective
    /// scan. Order is not semantically significant.
    pub fn rows(&self) -> impl Iterator<Item = (Variable, &Expression)> {
        self.rows.iter().map(|(&v, e)| (v, e))
    }

    /// The set of basic variables whose row currently mentions `v`
    /// (`v` itself must be non-basic — a basic variable is never a term
    /// of its own row, invariant E1).
    pub fn column(&self, v: Variable) -> impl Iterator<Item = Variable> + '_ {
        self.columns.get(&v).into_iter().flatten().copied()
    }

    /// Insert a new row `subject = expr`, registering every term of
    /// `expr` in the reverse column index.
    ///
    /// # Panics
    ///
    /// Panics if `subject` is already basic — callers must `remove_row`
    /// (or never have inserted it) first.
    pub fn add_row(&mut self, subject: Variable, expr: Expression) {
        assert!(!self.rows.contains_key(&subject), "add_row: {:?} is already basic", subject);
        for (v, _) in expr.terms() {
            self.columns.entry(v).or_default().insert(subject);
        }
        self.rows.insert(subject, expr);
    }

    /// Remove and return the row for `subject`, deregistering its terms
    /// from the reverse column index.
    pub fn remove_row(&mut self, subject: Variable) -> Option<Expression> {
        let expr = self.rows.remove(&subject)?;
        for (v, _) in expr.terms() {
            if let Some(set) = self.columns.get_mut(&v) {
                set.remove(&subject);
                if set.is_empty() {
                    self.columns.remove(&v);
                }
            }
        }
        self.infeasible_rows.remove(&subject);
        Some(expr)
    }

    /// Record that the row for `subject` has gained a term in `v`
    /// (called back into from [`Expression::add_variable`] via
    /// [`RowContext`]).
    pub(crate) fn note_added_variable(&mut self, v: Variable, subject: Variable) {
        self.columns.entry(v).or_default().insert(subject);
    }

    /// Record that the row for `subject` has lost its term in `v`.
    pub(crate) fn note_removed_variable(&mut self, v: Variable, subject: Variable) {
        if let Some(set) = self.columns.get_mut(&v) {
            set.remove(&subject);
            if set.is_empty() {
                self.columns.remove(&v);
            }
        }
    }

    /// Pivot: make `entering` basic in place of `leaving`, given that
    /// `leaving`'s row is `entering_row` (already solved for `entering`,
    /// i.e. `entering_row` came from `Expression::new_subject` on the old
    /// `leaving = ...` row).
    ///
    /// Every other row mentioning `entering` has `entering` substituted
    /// out in favor of `entering_row`.
    pub fn pivot(&mut self, entering: Variable, leaving: Variable, entering_row: Expression, epsilon: f64) {
        let affected: Vec<Variable> = self.column(entering).collect();
        self.add_row(entering, entering_row.clone());

        for subject in affected {
            if subject == entering {
                continue;
            }
            let Some(mut row) = self.rows.remove(&subject) else { continue };
            for (v, _) in row.terms().collect::<Vec<_>>() {
                if let Some(set) = self.columns.get_mut(&v) {
                    set.remove(&subject);
                }
            }
            let coeff = row.coefficient_for(entering);
            if coeff != 0.0 {
                row.substitute_out(entering, &entering_row, epsilon, Some(RowContext { subject, tableau: self }));
            }
            self.rows.insert(subject, row.clone());
            for (v, _) in row.terms() {
                self.columns.entry(v).or_default().insert(subject);
            }
            self.recheck_feasibility(subject, epsilon);
        }

        self.recheck_feasibility(entering, epsilon);
        let _ = leaving;
    }

    /// Substitute `out_var` out of every row that currently mentions it,
    /// replacing it with `expr` (used when an external variable's row is
    /// removed from the basis, or when a dummy is driven to zero and its
    /// row dropped). Does not touch `out_var`'s own row, if any.
    pub fn substitute_everywhere(&mut self, out_var: Variable, expr: &Expression, epsilon: f64) {
        let affected: Vec<Variable> = self.column(out_var).collect();
        for subject in affected {
            let Some(mut row) = self.rows.remove(&subject) else { continue };
            for (v, _) in row.terms().collect::<Vec<_>>() {
                if let Some(set) = self.columns.get_mut(&v) {
                    set.remove(&subject);
                }
            }
            row.substitute_out(out_var, expr, epsilon, Some(RowContext { subject, tableau: self }));
            for (v, _) in row.terms() {
                self.columns.entry(v).or_default().insert(subject);
            }
            self.rows.insert(subject, row);
            self.recheck_feasibility(subject, epsilon);
        }
    }

    /// Look up the row context needed to mutate `subject`'s own row while
    /// keeping `self`'s reverse index correct. Exists so call sites doing
    /// `tableau.row_mut(subject)` read naturally instead of constructing
    /// `RowContext` by hand.
    pub fn row_context(&mut self, subject: Variable) -> RowContext<'_> {
        RowContext { subject, tableau: self }
    }

    /// Add `coefficient · v` into `subject`'s existing row, keeping the
    /// reverse column index in sync with whatever term ends up inserted,
    /// updated, or dropped. Removes and reinserts the row rather than
    /// mutating it in place, the same way [`Self::pivot`] refreshes an
    /// affected row, so a brand-new term for `v` still gets registered in
    /// `columns`.
    pub fn add_term(&mut self, subject: Variable, v: Variable, coefficient: f64, epsilon: f64) -> CassowaryResult<()> {
        let mut row = self
            .remove_row(subject)
            .ok_or_else(|| CassowaryError::InternalError(format!("add_term: {:?} is not a basic variable", subject)))?;
        row.add_variable(v, coefficient, epsilon, None);
        self.add_row(subject, row);
        self.recheck_feasibility(subject, epsilon);
        Ok(())
    }

    /// Fetch a mutable row with an error if `subject` is not basic —
    /// the common failure mode for a caller that assumed a variable was
    /// in the basis when it was not (e.g. after an unexpected pivot).
    pub fn row_mut_checked(&mut self, subject: Variable) -> CassowaryResult<&mut Expression> {
        self.rows
            .get_mut(&subject)
            .ok_or_else(|| CassowaryError::InternalError(format!("{:?} is not a basic variable", subject)))
    }

    /// Check `subject`'s row constant against T3 and record or clear its
    /// membership in `infeasible_rows` accordingly. A no-op for
    /// unrestricted variables (T3 only constrains restricted basics).
    pub fn recheck_feasibility(&mut self, subject: Variable, epsilon: f64) {
        if !subject.is_restricted() {
            return;
        }
        match self.rows.get(&subject) {
            Some(row) if row.constant() < -epsilon => {
                self.infeasible_rows.insert(subject);
            }
            _ => {
                self.infeasible_rows.remove(&subject);
            }
        }
    }

    /// `true` if any row is currently marked infeasible.
    pub fn has_infeasible_rows(&self) -> bool {
        !self.infeasible_rows.is_empty()
    }

    /// Remove and return one infeasible row's basic variable, if any.
    pub fn take_infeasible_row(&mut self) -> Option<Variable> {
        let v = *self.infeasible_rows.iter().next()?;
        self.infeasible_rows.remove(&v);
        Some(v)
    }

    /// Directly mark `subject` infeasible. Used right after installing a
    /// row whose constant is already known to be negative.
    pub fn mark_infeasible(&mut self, subject: Variable) {
        self.infeasible_rows.insert(subject);
    }

    /// Stop tracking `subject` as infeasible, e.g. once its row is removed.
    pub fn clear_infeasible(&mut self, subject: Variable) {
        self.infeasible_rows.remove(&subject);
    }

    /// Apply a suggested-value delta to `v`: if `v` is basic, its own row
    /// constant shifts by `delta`; otherwise (`v` is held at the implicit
    /// value 0 like every non-basic variable) every row mentioning `v`
    /// shifts by `coefficient_for(v) * delta`, since that is exactly how
    /// much each dependent basic variable would move if `v`'s value
    /// really had increased by `delta`. Either way, feasibility of every
    /// touched row is rechecked.
    pub fn perturb(&mut self, v: Variable, delta: f64, epsilon: f64) {
        if self.rows.contains_key(&v) {
            if let Some(row) = self.rows.get_mut(&v) {
                row.constant += delta;
            }
            self.recheck_feasibility(v, epsilon);
            return;
        }

        let affected: Vec<Variable> = self.column(v).collect();
        for basic in affected {
            let coeff = self.rows.get(&basic).map(|r| r.coefficient_for(v)).unwrap_or(0.0);
            if coeff != 0.0 {
                if let Some(row) = self.rows.get_mut(&basic) {
                    row.constant += coeff * delta;
                }
                self.recheck_feasibility(basic, epsilon);
            }
        }
    }
}
