//! Linear expressions (component B)
//!
//! An [`Expression`] is a constant plus a finite sum of variable terms,
//! `c + Σ aᵢ·vᵢ`, with no zero coefficients (invariant E1). It is the one
//! representation shared by constraint bodies, tableau rows, and the
//! objective row itself — `substitute_out` is the elementary pivot
//! operation the whole kernel is built on.

use std::collections::HashMap;

use crate::error::{CassowaryError, CassowaryResult};
use crate::tableau::Tableau;
use crate::variable::Variable;

/// A linear form `constant + Σ terms[v] · v` over [`Variable`]s.
///
/// Terms with a coefficient whose absolute value is at most the caller's
/// `epsilon` are never stored — every mutator enforces this eagerly so
/// that `terms` never needs to be swept separately.
#[derive(Debug, Clone, Default)]
pub struct Expression {
    pub(crate) constant: f64,
    pub(crate) terms: HashMap<Variable, f64>,
}

impl Expression {
    /// The constant expression `c`.
    pub fn from_constant(constant: f64) -> Self {
        Expression { constant, terms: HashMap::new() }
    }

    /// The expression `constant + coefficient · variable`.
    pub fn from_variable(variable: Variable, coefficient: f64, constant: f64) -> Self {
        let mut terms = HashMap::new();
        if coefficient != 0.0 {
            terms.insert(variable, coefficient);
        }
        Expression { constant, terms }
    }

    /// Shorthand for `from_variable(variable, 1.0, 0.0)`.
    pub fn from_single_variable(variable: Variable) -> Self {
        Self::from_variable(variable, 1.0, 0.0)
    }

    /// The expression's constant term.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// `true` if the expression carries no variable terms at all.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// The coefficient stored for `v`, or `0.0` if `v` does not appear.
    pub fn coefficient_for(&self, v: Variable) -> f64 {
        *self.terms.get(&v).unwrap_or(&0.0)
    }

    /// Iterate over `(variable, coefficient)` pairs. Order is not
    /// semantically significant.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    /// Number of non-zero terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// `true` if the expression has no terms and a zero constant.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Scale the whole expression (constant and every coefficient) by `k`,
    /// dropping any term that becomes `epsilon`-zero.
    pub fn multiply(&mut self, k: f64, epsilon: f64) {
        self.constant *= k;
        self.terms.retain(|_, c| {
            *c *= k;
            c.abs() > epsilon
        });
    }

    /// Add `c` to the coefficient of `v`, inserting or removing the term
    /// as needed to maintain invariant E1.
    ///
    /// When `row` is given, the tableau's reverse index is kept in
    /// lock-step: `row.subject` identifies the row whose body this
    /// expression is, so the tableau can record or forget that `subject`
    /// mentions `v`.
    pub fn add_variable(&mut self, v: Variable, c: f64, epsilon: f64, row: Option<RowContext<'_>>) {
        match self.terms.get(&v).copied() {
            Some(existing) => {
                let updated = existing + c;
                if updated.abs() <= epsilon {
                    self.terms.remove(&v);
                    if let Some(ctx) = row {
                        ctx.tableau.note_removed_variable(v, ctx.subject);
                    }
                } else {
                    self.terms.insert(v, updated);
                }
            }
            None => {
                if c.abs() > epsilon {
                    self.terms.insert(v, c);
                    if let Some(ctx) = row {
                        ctx.tableau.note_added_variable(v, ctx.subject);
                    }
                }
            }
        }
    }

    /// Fold `n · other` into `self`: `self.constant += n · other.constant`
    /// and `add_variable` for every term of `other`.
    pub fn add_expression(
        &mut self,
        other: &Expression,
        n: f64,
        epsilon: f64,
        mut row: Option<RowContext<'_>>,
    ) {
        self.constant += n * other.constant;
        for (v, coeff) in other.terms.iter() {
            let ctx = row.as_mut().map(|r| RowContext { subject: r.subject, tableau: &mut *r.tableau });
            self.add_variable(*v, coeff * n, epsilon, ctx);
        }
    }

    /// The elementary pivot operation: replace every occurrence of
    /// `out_var` in `self` with `expr`, given that `self.terms[out_var]`
    /// was `m`. Concretely: remove `out_var`; for each `(w, c)` in
    /// `expr.terms`, merge `m · c` into `self.terms[w]`; add `m ·
    /// expr.constant` to `self.constant`.
    ///
    /// `row` is `None` when substituting into an expression that is not
    /// (yet) installed as a tableau row — e.g. while normalising a fresh
    /// constraint's body before it has a subject at all.
    ///
    /// # Panics
    ///
    /// Panics if `out_var` is not a term of `self` — callers only
    /// substitute out a variable they have already confirmed is present
    /// (typically via `coefficient_for`).
    pub fn substitute_out(&mut self, out_var: Variable, expr: &Expression, epsilon: f64, mut row: Option<RowContext<'_>>) {
        let multiplier = self
            .terms
            .remove(&out_var)
            .expect("substitute_out: out_var must be a term of the expression");
        self.constant += multiplier * expr.constant;

        for (w, coeff) in expr.terms.iter() {
            let ctx = row.as_mut().map(|r| RowContext { subject: r.subject, tableau: &mut *r.tableau });
            self.add_variable(*w, multiplier * coeff, epsilon, ctx);
        }
    }

    /// Pivot `self` (currently `subject = self`, i.e. `subject ∉
    /// self.terms`) so that `v` becomes the subject instead: remove `v`
    /// (whose coefficient was `a`), multiply the rest of the expression by
    /// `-1/a`, and return the reciprocal `1/a` at which the former subject
    /// must be reinserted by the caller (see [`Self::change_subject`]).
    pub fn new_subject(&mut self, v: Variable, epsilon: f64) -> CassowaryResult<f64> {
        let a = self
            .terms
            .remove(&v)
            .ok_or_else(|| CassowaryError::InternalError(format!("new_subject: {:?} is not a term", v)))?;
        if a.abs() <= epsilon {
            return Err(CassowaryError::ZeroDivision);
        }
        let reciprocal = 1.0 / a;
        self.multiply(-reciprocal, epsilon);
        Ok(reciprocal)
    }

    /// Rearrange the implicit equation `old_subject = self` (where
    /// `old_subject ∉ self.terms` and `new_subject ∈ self.terms`) into
    /// `new_subject = self'`, by pivoting on `new_subject` and reinserting
    /// `old_subject` at the resulting reciprocal coefficient.
    pub fn change_subject(&mut self, old_subject: Variable, new_subject: Variable, epsilon: f64) -> CassowaryResult<()> {
        let reciprocal = self.new_subject(new_subject, epsilon)?;
        self.terms.insert(old_subject, reciprocal);
        Ok(())
    }

    /// The pivotable term with the lowest [`Variable::index`], or an
    /// error if the expression carries no pivotable term. Deterministic
    /// like every other kernel selection (see
    /// [`crate::simplex::better_candidate`]) rather than whatever order
    /// the backing `HashMap` happens to iterate in.
    pub fn any_pivotable_variable(&self) -> CassowaryResult<Variable> {
        self.terms
            .keys()
            .filter(|v| v.is_pivotable())
            .copied()
            .fold(None, |best, v| crate::simplex::better_candidate(best, (v, 0.0)))
            .map(|(v, _)| v)
            .ok_or_else(|| CassowaryError::InternalError("any_pivotable_variable called on a constant expression".into()))
    }

    /// `true` if `self` and `other` have the same constant and the same
    /// terms (within `epsilon`). Used by tests exercising the expression
    /// algebra laws rather than by the kernel itself.
    pub fn approx_eq(&self, other: &Expression, epsilon: f64) -> bool {
        if (self.constant - other.constant).abs() > epsilon {
            return false;
        }
        if self.terms.len() != other.terms.len() {
            return false;
        }
        self.terms
            .iter()
            .all(|(v, c)| (other.coefficient_for(*v) - c).abs() <= epsilon)
    }
}

impl From<f64> for Expression {
    fn from(c: f64) -> Self {
        Expression::from_constant(c)
    }
}

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Expression::from_single_variable(v)
    }
}

/// Identifies the row an [`Expression`] mutation is happening within, so
/// the owning [`Tableau`] can keep its reverse index (`columns`) in
/// lock-step with the mutation. `subject` is the row's basic variable
/// (the key under which this expression lives in `tableau.rows`).
///
/// This is the Rust realization of the "optional subject and solver
/// callback" the literature describes: a single `Option<RowContext>`
/// parameter rather than a second `_observed` entry point, since Rust's
/// `Option` already gives us the no-op-by-absence default for free.
pub struct RowContext<'a> {
    pub subject: Variable,
    pub tableau: &'a mut Tableau,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableRegistry;

    const EPS: f64 = 1e-8;

    #[test]
    fn constant_expression() {
        let e = Expression::from_constant(10.0);
        assert!(e.is_constant());
        assert_eq!(e.constant(), 10.0);
    }

    #[test]
    fn multiply_drops_zero_terms() {
        let mut reg = VariableRegistry::new();
        let x = reg.new_external("x", 0.0);
        let mut e = Expression::from_variable(x, 2.0, 3.0);
        e.multiply(0.0, EPS);
        assert!(e.is_constant());
        assert_eq!(e.constant(), 0.0);
    }

    #[test]
    fn add_variable_merges_and_cancels() {
        let mut reg = VariableRegistry::new();
        let x = reg.new_external("x", 0.0);
        let mut e = Expression::from_variable(x, 1.0, 0.0);
        e.add_variable(x, 1.0, EPS, None);
        assert_eq!(e.coefficient_for(x), 2.0);
        e.add_variable(x, -2.0, EPS, None);
        assert_eq!(e.coefficient_for(x), 0.0);
        assert!(e.is_constant());
    }

    #[test]
    fn add_expression_folds_constant_and_terms() {
        let mut reg = VariableRegistry::new();
        let x = reg.new_external("x", 0.0);
        let y = reg.new_external("y", 0.0);
        let mut e = Expression::from_variable(x, 1.0, 5.0);
        let other = Expression::from_variable(y, 2.0, 1.0);
        e.add_expression(&other, 3.0, EPS, None);
        assert_eq!(e.constant(), 5.0 + 3.0 * 1.0);
        assert_eq!(e.coefficient_for(y), 6.0);
    }

    #[test]
    fn new_subject_pivots_correctly() {
        // e = 4 + 2x  =>  pivot on x: x = -2 - 0.5 * (old subject coefficient slot)
        let mut reg = VariableRegistry::new();
        let x = reg.new_external("x", 0.0);
        let mut e = Expression::from_variable(x, 2.0, 4.0);
        let reciprocal = e.new_subject(x, EPS).unwrap();
        assert_eq!(reciprocal, 0.5);
        assert_eq!(e.constant(), -2.0);
        assert!(!e.terms.contains_key(&x));
    }

    #[test]
    fn any_pivotable_variable_errors_on_constant() {
        let e = Expression::from_constant(1.0);
        assert!(e.any_pivotable_variable().is_err());
    }

    #[test]
    fn algebra_laws() {
        let mut reg = VariableRegistry::new();
        let a_var = reg.new_external("a", 0.0);
        let b_var = reg.new_external("b", 0.0);

        // (a + b) - b == a
        let a = Expression::from_single_variable(a_var);
        let b = Expression::from_single_variable(b_var);
        let mut sum = a.clone();
        sum.add_expression(&b, 1.0, EPS, None);
        sum.add_expression(&b, -1.0, EPS, None);
        assert!(sum.approx_eq(&a, EPS));

        // a - a is the zero expression
        let mut diff = a.clone();
        diff.add_expression(&a, -1.0, EPS, None);
        assert!(diff.is_empty());

        // 0 * a is the zero expression (term dropped)
        let mut zeroed = a.clone();
        zeroed.multiply(0.0, EPS);
        assert!(zeroed.is_empty());
    }
}
