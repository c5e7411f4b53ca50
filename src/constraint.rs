//! Constraint records (component D)
//!
//! A [`Constraint`] is an immutable record normalised to the canonical
//! form `E ⋈ 0`. Construction goes through a single routine driven by a
//! tagged [`Operand`] and a match on `(lhs kind, operator, rhs kind)`,
//! rather than the runtime type-switching the constraint literature uses
//! — the table in this module's doc comment is the full truth table.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CassowaryError, CassowaryResult};
use crate::expression::Expression;
use crate::strength::Strength;
use crate::variable::Variable;

/// Source of globally unique constraint identity. `Constraint` records are
/// plain data with no solver back-reference, so identity (needed by
/// `remove_constraint`, matching the original library's object-identity
/// semantics) is a monotonic id stamped at construction and carried
/// through `Clone`.
static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(0);

/// The relation a [`Constraint`]'s expression is normalised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

/// A tagged operand accepted by constraint construction: either side of a
/// comparison may be a bare constant, a single variable, or a full
/// expression.
#[derive(Debug, Clone)]
pub enum Operand {
    Const(f64),
    Var(Variable),
    Expr(Expression),
}

impl From<f64> for Operand {
    fn from(c: f64) -> Self {
        Operand::Const(c)
    }
}

impl From<Variable> for Operand {
    fn from(v: Variable) -> Self {
        Operand::Var(v)
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Expr(e)
    }
}

/// An immutable constraint record, already normalised to `expression ⋈ 0`.
#[derive(Debug, Clone)]
pub struct Constraint {
    id: u64,
    expression: Expression,
    operator: RelationalOperator,
    strength: Strength,
    weight: f64,
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constraint {}

impl std::hash::Hash for Constraint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Constraint {
    /// Build a constraint from two operands and an operator, normalising
    /// to canonical `E ⋈ 0` form per the table below.
    ///
    /// | lhs, rhs | `≤` | `=` / `≥` |
    /// |---|---|---|
    /// | Expr, Expr | `−lhs + rhs` | `lhs − rhs` |
    /// | Expr, Var  | `−lhs + 1·v` | `lhs − v` |
    /// | Expr, Const| `−lhs + k`   | `lhs − k` |
    /// | Var, Expr  | `rhs − v`    | `±(rhs − v)` (`−` for `≥`) |
    /// | Var, Var   | `v2 − v1`    | `±(v2 − v1)` (`−` for `≥`) |
    /// | Var, Const | `k − v`      | `v − k` |
    /// | Const, Expr| `rhs − k`    | `±(rhs − k)` (`−` for `≥`) |
    /// | Const, Var | `v − k`      | `±(v − k)` (`−` for `≥`) |
    /// | Const, Const | error (inequality/equation between two constants) | |
    ///
    /// `≥` is implemented as the mirror of `≤`/`=` with signs flipped, per
    /// the table's right column.
    pub fn new(
        lhs: impl Into<Operand>,
        operator: RelationalOperator,
        rhs: impl Into<Operand>,
        strength: Strength,
        weight: f64,
    ) -> CassowaryResult<Constraint> {
        let lhs = lhs.into();
        let rhs = rhs.into();
        let expression = normalize(lhs, operator, rhs)?;
        let id = NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed);
        Ok(Constraint { id, expression, operator, strength, weight })
    }

    /// Stable identity, assigned at construction and preserved across
    /// `Clone`. Used by the solver façade to recognise "the same
    /// constraint" passed back into `remove_constraint`.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The constraint's canonical expression (`expression ⋈ 0`).
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn operator(&self) -> RelationalOperator {
        self.operator
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_equality(&self) -> bool {
        matches!(self.operator, RelationalOperator::Equal)
    }

    pub fn is_required(&self) -> bool {
        self.strength.is_required()
    }
}

/// Normalise `lhs op rhs` to canonical form, directly per the table in
/// this module's doc comment — each operand pair has its own `≤`/`=`/`≥`
/// triple, some pairs sharing a formula between `≤` and `=`, others
/// between `=` and `≥`, matching the asymmetric grouping the table shows.
fn normalize(lhs: Operand, operator: RelationalOperator, rhs: Operand) -> CassowaryResult<Expression> {
    use Operand::*;
    use RelationalOperator::*;

    let negated = |mut e: Expression| {
        e.multiply(-1.0, 0.0);
        e
    };

    Ok(match (lhs, rhs) {
        (Const(_), Const(_)) => {
            return Err(CassowaryError::InternalError(
                "cannot build a constraint between two constants".into(),
            ));
        }
        (Expr(mut a), Expr(b)) => {
            // leq: -a+b   eq/geq: a-b
            match operator {
                LessOrEqual => {
                    a.multiply(-1.0, 0.0);
                    a.add_expression(&b, 1.0, 0.0, None);
                    a
                }
                Equal | GreaterOrEqual => {
                    a.add_expression(&b, -1.0, 0.0, None);
                    a
                }
            }
        }
        (Expr(mut a), Var(v)) => match operator {
            LessOrEqual => {
                a.multiply(-1.0, 0.0);
                a.add_variable(v, 1.0, 0.0, None);
                a
            }
            Equal | GreaterOrEqual => {
                a.add_variable(v, -1.0, 0.0, None);
                a
            }
        },
        (Expr(mut a), Const(k)) => match operator {
            LessOrEqual => {
                a.multiply(-1.0, 0.0);
                a.constant += k;
                a
            }
            Equal | GreaterOrEqual => {
                a.constant -= k;
                a
            }
        },
        (Var(v), Expr(b)) => {
            // leq/eq: b-v   geq: -b+v
            let mut e = b;
            e.add_variable(v, -1.0, 0.0, None);
            match operator {
                LessOrEqual | Equal => e,
                GreaterOrEqual => negated(e),
            }
        }
        (Var(v1), Var(v2)) => {
            // leq/eq: v2-v1   geq: v1-v2
            let mut e = Expression::from_single_variable(v2);
            e.add_variable(v1, -1.0, 0.0, None);
            match operator {
                LessOrEqual | Equal => e,
                GreaterOrEqual => negated(e),
            }
        }
        (Var(v), Const(k)) => {
            // leq: k-v   eq/geq: v-k
            let mut e = Expression::from_constant(k);
            e.add_variable(v, -1.0, 0.0, None);
            match operator {
                LessOrEqual => e,
                Equal | GreaterOrEqual => negated(e),
            }
        }
        (Const(k), Expr(b)) => {
            // leq/eq: b-k   geq: -b+k
            let mut e = b;
            e.constant -= k;
            match operator {
                LessOrEqual | Equal => e,
                GreaterOrEqual => negated(e),
            }
        }
        (Const(k), Var(v)) => {
            // leq/eq: v-k   geq: k-v
            let mut e = Expression::from_single_variable(v);
            e.constant -= k;
            match operator {
                LessOrEqual | Equal => e,
                GreaterOrEqual => negated(e),
            }
        }
    })
}
