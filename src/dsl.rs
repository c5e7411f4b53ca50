//! Expression-building DSL (component H, expansion)
//!
//! Pure operator overloading over [`Variable`]/[`Expression`] — no new
//! persistent state. Every combinator here routes through
//! [`Expression::add_variable`]/[`add_expression`](Expression::add_expression)/[`multiply`](Expression::multiply)
//! rather than re-implementing expression algebra, and every comparison
//! helper builds an [`Operand`] pair and dispatches through
//! [`Constraint::new`] rather than constructing a canonical expression by
//! hand.

use std::ops::{Add, Mul, Neg, Sub};

use crate::config::DEFAULT_EPSILON;
use crate::constraint::{Constraint, Operand, RelationalOperator};
use crate::error::{CassowaryError, CassowaryResult};
use crate::expression::Expression;
use crate::strength::Strength;
use crate::variable::Variable;

// ---- Variable arithmetic ----------------------------------------------

impl Add<f64> for Variable {
    type Output = Expression;
    fn add(self, rhs: f64) -> Expression {
        Expression::from_variable(self, 1.0, rhs)
    }
}

impl Add<Variable> for f64 {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        Expression::from_variable(rhs, 1.0, self)
    }
}

impl Add<Variable> for Variable {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        let mut e = Expression::from_single_variable(self);
        e.add_variable(rhs, 1.0, DEFAULT_EPSILON, None);
        e
    }
}

impl Add<Expression> for Variable {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        let mut e = rhs;
        e.add_variable(self, 1.0, DEFAULT_EPSILON, None);
        e
    }
}

impl Sub<f64> for Variable {
    type Output = Expression;
    fn sub(self, rhs: f64) -> Expression {
        Expression::from_variable(self, 1.0, -rhs)
    }
}

impl Sub<Variable> for f64 {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_variable(rhs, -1.0, self)
    }
}

impl Sub<Variable> for Variable {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        let mut e = Expression::from_single_variable(self);
        e.add_variable(rhs, -1.0, DEFAULT_EPSILON, None);
        e
    }
}

impl Sub<Expression> for Variable {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        let mut e = rhs;
        e.multiply(-1.0, DEFAULT_EPSILON);
        e.add_variable(self, 1.0, DEFAULT_EPSILON, None);
        e
    }
}

impl Neg for Variable {
    type Output = Expression;
    fn neg(self) -> Expression {
        Expression::from_variable(self, -1.0, 0.0)
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;
    fn mul(self, rhs: f64) -> Expression {
        Expression::from_variable(self, rhs, 0.0)
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;
    fn mul(self, rhs: Variable) -> Expression {
        Expression::from_variable(rhs, self, 0.0)
    }
}

impl Variable {
    /// Fallible scalar division: `self / k`. Rejects a (near-)zero `k`.
    pub fn checked_div(self, k: f64) -> CassowaryResult<Expression> {
        Expression::from_single_variable(self).checked_div(k)
    }
}

// ---- Expression arithmetic ---------------------------------------------

impl Add<f64> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: f64) -> Expression {
        self.constant += rhs;
        self
    }
}

impl Add<Expression> for f64 {
    type Output = Expression;
    fn add(self, mut rhs: Expression) -> Expression {
        rhs.constant += self;
        rhs
    }
}

impl Add<Variable> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: Variable) -> Expression {
        self.add_variable(rhs, 1.0, DEFAULT_EPSILON, None);
        self
    }
}

impl Add<Expression> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: Expression) -> Expression {
        self.add_expression(&rhs, 1.0, DEFAULT_EPSILON, None);
        self
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: f64) -> Expression {
        self.constant -= rhs;
        self
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;
    fn sub(self, mut rhs: Expression) -> Expression {
        rhs.multiply(-1.0, DEFAULT_EPSILON);
        rhs.constant += self;
        rhs
    }
}

impl Sub<Variable> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: Variable) -> Expression {
        self.add_variable(rhs, -1.0, DEFAULT_EPSILON, None);
        self
    }
}

impl Sub<Expression> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: Expression) -> Expression {
        self.add_expression(&rhs, -1.0, DEFAULT_EPSILON, None);
        self
    }
}

impl Neg for Expression {
    type Output = Expression;
    fn neg(mut self) -> Expression {
        self.multiply(-1.0, DEFAULT_EPSILON);
        self
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;
    fn mul(mut self, rhs: f64) -> Expression {
        self.multiply(rhs, DEFAULT_EPSILON);
        self
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;
    fn mul(self, mut rhs: Expression) -> Expression {
        rhs.multiply(self, DEFAULT_EPSILON);
        rhs
    }
}

impl Expression {
    /// Fallible scalar division: `self / k`. Rejects a (near-)zero `k`
    /// with [`CassowaryError::ZeroDivision`] rather than producing
    /// `inf`/`NaN` coefficients — this is why division is a named method
    /// and not a `std::ops::Div` impl, which cannot return a `Result`.
    pub fn checked_div(mut self, k: f64) -> CassowaryResult<Expression> {
        if k.abs() <= DEFAULT_EPSILON {
            return Err(CassowaryError::ZeroDivision);
        }
        self.multiply(1.0 / k, DEFAULT_EPSILON);
        Ok(self)
    }

    /// Fallible expression-by-expression multiplication: only legal when
    /// one side is actually constant (a non-constant · non-constant
    /// product is not linear, and the kernel only ever needs the linear
    /// case).
    pub fn checked_mul_expr(&self, other: &Expression) -> CassowaryResult<Expression> {
        if other.is_constant() {
            let mut e = self.clone();
            e.multiply(other.constant(), DEFAULT_EPSILON);
            Ok(e)
        } else if self.is_constant() {
            let mut e = other.clone();
            e.multiply(self.constant(), DEFAULT_EPSILON);
            Ok(e)
        } else {
            Err(CassowaryError::InternalError(
                "cannot multiply two non-constant expressions (result would be non-linear)".into(),
            ))
        }
    }
}

// ---- Comparison helpers -------------------------------------------------

macro_rules! comparison_helpers {
    ($ty:ty, $operand_ctor:expr) => {
        impl $ty {
            /// `self == rhs` at [`Strength::REQUIRED`], weight `1.0`.
            pub fn eq(&self, rhs: impl Into<Expression>) -> CassowaryResult<Constraint> {
                self.eq_with(rhs, Strength::REQUIRED, 1.0)
            }

            /// `self == rhs` at a caller-supplied strength and weight.
            pub fn eq_with(&self, rhs: impl Into<Expression>, strength: Strength, weight: f64) -> CassowaryResult<Constraint> {
                Constraint::new($operand_ctor(self), RelationalOperator::Equal, Operand::Expr(rhs.into()), strength, weight)
            }

            /// `self <= rhs` at [`Strength::REQUIRED`], weight `1.0`.
            pub fn leq(&self, rhs: impl Into<Expression>) -> CassowaryResult<Constraint> {
                self.leq_with(rhs, Strength::REQUIRED, 1.0)
            }

            /// `self <= rhs` at a caller-supplied strength and weight.
            pub fn leq_with(&self, rhs: impl Into<Expression>, strength: Strength, weight: f64) -> CassowaryResult<Constraint> {
                Constraint::new($operand_ctor(self), RelationalOperator::LessOrEqual, Operand::Expr(rhs.into()), strength, weight)
            }

            /// `self >= rhs` at [`Strength::REQUIRED`], weight `1.0`.
            pub fn geq(&self, rhs: impl Into<Expression>) -> CassowaryResult<Constraint> {
                self.geq_with(rhs, Strength::REQUIRED, 1.0)
            }

            /// `self >= rhs` at a caller-supplied strength and weight.
            pub fn geq_with(&self, rhs: impl Into<Expression>, strength: Strength, weight: f64) -> CassowaryResult<Constraint> {
                Constraint::new($operand_ctor(self), RelationalOperator::GreaterOrEqual, Operand::Expr(rhs.into()), strength, weight)
            }
        }
    };
}

comparison_helpers!(Variable, |v: &Variable| Operand::Var(*v));
comparison_helpers!(Expression, |e: &Expression| Operand::Expr(e.clone()));
