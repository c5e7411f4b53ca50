//! Error types for the Cassowary solver
//!
//! This enum covers every failure mode the solver's public surface can
//! raise. It mirrors the distinction the literature draws between a
//! constraint set that is genuinely unsatisfiable (`RequiredFailure`) and
//! a bug or numerical pathology inside the kernel itself (`InternalError`).

/// Errors produced by the constraint-solving kernel and its expression DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum CassowaryError {
    /// A required constraint is inconsistent with the constraints already
    /// installed. The tableau is left exactly as it was before the failing
    /// `add_constraint` call.
    RequiredFailure,

    /// `remove_constraint` was called with a constraint that is not
    /// currently installed in the solver.
    ConstraintNotFound,

    /// An invariant of the tableau or simplex kernel was violated: an
    /// unbounded objective, a primal-infeasible tableau after a supposedly
    /// feasible edit, a pivot attempted on a constant expression, or
    /// invalid constructor arguments. Indicates a bug or numerical
    /// pathology rather than an ordinary unsatisfiable-constraint outcome.
    InternalError(String),

    /// An expression was divided by (approximately) zero.
    ZeroDivision,

    /// Primal or dual optimisation exceeded `SolverConfig::max_iterations`
    /// without reaching an optimal, feasible tableau.
    IterationLimit {
        /// The configured ceiling that was exceeded.
        limit: usize,
    },

    /// `suggest_value` was called outside a `begin_edit`/`end_edit`
    /// bracket.
    NoActiveEdit,
}

impl std::fmt::Display for CassowaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequiredFailure => {
                write!(f, "required constraint is inconsistent with the current constraint set")
            }
            Self::ConstraintNotFound => {
                write!(f, "constraint is not installed in this solver")
            }
            Self::InternalError(msg) => write!(f, "internal solver error: {}", msg),
            Self::ZeroDivision => write!(f, "division by zero in expression arithmetic"),
            Self::IterationLimit { limit } => {
                write!(f, "simplex iteration limit ({}) exceeded", limit)
            }
            Self::NoActiveEdit => {
                write!(f, "suggest_value called without an active begin_edit/end_edit bracket")
            }
        }
    }
}

impl std::error::Error for CassowaryError {}

/// Convenience alias for results that can fail with [`CassowaryError`].
pub type CassowaryResult<T> = Result<T, CassowaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CassowaryError::RequiredFailure.to_string(),
            "required constraint is inconsistent with the current constraint set"
        );
        assert_eq!(
            CassowaryError::InternalError("pivot on constant".into()).to_string(),
            "internal solver error: pivot on constant"
        );
        assert_eq!(
            CassowaryError::IterationLimit { limit: 1000 }.to_string(),
            "simplex iteration limit (1000) exceeded"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(CassowaryError::ConstraintNotFound, CassowaryError::ConstraintNotFound);
        assert_ne!(CassowaryError::ZeroDivision, CassowaryError::NoActiveEdit);
    }

    #[test]
    fn test_error_is_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(CassowaryError::RequiredFailure);
        assert!(err.to_string().contains("inconsistent"));
    }
}
