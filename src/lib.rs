//! An incremental linear-arithmetic constraint solver implementing the
//! Cassowary algorithm.
//!
//! A [`solver::SimplexSolver`] maintains a set of linear equality and
//! inequality constraints over [`variable::Variable`]s, each carrying a
//! [`strength::Strength`] (how hard it must be satisfied) and a weight.
//! Required constraints must hold exactly; non-required constraints are
//! traded off against each other, weaker ones yielding to stronger ones.
//! Once a constraint set is installed, external variables can be
//! incrementally re-suggested via the edit-variable protocol
//! ([`solver::SimplexSolver::add_edit_var`],
//! [`solver::SimplexSolver::suggest_value`],
//! [`solver::SimplexSolver::resolve`]) without re-solving from scratch.
//!
//! # Example
//!
//! ```
//! use cassowary::{SimplexSolver, Strength};
//!
//! let mut solver = SimplexSolver::new();
//! let left = solver.new_external("left", 0.0);
//! let width = solver.new_external("width", 0.0);
//!
//! solver.add_stay(left).unwrap();
//! solver.add_constraint(width.eq_with(100.0, Strength::STRONG, 1.0).unwrap()).unwrap();
//! solver.add_constraint(left.geq(0.0).unwrap()).unwrap();
//!
//! assert_eq!(solver.value(width), 100.0);
//! ```

pub mod config;
pub mod constraint;
pub mod dsl;
pub mod error;
pub mod expression;
pub mod simplex;
pub mod solver;
pub mod strength;
pub mod tableau;
pub mod trace;
pub mod variable;

pub use config::SolverConfig;
pub use constraint::{Constraint, Operand, RelationalOperator};
pub use error::{CassowaryError, CassowaryResult};
pub use expression::Expression;
pub use solver::SimplexSolver;
pub use strength::{Strength, SymbolicWeight};
pub use trace::{Phase, PivotEvent, PivotTrace};
pub use variable::{Variable, VariableKind, VariableRegistry};
