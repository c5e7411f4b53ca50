//! Configuration for the Cassowary solver
//!
//! This module provides the [`SolverConfig`] struct for tuning the numeric
//! tolerance used throughout the kernel and the pivot ceiling that guards
//! against a pathological constraint set spinning the simplex loops
//! forever.

/// Default epsilon used to decide whether a coefficient or row constant is
/// effectively zero.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Default ceiling on primal/dual simplex pivots per solver operation.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Configuration for a [`crate::solver::SimplexSolver`].
///
/// Use `SolverConfig::default()` for sensible defaults, or build a custom
/// configuration with the `with_*`/`without_*` methods.
///
/// # Examples
///
/// ```
/// use cassowary::SolverConfig;
///
/// let config = SolverConfig::default().with_epsilon(1e-6);
/// assert_eq!(config.epsilon, 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Tolerance used to decide whether a coefficient or row constant is
    /// effectively zero (invariant E1, feasibility checks in T3).
    pub epsilon: f64,

    /// Maximum number of pivots primal or dual optimisation may perform
    /// before raising [`crate::error::CassowaryError::IterationLimit`].
    /// `None` means unlimited.
    pub max_iterations: Option<usize>,

    /// Whether pivot-level diagnostics are collected in a
    /// [`crate::trace::PivotTrace`] as the kernel runs.
    pub trace: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            trace: false,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the numeric tolerance used for coefficient-zero tests.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the ceiling on simplex pivots per operation.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Remove the iteration ceiling, allowing solving to run unbounded.
    ///
    /// Use with caution: a malformed constraint set can spin forever.
    #[must_use]
    pub fn unlimited_iterations(mut self) -> Self {
        self.max_iterations = None;
        self
    }

    /// Enable collection of a [`crate::trace::PivotTrace`] on the solver.
    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.max_iterations, Some(DEFAULT_MAX_ITERATIONS));
        assert!(!config.trace);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SolverConfig::new()
            .with_epsilon(1e-6)
            .with_max_iterations(500)
            .with_trace(true);

        assert_eq!(config.epsilon, 1e-6);
        assert_eq!(config.max_iterations, Some(500));
        assert!(config.trace);
    }

    #[test]
    fn test_unlimited_iterations() {
        let config = SolverConfig::new().with_max_iterations(10).unlimited_iterations();
        assert_eq!(config.max_iterations, None);
    }
}
