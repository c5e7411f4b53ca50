//! Strength algebra (component C)
//!
//! A constraint's strength is either `Required` — a distinguished value
//! outside the lattice below that always dominates — or a symbolic
//! 3-vector `(s1, s2, s3)` compared lexicographically. `Strength`
//! provides the arithmetic (`add`, `subtract`, `scale`) the objective row
//! needs to accumulate contributions from every non-required constraint
//! currently installed.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Sub};

/// A symbolic, non-required weight: a 3-vector compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolicWeight(pub f64, pub f64, pub f64);

impl SymbolicWeight {
    /// The zero weight — identity for [`Add`]/[`Sub`].
    pub const ZERO: SymbolicWeight = SymbolicWeight(0.0, 0.0, 0.0);

    /// Scale every component by `k`.
    pub fn scale(self, k: f64) -> SymbolicWeight {
        SymbolicWeight(self.0 * k, self.1 * k, self.2 * k)
    }

    /// `true` if every component is within `epsilon` of zero.
    pub fn is_zero(self, epsilon: f64) -> bool {
        self.0.abs() <= epsilon && self.1.abs() <= epsilon && self.2.abs() <= epsilon
    }
}

impl Add for SymbolicWeight {
    type Output = SymbolicWeight;
    fn add(self, rhs: SymbolicWeight) -> SymbolicWeight {
        SymbolicWeight(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

impl Sub for SymbolicWeight {
    type Output = SymbolicWeight;
    fn sub(self, rhs: SymbolicWeight) -> SymbolicWeight {
        SymbolicWeight(self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2)
    }
}

impl Mul<f64> for SymbolicWeight {
    type Output = SymbolicWeight;
    fn mul(self, k: f64) -> SymbolicWeight {
        self.scale(k)
    }
}

impl PartialOrd for SymbolicWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(
            self.0
                .partial_cmp(&other.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.1.partial_cmp(&other.1).unwrap_or(Ordering::Equal))
                .then_with(|| self.2.partial_cmp(&other.2).unwrap_or(Ordering::Equal)),
        )
    }
}

/// A constraint's weight class: required, or a lexicographically
/// compared symbolic triple.
///
/// `REQUIRED` is defined outside the `(s1, s2, s3)` lattice and always
/// dominates every other strength, matching the "required constraints
/// are never traded off" semantics of the Cassowary algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strength {
    /// Must always be satisfied; never traded off against other
    /// constraints.
    Required,
    /// A symbolic, lexicographically compared weight.
    Value(SymbolicWeight),
}

impl Strength {
    /// `STRONG = (1, 0, 0)`.
    pub const STRONG: Strength = Strength::Value(SymbolicWeight(1.0, 0.0, 0.0));
    /// `MEDIUM = (0, 1, 0)`.
    pub const MEDIUM: Strength = Strength::Value(SymbolicWeight(0.0, 1.0, 0.0));
    /// `WEAK = (0, 0, 1)`.
    pub const WEAK: Strength = Strength::Value(SymbolicWeight(0.0, 0.0, 1.0));
    /// Dominates every other strength; never traded off.
    pub const REQUIRED: Strength = Strength::Required;

    /// Build a custom non-required strength from its three components.
    pub fn new(s1: f64, s2: f64, s3: f64) -> Strength {
        Strength::Value(SymbolicWeight(s1, s2, s3))
    }

    /// `true` for [`Strength::Required`].
    pub fn is_required(&self) -> bool {
        matches!(self, Strength::Required)
    }

    /// Scale a non-required strength by `k`; `Required` is unaffected
    /// (there is nothing to scale — it carries no symbolic weight).
    pub fn scale(self, k: f64) -> Strength {
        match self {
            Strength::Required => Strength::Required,
            Strength::Value(w) => Strength::Value(w.scale(k)),
        }
    }

    /// Add two non-required strengths component-wise. Adding with
    /// `Required` on either side yields `Required`.
    pub fn add(self, rhs: Strength) -> Strength {
        match (self, rhs) {
            (Strength::Required, _) | (_, Strength::Required) => Strength::Required,
            (Strength::Value(a), Strength::Value(b)) => Strength::Value(a + b),
        }
    }

    /// Subtract `rhs` from `self`, component-wise for non-required
    /// strengths.
    pub fn subtract(self, rhs: Strength) -> Strength {
        match (self, rhs) {
            (Strength::Required, _) | (_, Strength::Required) => Strength::Required,
            (Strength::Value(a), Strength::Value(b)) => Strength::Value(a - b),
        }
    }

    /// Fold this strength, scaled by `weight`, into a single comparable
    /// `f64` objective-row coefficient.
    ///
    /// The kernel's objective row is an ordinary [`crate::expression::Expression`]
    /// with plain `f64` coefficients (see `simplex` module docs for why),
    /// so every error variable's symbolic `strength ⊗ weight` has to be
    /// folded into one number before it can be added as a term. This uses
    /// the classic Cassowary technique of giving each of the three levels
    /// its own magnitude band (clamped so one level's contribution can
    /// never bleed into the next) rather than true arbitrary-precision
    /// lexicographic comparison — the standard engineering compromise
    /// production Cassowary solvers make, sufficient as long as no single
    /// constraint's weighted strength approaches the band width.
    ///
    /// `Required` never reaches the objective row (required constraints
    /// get a dummy or artificial variable, never an error variable), so
    /// this returns `f64::INFINITY` for it rather than silently folding
    /// it into the same scale as everything else.
    pub fn as_objective_weight(self, weight: f64) -> f64 {
        const BAND: f64 = 1_000.0;
        match self {
            Strength::Required => f64::INFINITY,
            Strength::Value(w) => {
                (w.0.clamp(0.0, BAND) * BAND * BAND + w.1.clamp(0.0, BAND) * BAND + w.2.clamp(0.0, BAND))
                    * weight
            }
        }
    }
}

impl PartialOrd for Strength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Strength::Required, Strength::Required) => Some(Ordering::Equal),
            (Strength::Required, _) => Some(Ordering::Greater),
            (_, Strength::Required) => Some(Ordering::Less),
            (Strength::Value(a), Strength::Value(b)) => a.partial_cmp(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_dominates_everything() {
        assert!(Strength::REQUIRED > Strength::STRONG);
        assert!(Strength::REQUIRED > Strength::MEDIUM);
        assert!(Strength::REQUIRED > Strength::WEAK);
    }

    #[test]
    fn lexicographic_ordering_of_levels() {
        assert!(Strength::STRONG > Strength::MEDIUM);
        assert!(Strength::MEDIUM > Strength::WEAK);
        assert!(Strength::new(0.0, 5.0, 0.0) > Strength::new(0.0, 1.0, 1000.0));
    }

    #[test]
    fn add_and_subtract() {
        let a = Strength::new(1.0, 2.0, 3.0);
        let b = Strength::new(0.5, 0.5, 0.5);
        assert_eq!(a.add(b), Strength::new(1.5, 2.5, 3.5));
        assert_eq!(a.subtract(b), Strength::new(0.5, 1.5, 2.5));
    }

    #[test]
    fn scale() {
        assert_eq!(Strength::new(1.0, 2.0, 3.0).scale(2.0), Strength::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn required_is_required() {
        assert!(Strength::REQUIRED.is_required());
        assert!(!Strength::STRONG.is_required());
    }

    #[test]
    fn objective_weight_respects_band_order() {
        let strong = Strength::STRONG.as_objective_weight(1.0);
        let medium = Strength::MEDIUM.as_objective_weight(1.0);
        let weak = Strength::WEAK.as_objective_weight(1.0);
        assert!(strong > medium);
        assert!(medium > weak);
        // A large weak weight still cannot outweigh one unit of medium.
        let many_weak = Strength::WEAK.as_objective_weight(500.0);
        assert!(medium > many_weak);
    }
}
