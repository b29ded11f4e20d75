//! Unconstrained minimizers: shared types plus the capability-set traits
//! that stand in for a classical optimizer inheritance hierarchy.
//!
//! Every concrete minimizer implements [`Minimizer`] (derivative-free) or
//! [`GradientAwareMinimizer`] (needs a gradient, falling back to forward
//! differences when the caller supplies none) rather than deriving from a
//! common base class.

pub mod bfgs;
pub mod cg;
pub mod nelder_mead;
pub mod newton_cg;
pub mod powell;
pub mod steihaug;

use crate::array::Array;
use numopt_core::errors::Result;
use numopt_core::Real;

pub use crate::linesearch::LineSearchPoint;

/// The outcome of a successful minimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The final iterate.
    pub x: Array,
    /// The objective value at `x`.
    pub value: Real,
    /// The number of outer iterations performed.
    pub iterations: usize,
}

/// A constraint on the parameter space, tested after every trial step.
pub trait Constraint {
    /// Return `true` if `x` satisfies the constraint.
    fn test(&self, x: &Array) -> bool;
}

/// No constraint — every point is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

/// Every coordinate must be strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v > 0.0)
    }
}

/// Every coordinate must lie within `[lo, hi]`.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    /// Lower bound, inclusive.
    pub lo: Real,
    /// Upper bound, inclusive.
    pub hi: Real,
}

impl BoundaryConstraint {
    /// Create a boundary constraint.
    pub fn new(lo: Real, hi: Real) -> Self {
        Self { lo, hi }
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v >= self.lo && v <= self.hi)
    }
}

/// The default finite-difference step used when a gradient is needed but
/// none was supplied.
pub const DEFAULT_FD_EPS: Real = 1e-7;

/// Forward-difference gradient: `(f(x + eps·eᵢ) − f(x)) / eps` per
/// coordinate.
pub fn finite_difference_gradient<F: Fn(&Array) -> Real>(f: &F, x: &Array, eps: Real) -> Array {
    let n = x.size();
    let f0 = f(x);
    let mut grad = Array::zeros(n);
    for i in 0..n {
        let mut xp = x.clone();
        xp[i] += eps;
        grad[i] = (f(&xp) - f0) / eps;
    }
    grad
}

/// A derivative-free minimizer (Nelder–Mead, Powell).
pub trait Minimizer {
    /// The minimizer's configuration record.
    type Config;

    /// Minimize `f` starting from `x0`.
    fn minimize<F: Fn(&Array) -> Real>(
        &self,
        f: &F,
        x0: &Array,
        cfg: &Self::Config,
    ) -> Result<OptimizationResult>;
}

/// A minimizer that consumes a gradient (CG, Newton-CG, Steihaug, BFGS).
///
/// Implementors fall back to [`finite_difference_gradient`], deriving the
/// gradient by forward differences when none is supplied.
pub trait GradientAwareMinimizer {
    /// The minimizer's configuration record.
    type Config;

    /// Minimize `f` with analytic gradient `g`, starting from `x0`.
    fn minimize_with_gradient<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
        &self,
        f: &F,
        g: &G,
        x0: &Array,
        cfg: &Self::Config,
    ) -> Result<OptimizationResult>;

    /// Minimize `f`, deriving the gradient by forward differences.
    fn minimize<F: Fn(&Array) -> Real>(
        &self,
        f: &F,
        x0: &Array,
        cfg: &Self::Config,
    ) -> Result<OptimizationResult> {
        let g = |x: &Array| finite_difference_gradient(f, x, DEFAULT_FD_EPS);
        self.minimize_with_gradient(f, &g, x0, cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_difference_gradient_matches_analytic_on_quadratic() {
        let f = |x: &Array| 0.5 * x.dot(x);
        let x = Array::from_slice(&[1.0, 2.0, -3.0]);
        let grad = finite_difference_gradient(&f, &x, 1e-6);
        for i in 0..3 {
            assert!((grad[i] - x[i]).abs() < 1e-4, "grad[{i}] = {}", grad[i]);
        }
    }

    #[test]
    fn positive_constraint_rejects_nonpositive() {
        let c = PositiveConstraint;
        assert!(c.test(&Array::from_slice(&[1.0, 2.0])));
        assert!(!c.test(&Array::from_slice(&[0.0, 2.0])));
    }

    #[test]
    fn boundary_constraint_checks_bounds() {
        let c = BoundaryConstraint::new(0.0, 10.0);
        assert!(c.test(&Array::from_slice(&[0.0, 5.0, 10.0])));
        assert!(!c.test(&Array::from_slice(&[-1.0, 5.0])));
    }
}
