//! BFGS quasi-Newton minimizer.

use super::{GradientAwareMinimizer, OptimizationResult};
use crate::array::Array;
use crate::linesearch::wolfe::{strong_wolfe_point, LineSearchPoint, WolfeConfig};
use crate::matrix::Matrix;
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`Bfgs`].
#[derive(Debug, Clone, Copy)]
pub struct BfgsConfig {
    /// Stop when `‖∇f‖ < tol`.
    pub tol: Real,
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// Strong-Wolfe sub-configuration.
    pub wolfe: WolfeConfig,
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 1000,
            wolfe: WolfeConfig::default(),
        }
    }
}

/// BFGS (Broyden–Fletcher–Goldfarb–Shanno) quasi-Newton minimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bfgs;

/// Degeneracy guard used when `yᵀs = 0`: a bounded large scalar rather
/// than an unbounded one, per Nocedal & Wright's recommendation to skip
/// the update outright when curvature vanishes — here we still perform
/// the update with this capped `ρ` rather than skipping, matching the
/// source's magic-number behaviour but keeping it finite.
const DEGENERATE_RHO: Real = 1e3;

impl GradientAwareMinimizer for Bfgs {
    type Config = BfgsConfig;

    fn minimize_with_gradient<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
        &self,
        f: &F,
        g: &G,
        x0: &Array,
        cfg: &BfgsConfig,
    ) -> Result<OptimizationResult> {
        let n = x0.size();
        let mut point = LineSearchPoint::new(f, g, x0);
        let mut h_inv = Matrix::identity(n);

        if point.grad.norm() < cfg.tol {
            return Ok(OptimizationResult {
                x: point.x,
                value: point.f,
                iterations: 0,
            });
        }

        for iteration in 0..cfg.max_iter {
            let direction = -h_inv.mul_vec(&point.grad);
            let next = strong_wolfe_point(f, g, &point, &direction, &cfg.wolfe)?;

            if next.grad.norm() < cfg.tol {
                return Ok(OptimizationResult {
                    x: next.x,
                    value: next.f,
                    iterations: iteration + 1,
                });
            }

            let s = &next.x - &point.x;
            let y = &next.grad - &point.grad;
            let sy = s.dot(&y);
            let rho = if sy == 0.0 { DEGENERATE_RHO } else { 1.0 / sy };

            h_inv = bfgs_update(&h_inv, &s, &y, rho);
            point = next;
        }

        Err(Error::MaxIter("BFGS".into()))
    }
}

/// `Hₖ₊₁ = (I − ρ·syᵀ)·Hₖ·(I − ρ·ysᵀ) + ρ·ssᵀ`.
fn bfgs_update(h: &Matrix, s: &Array, y: &Array, rho: Real) -> Matrix {
    let n = s.size();
    let identity = Matrix::identity(n);
    let left = &identity - &s.outer(y).scale(rho);
    let right = &identity - &y.outer(s).scale(rho);
    let middle = &(&left * h) * &right;
    let correction = s.outer(s).scale(rho);
    &middle + &correction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &Array) -> Real {
        let t = Array::from_slice(&[0.5, 2.0]);
        let d = x - &t;
        0.5 * d.dot(&d)
    }
    fn quadratic_grad(x: &Array) -> Array {
        let t = Array::from_slice(&[0.5, 2.0]);
        x - &t
    }

    #[test]
    fn converges_on_quadratic_bowl() {
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = BfgsConfig::default();
        let result = Bfgs
            .minimize_with_gradient(&quadratic, &quadratic_grad, &x0, &cfg)
            .unwrap();
        let target = Array::from_slice(&[0.5, 2.0]);
        let err = (&result.x - &target).norm();
        assert!(err < 1e-5, "err = {err}");
    }

    #[test]
    fn preserves_positive_definiteness_when_curvature_positive() {
        let s = Array::from_slice(&[1.0, 0.0]);
        let y = Array::from_slice(&[1.0, 0.2]);
        let h0 = Matrix::identity(2);
        let rho = 1.0 / s.dot(&y);
        let h1 = bfgs_update(&h0, &s, &y, rho);
        // A 2x2 symmetric matrix is PD iff trace > 0 and determinant > 0.
        assert!(h1.trace() > 0.0);
        assert!(h1.determinant() > 0.0);
    }

    #[test]
    fn fails_on_monotone_linear_function() {
        let f = |x: &Array| x[0] + x[1];
        let g = |_x: &Array| Array::from_slice(&[1.0, 1.0]);
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = BfgsConfig {
            max_iter: 20,
            ..BfgsConfig::default()
        };
        assert!(matches!(
            Bfgs.minimize_with_gradient(&f, &g, &x0, &cfg),
            Err(Error::MaxIter(_))
        ));
    }
}
