//! Nonlinear Conjugate Gradient (Fletcher–Reeves / Polak–Ribière / PR+).

use super::{GradientAwareMinimizer, OptimizationResult};
use crate::array::Array;
use crate::linesearch::wolfe::{strong_wolfe_point, LineSearchPoint, WolfeConfig};
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Which β update rule to use between successive CG directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetaRule {
    /// Fletcher–Reeves.
    FletcherReeves,
    /// Polak–Ribière.
    PolakRibiere,
    /// Polak–Ribière with non-negative clipping (the usual default).
    PolakRibierePlus,
}

/// Configuration for [`ConjugateGradient`].
#[derive(Debug, Clone, Copy)]
pub struct ConjugateGradientConfig {
    /// Stop when `‖∇f‖ < tol`.
    pub tol: Real,
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// β update rule.
    pub beta_rule: BetaRule,
    /// Strong-Wolfe sub-configuration.
    pub wolfe: WolfeConfig,
}

impl Default for ConjugateGradientConfig {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 1000,
            beta_rule: BetaRule::PolakRibierePlus,
            wolfe: WolfeConfig::default(),
        }
    }
}

/// Nonlinear conjugate gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjugateGradient;

fn beta(rule: BetaRule, g_prev: &Array, g_next: &Array) -> Real {
    let prev_sq = g_prev.norm_squared();
    if prev_sq == 0.0 {
        return 0.0;
    }
    match rule {
        BetaRule::FletcherReeves => g_next.norm_squared() / prev_sq,
        BetaRule::PolakRibiere => g_next.dot(&(g_next - g_prev)) / prev_sq,
        BetaRule::PolakRibierePlus => (g_next.dot(&(g_next - g_prev)) / prev_sq).max(0.0),
    }
}

impl GradientAwareMinimizer for ConjugateGradient {
    type Config = ConjugateGradientConfig;

    fn minimize_with_gradient<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
        &self,
        f: &F,
        g: &G,
        x0: &Array,
        cfg: &ConjugateGradientConfig,
    ) -> Result<OptimizationResult> {
        let mut point = LineSearchPoint::new(f, g, x0);
        if point.grad.norm() < cfg.tol {
            return Ok(OptimizationResult {
                x: point.x,
                value: point.f,
                iterations: 0,
            });
        }
        let mut direction = -point.grad.clone();

        for iteration in 0..cfg.max_iter {
            let next = strong_wolfe_point(f, g, &point, &direction, &cfg.wolfe)?;

            if next.grad.norm() < cfg.tol {
                return Ok(OptimizationResult {
                    x: next.x,
                    value: next.f,
                    iterations: iteration + 1,
                });
            }

            let b = beta(cfg.beta_rule, &point.grad, &next.grad);
            direction = -next.grad.clone() + &direction * b;
            point = next;
        }

        Err(Error::MaxIter("nonlinear conjugate gradient".into()))
    }
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
        let cfg = ConjugateGradientConfig::default();
        let result = ConjugateGradient
            .minimize_with_gradient(&quadratic, &quadratic_grad, &x0, &cfg)
            .unwrap();
        let target = Array::from_slice(&[0.5, 2.0]);
        let err = (&result.x - &target).norm();
        assert!(err < 1e-5, "err = {err}");
    }

    #[test]
    fn falls_back_to_finite_difference_gradient() {
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = ConjugateGradientConfig::default();
        let result = ConjugateGradient.minimize(&quadratic, &x0, &cfg).unwrap();
        let target = Array::from_slice(&[0.5, 2.0]);
        let err = (&result.x - &target).norm();
        assert!(err < 1e-3, "err = {err}");
    }

    #[test]
    fn fails_on_monotone_linear_function() {
        let f = |x: &Array| x[0] + x[1];
        let g = |_x: &Array| Array::from_slice(&[1.0, 1.0]);
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = ConjugateGradientConfig {
            max_iter: 20,
            ..ConjugateGradientConfig::default()
        };
        assert!(matches!(
            ConjugateGradient.minimize_with_gradient(&f, &g, &x0, &cfg),
            Err(Error::MaxIter(_))
        ));
    }
}
