//! Line-search Newton-CG: an inexact Newton method whose step comes from
//! a truncated conjugate-gradient solve of the Newton system.

use super::{GradientAwareMinimizer, OptimizationResult};
use crate::array::Array;
use crate::linesearch::wolfe::{strong_wolfe_point, LineSearchPoint, WolfeConfig};
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`NewtonCg`].
#[derive(Debug, Clone, Copy)]
pub struct NewtonCgConfig {
    /// Stop when `‖∇f‖ < tol`.
    pub tol: Real,
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// Strong-Wolfe sub-configuration for the outer step.
    pub wolfe: WolfeConfig,
    /// Finite-difference step used for the Hessian-vector product.
    pub hessian_eps: Real,
}

impl Default for NewtonCgConfig {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 200,
            wolfe: WolfeConfig::default(),
            hessian_eps: 1e-6,
        }
    }
}

/// Line-search Newton-CG.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonCg;

/// Finite-difference Hessian-vector product: `(∇f(x + eps·v) − ∇f(x)) / eps`.
pub(crate) fn hessian_vec<G: Fn(&Array) -> Array>(
    g: &G,
    x: &Array,
    v: &Array,
    eps: Real,
) -> Array {
    let gx = g(x);
    let xv = x + &v.scale(eps);
    let gxv = g(&xv);
    (&gxv - &gx).scale(1.0 / eps)
}

/// Truncated CG solve of `H p = -grad`, stopping on non-positive
/// curvature or the forcing-term tolerance `εₖ`.
pub(crate) fn inner_cg<G: Fn(&Array) -> Array>(
    g: &G,
    x: &Array,
    grad: &Array,
    eps: Real,
) -> Array {
    let grad_norm = grad.norm();
    let target_eps = 0.5_f64.min(grad_norm.sqrt()) * grad_norm;
    let n = grad.size();
    let max_inner = n + 5;

    let mut z = Array::zeros(n);
    let mut r = grad.clone();
    let mut d = -grad.clone();

    if r.norm() < target_eps {
        return z;
    }

    for _ in 0..max_inner {
        let hd = hessian_vec(g, x, &d, eps);
        let dhd = d.dot(&hd);
        if dhd <= 0.0 {
            return if z.norm() == 0.0 { -grad.clone() } else { z };
        }
        let alpha = r.dot(&r) / dhd;
        let z_next = &z + &d.scale(alpha);
        let r_next = &r + &hd.scale(alpha);
        if r_next.norm() < target_eps {
            return z_next;
        }
        let beta = r_next.norm_squared() / r.norm_squared();
        d = -r_next.clone() + &d * beta;
        z = z_next;
        r = r_next;
    }
    z
}

impl GradientAwareMinimizer for NewtonCg {
    type Config = NewtonCgConfig;

    fn minimize_with_gradient<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
        &self,
        f: &F,
        g: &G,
        x0: &Array,
        cfg: &NewtonCgConfig,
    ) -> Result<OptimizationResult> {
        let mut point = LineSearchPoint::new(f, g, x0);
        if point.grad.norm() < cfg.tol {
            return Ok(OptimizationResult {
                x: point.x,
                value: point.f,
                iterations: 0,
            });
        }

        for iteration in 0..cfg.max_iter {
            let p = inner_cg(g, &point.x, &point.grad, cfg.hessian_eps);
            let next = strong_wolfe_point(f, g, &point, &p, &cfg.wolfe)?;

            if next.grad.norm() < cfg.tol {
                return Ok(OptimizationResult {
                    x: next.x,
                    value: next.f,
                    iterations: iteration + 1,
                });
            }
            point = next;
        }

        Err(Error::MaxIter("Newton-CG".into()))
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
        let cfg = NewtonCgConfig::default();
        let result = NewtonCg
            .minimize_with_gradient(&quadratic, &quadratic_grad, &x0, &cfg)
            .unwrap();
        let target = Array::from_slice(&[0.5, 2.0]);
        let err = (&result.x - &target).norm();
        assert!(err < 1e-4, "err = {err}");
    }

    #[test]
    fn fails_on_monotone_linear_function() {
        let f = |x: &Array| x[0] + x[1];
        let g = |_x: &Array| Array::from_slice(&[1.0, 1.0]);
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = NewtonCgConfig {
            max_iter: 20,
            ..NewtonCgConfig::default()
        };
        assert!(matches!(
            NewtonCg.minimize_with_gradient(&f, &g, &x0, &cfg),
            Err(Error::MaxIter(_)) | Err(Error::Precondition(_))
        ));
    }
}
