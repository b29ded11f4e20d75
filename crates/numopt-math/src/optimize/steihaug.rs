//! Steihaug trust-region conjugate gradient.

use super::newton_cg::hessian_vec;
use super::{GradientAwareMinimizer, OptimizationResult};
use crate::array::Array;
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`Steihaug`].
#[derive(Debug, Clone, Copy)]
pub struct SteihaugConfig {
    /// Stop when `‖∇f‖ < tol`.
    pub tol: Real,
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// Initial trust-region radius.
    pub delta0: Real,
    /// Maximum trust-region radius.
    pub delta_max: Real,
    /// Minimum reduction ratio for a step to be accepted.
    pub eta: Real,
    /// Finite-difference step used for the Hessian-vector product.
    pub hessian_eps: Real,
}

impl Default for SteihaugConfig {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 200,
            delta0: 1.0,
            delta_max: 1e5,
            eta: 0.2,
            hessian_eps: 1e-6,
        }
    }
}

/// Steihaug trust-region conjugate gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct Steihaug;

struct CgStep {
    p: Array,
    on_boundary: bool,
}

/// The positive root `τ` of `‖z + τd‖ = delta`.
fn boundary_tau(z: &Array, d: &Array, delta: Real) -> Real {
    let a = d.dot(d);
    let b = 2.0 * z.dot(d);
    let c = z.dot(z) - delta * delta;
    let disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
    (-b + disc) / (2.0 * a)
}

fn steihaug_cg<G: Fn(&Array) -> Array>(
    g: &G,
    x: &Array,
    grad: &Array,
    delta: Real,
    eps: Real,
) -> CgStep {
    let n = grad.size();
    let max_inner = n + 5;
    let grad_norm = grad.norm();
    if grad_norm < 1e-14 {
        return CgStep {
            p: Array::zeros(n),
            on_boundary: false,
        };
    }
    let tol_inner = (grad_norm * 1e-2).max(1e-12);

    let mut z = Array::zeros(n);
    let mut r = grad.clone();
    let mut d = -grad.clone();

    for _ in 0..max_inner {
        let hd = hessian_vec(g, x, &d, eps);
        let dhd = d.dot(&hd);
        if dhd <= 0.0 {
            let tau = boundary_tau(&z, &d, delta);
            return CgStep {
                p: &z + &d.scale(tau),
                on_boundary: true,
            };
        }
        let alpha = r.dot(&r) / dhd;
        let z_next = &z + &d.scale(alpha);
        if z_next.norm() >= delta {
            let tau = boundary_tau(&z, &d, delta);
            return CgStep {
                p: &z + &d.scale(tau),
                on_boundary: true,
            };
        }
        let r_next = &r + &hd.scale(alpha);
        if r_next.norm() < tol_inner {
            return CgStep {
                p: z_next,
                on_boundary: false,
            };
        }
        let beta = r_next.norm_squared() / r.norm_squared();
        d = -r_next.clone() + &d * beta;
        z = z_next;
        r = r_next;
    }
    let on_boundary = z.norm() >= delta - 1e-9;
    CgStep { p: z, on_boundary }
}

impl GradientAwareMinimizer for Steihaug {
    type Config = SteihaugConfig;

    fn minimize_with_gradient<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
        &self,
        f: &F,
        g: &G,
        x0: &Array,
        cfg: &SteihaugConfig,
    ) -> Result<OptimizationResult> {
        let mut x = x0.clone();
        let mut fx = f(&x);
        let mut grad = g(&x);
        let mut delta = cfg.delta0;

        for iteration in 0..cfg.max_iter {
            if grad.norm() < cfg.tol {
                return Ok(OptimizationResult {
                    x,
                    value: fx,
                    iterations: iteration,
                });
            }

            let step = steihaug_cg(g, &x, &grad, delta, cfg.hessian_eps);
            let hp = hessian_vec(g, &x, &step.p, cfg.hessian_eps);
            let pred_reduction = -(grad.dot(&step.p) + 0.5 * step.p.dot(&hp));

            let x_trial = &x + &step.p;
            let f_trial = f(&x_trial);
            let actual_reduction = fx - f_trial;
            let rho = if pred_reduction.abs() < 1e-14 {
                0.0
            } else {
                actual_reduction / pred_reduction
            };

            if rho < 0.25 {
                delta /= 4.0;
            } else if rho > 0.75 && step.on_boundary {
                delta = (2.0 * delta).min(cfg.delta_max);
            }

            if rho > cfg.eta {
                x = x_trial;
                fx = f_trial;
                grad = g(&x);
            }
        }

        Err(Error::MaxIter("Steihaug trust-region CG".into()))
    }
}
