//! Powell's direction-set derivative-free minimizer.

use super::{Minimizer, OptimizationResult};
use crate::array::Array;
use crate::linesearch::golden::{self, GoldenConfig};
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`Powell`].
#[derive(Debug, Clone, Copy)]
pub struct PowellConfig {
    /// Convergence tolerance on the step between outer iterates.
    pub tol: Real,
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// Configuration for the golden-section line searches.
    pub golden: GoldenConfig,
}

impl Default for PowellConfig {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            max_iter: 200,
            golden: GoldenConfig::default(),
        }
    }
}

/// Powell's method: cycles through a direction set, replacing the
/// direction of largest decrease each outer iteration to keep the set
/// linearly independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Powell;

fn line_search_along<F: Fn(&Array) -> Real>(
    f: &F,
    x: &Array,
    dir: &Array,
    cfg: &GoldenConfig,
) -> Result<Array> {
    let g = |alpha: Real| f(&(x + &dir.scale(alpha)));
    let (a, b) = golden::bracket(&g, 0.0, cfg)?;
    let (alpha_min, _) = golden::minimize(&g, a, b, cfg)?;
    Ok(x + &dir.scale(alpha_min))
}

impl Minimizer for Powell {
    type Config = PowellConfig;

    fn minimize<F: Fn(&Array) -> Real>(
        &self,
        f: &F,
        x0: &Array,
        cfg: &PowellConfig,
    ) -> Result<OptimizationResult> {
        let n = x0.size();
        if n == 0 {
            return Err(Error::InvalidArgument(
                "Powell requires a non-empty starting point".into(),
            ));
        }

        let mut directions: Vec<Array> = (0..n)
            .map(|i| {
                let mut e = Array::zeros(n);
                e[i] = 1.0;
                e
            })
            .collect();

        let mut x_k = x0.clone();
        let mut iterations = 0;

        loop {
            if iterations >= cfg.max_iter {
                return Err(Error::MaxIter("Powell".into()));
            }

            let x0k = x_k.clone();
            let mut x_prev = x0k.clone();
            let mut max_decrease = 0.0;
            let mut i_max = 0;

            for (i, dir) in directions.iter().enumerate() {
                let f_before = f(&x_prev);
                let x_next = line_search_along(f, &x_prev, dir, &cfg.golden)?;
                let f_after = f(&x_next);
                let decrease = f_before - f_after;
                if decrease > max_decrease {
                    max_decrease = decrease;
                    i_max = i;
                }
                x_prev = x_next;
            }

            let v_new = &x_prev - &x0k;
            let x_np1 = line_search_along(f, &x_prev, &v_new, &cfg.golden)?;
            directions[i_max] = v_new;

            let step_size = (&x_np1 - &x_k).norm();
            x_k = x_np1;
            iterations += 1;

            if step_size < cfg.tol {
                let value = f(&x_k);
                return Ok(OptimizationResult {
                    x: x_k,
                    value,
                    iterations,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_on_quadratic_bowl() {
        let target = Array::from_slice(&[0.5, 2.0]);
        let target_for_f = target.clone();
        let f = move |x: &Array| {
            let d = x - &target_for_f;
            d.dot(&d)
        };
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = PowellConfig::default();
        let result = Powell.minimize(&f, &x0, &cfg).unwrap();
        let err = (&result.x - &target).norm();
        assert!(err < 1e-4, "err = {err}, x = {}", result.x);
    }

    #[test]
    fn fails_on_monotone_linear_function() {
        let f = |x: &Array| x[0] + x[1];
        let x0 = Array::from_slice(&[0.0, 0.0]);
        let cfg = PowellConfig {
            max_iter: 20,
            ..PowellConfig::default()
        };
        assert!(matches!(
            Powell.minimize(&f, &x0, &cfg),
            Err(Error::MaxIter(_))
        ));
    }
}
