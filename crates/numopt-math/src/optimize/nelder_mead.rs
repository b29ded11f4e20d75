//! Nelder–Mead derivative-free simplex minimizer.

use super::{Minimizer, OptimizationResult};
use crate::array::Array;
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`NelderMead`].
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    /// Convergence tolerance on the simplex size.
    pub tol: Real,
    /// Per-dimension iteration budget; the effective cap is
    /// `max_iter * (n + 1)`.
    pub max_iter: usize,
    /// Reflection coefficient.
    pub reflection: Real,
    /// Additional expansion coefficient (applied on top of reflection).
    pub expansion: Real,
    /// Contraction coefficient.
    pub contraction: Real,
    /// Shrink coefficient.
    pub shrink: Real,
    /// Relative initial vertex shift.
    pub rel_delta: Real,
    /// Absolute initial vertex shift, used when a coordinate of `x0` is 0.
    pub abs_delta: Real,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            max_iter: 500,
            reflection: 2.0,
            expansion: 1.0,
            contraction: 0.5,
            shrink: 0.5,
            rel_delta: 0.05,
            abs_delta: 2.5e-4,
        }
    }
}

/// Nelder–Mead simplex minimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NelderMead;

fn sort_by_value(vertices: &mut [Array], values: &mut [Real]) -> Result<()> {
    for &v in values.iter() {
        if v.is_nan() {
            return Err(Error::NumericalBlowup(
                "Nelder-Mead encountered a NaN objective value".into(),
            ));
        }
    }
    let mut idx: Vec<usize> = (0..vertices.len()).collect();
    idx.sort_by(|&a, &b| {
        if values[a] < values[b] {
            std::cmp::Ordering::Less
        } else if values[a] > values[b] {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    let sorted_v: Vec<Array> = idx.iter().map(|&i| vertices[i].clone()).collect();
    let sorted_f: Vec<Real> = idx.iter().map(|&i| values[i]).collect();
    vertices.clone_from_slice(&sorted_v);
    values.clone_from_slice(&sorted_f);
    Ok(())
}

impl Minimizer for NelderMead {
    type Config = NelderMeadConfig;

    fn minimize<F: Fn(&Array) -> Real>(
        &self,
        f: &F,
        x0: &Array,
        cfg: &NelderMeadConfig,
    ) -> Result<OptimizationResult> {
        let n = x0.size();
        if n == 0 {
            return Err(Error::InvalidArgument(
                "Nelder-Mead requires a non-empty starting point".into(),
            ));
        }
        let max_total = cfg.max_iter.saturating_mul(n + 1);

        let mut vertices: Vec<Array> = Vec::with_capacity(n + 1);
        vertices.push(x0.clone());
        for i in 0..n {
            let mut v = x0.clone();
            let shift = if x0[i] != 0.0 {
                x0[i] * cfg.rel_delta
            } else {
                cfg.abs_delta
            };
            v[i] += shift;
            vertices.push(v);
        }
        let mut values: Vec<Real> = vertices.iter().map(f).collect();
        sort_by_value(&mut vertices, &mut values)?;

        let mut iterations = 0;
        loop {
            if iterations >= max_total {
                return Err(Error::MaxIter("Nelder-Mead".into()));
            }

            let vmin = vertices[0].clone();
            let fmin = values[0];
            let vmax = vertices[n].clone();
            let fmax = values[n];

            let mut centroid = Array::zeros(n);
            for v in &vertices[0..n] {
                centroid = &centroid + v;
            }
            centroid = centroid.scale(1.0 / n as Real);

            let m = &centroid - &vmax;
            if m.norm() / ((n + 1) as Real).sqrt() < cfg.tol {
                return Ok(OptimizationResult {
                    x: vmin,
                    value: fmin,
                    iterations,
                });
            }

            let v_r = &vmax + &m.scale(cfg.reflection);
            let f_r = f(&v_r);

            let replacement = if f_r < fmin {
                let v_e = &vmax + &m.scale(cfg.reflection + cfg.expansion);
                let f_e = f(&v_e);
                if f_e < f_r {
                    Some((v_e, f_e))
                } else {
                    Some((v_r, f_r))
                }
            } else if f_r <= fmax {
                Some((v_r, f_r))
            } else {
                let v_c = &vmax + &m.scale(cfg.contraction);
                let f_c = f(&v_c);
                if f_c <= fmax {
                    Some((v_c, f_c))
                } else {
                    None
                }
            };

            match replacement {
                Some((new_v, new_f)) => {
                    vertices[n] = new_v;
                    values[n] = new_f;
                }
                None => {
                    for i in 1..=n {
                        vertices[i] = &vmin + &(&vertices[i] - &vmin).scale(cfg.shrink);
                        values[i] = f(&vertices[i]);
                    }
                }
            }
            sort_by_value(&mut vertices, &mut values)?;
            iterations += 1;
        }
    }
}
