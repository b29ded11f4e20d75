//! Levenberg–Marquardt nonlinear least squares, built on [`crate::qr`].

use crate::array::Array;
use crate::optimize::OptimizationResult;
use crate::qr::{householder_qr, AugmentedRow};
use numopt_core::dataset::{DataSet, VecDataSet};
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// One `(x, y)` observation the regression function is fit against.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Input.
    pub x: Array,
    /// Observed output.
    pub y: Real,
}

impl Observation {
    /// Build an observation.
    pub fn new(x: Array, y: Real) -> Self {
        Self { x, y }
    }
}

/// Configuration for [`levenberg_marquardt`].
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardtConfig {
    /// Stop when `‖δ‖ < tol·(‖p‖+tol)` or `‖r‖ < tol`.
    pub tol: Real,
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// Initial damping parameter.
    pub lambda0: Real,
    /// Factor the damping parameter is multiplied by on a rejected step.
    pub lambda_up: Real,
    /// Factor the damping parameter is divided by on an accepted step.
    pub lambda_down: Real,
    /// Finite-difference step used for the Jacobian when no analytic one
    /// is supplied.
    pub fd_eps: Real,
}

impl Default for LevenbergMarquardtConfig {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            max_iter: 200,
            lambda0: 1e-3,
            lambda_up: 10.0,
            lambda_down: 10.0,
            fd_eps: 1e-7,
        }
    }
}

fn residual<Phi: Fn(&Array, &Array) -> Real>(phi: &Phi, p: &Array, obs: &Observation) -> Real {
    phi(p, &obs.x) - obs.y
}

fn residual_vector<Phi: Fn(&Array, &Array) -> Real>(
    phi: &Phi,
    p: &Array,
    data: &[Observation],
) -> Array {
    Array::from_vec(data.iter().map(|obs| residual(phi, p, obs)).collect())
}

fn finite_difference_row<Phi: Fn(&Array, &Array) -> Real>(
    phi: &Phi,
    p: &Array,
    obs: &Observation,
    eps: Real,
) -> Array {
    let k = p.size();
    let base = phi(p, &obs.x);
    let mut row = vec![0.0; k];
    for j in 0..k {
        let mut p_pert = p.clone();
        p_pert[j] += eps;
        row[j] = (phi(&p_pert, &obs.x) - base) / eps;
    }
    Array::from_vec(row)
}

/// Fit `phi(p, x) ≈ y` over `data` by damped Gauss-Newton, starting from
/// `p0`. `jacobian`, when `Some`, computes `∂φ/∂p` for a row analytically;
/// otherwise it is derived by forward finite differences.
pub fn levenberg_marquardt<Phi, Jac, D>(
    phi: &Phi,
    jacobian: Option<&Jac>,
    data: &D,
    p0: &Array,
    cfg: &LevenbergMarquardtConfig,
) -> Result<OptimizationResult>
where
    Phi: Fn(&Array, &Array) -> Real,
    Jac: Fn(&Array, &Array) -> Array,
    D: DataSet<Observation>,
{
    let k = p0.size();
    if k == 0 {
        return Err(Error::InvalidArgument(
            "Levenberg-Marquardt requires a non-empty parameter vector".into(),
        ));
    }
    let rows = data.collect();
    if rows.len() < k {
        return Err(Error::InvalidArgument(format!(
            "Levenberg-Marquardt requires at least as many observations as parameters (m={} < k={k})",
            rows.len()
        )));
    }

    let mut p = p0.clone();
    let mut r = residual_vector(phi, &p, &rows);
    let mut lambda = cfg.lambda0;

    if r.norm() < cfg.tol {
        let cost = r.dot(&r);
        return Ok(OptimizationResult {
            x: p,
            value: cost,
            iterations: 0,
        });
    }

    for iteration in 0..cfg.max_iter {
        let j_rows: Vec<Array> = rows
            .iter()
            .map(|obs| match jacobian {
                Some(jac) => jac(&p, &obs.x),
                None => finite_difference_row(phi, &p, obs, cfg.fd_eps),
            })
            .collect();

        let mut jtj_diag = vec![0.0; k];
        for row in &j_rows {
            for j in 0..k {
                jtj_diag[j] += row[j] * row[j];
            }
        }
        let damping: Vec<Real> = jtj_diag.iter().map(|&d| (lambda * d).sqrt()).collect();

        let mut augmented = Vec::with_capacity(j_rows.len() + k);
        for (i, row) in j_rows.iter().enumerate() {
            augmented.push(AugmentedRow::new(row.as_slice(), -r[i], i as i64));
        }
        for j in 0..k {
            let mut drow = vec![0.0; k];
            drow[j] = damping[j];
            augmented.push(AugmentedRow::new(&drow, 0.0, (j_rows.len() + j) as i64));
        }
        let augmented_ds = VecDataSet::new(augmented);

        let qr = householder_qr(&augmented_ds, k, false, 1e-12)?;
        let delta = qr.solution;

        if delta.norm() < cfg.tol * (p.norm() + cfg.tol) {
            let cost = r.dot(&r);
            return Ok(OptimizationResult {
                x: p,
                value: cost,
                iterations: iteration + 1,
            });
        }

        let p_trial = &p + &delta;
        let r_trial = residual_vector(phi, &p_trial, &rows);

        if r_trial.norm_squared() < r.norm_squared() {
            p = p_trial;
            r = r_trial;
            lambda /= cfg.lambda_down;

            if r.norm() < cfg.tol {
                let cost = r.dot(&r);
                return Ok(OptimizationResult {
                    x: p,
                    value: cost,
                    iterations: iteration + 1,
                });
            }
        } else {
            lambda *= cfg.lambda_up;
        }
    }

    Err(Error::MaxIter("Levenberg-Marquardt".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential(p: &Array, x: &Array) -> Real {
        p[0] * (p[1] * x[0]).exp()
    }

    #[test]
    fn fits_exponential_regression() {
        let p_star = Array::from_slice(&[2.0, 1.0]);
        let data: Vec<Observation> = (0..10)
            .map(|i| {
                let t = i as Real * 0.2;
                let x = Array::from_slice(&[t]);
                let y = exponential(&p_star, &x);
                Observation::new(x, y)
            })
            .collect();
        let ds = VecDataSet::new(data);

        let p0 = Array::from_slice(&[4.0, 0.5]);
        let cfg = LevenbergMarquardtConfig::default();
        let result =
            levenberg_marquardt::<_, fn(&Array, &Array) -> Array, _>(&exponential, None, &ds, &p0, &cfg)
                .unwrap();

        assert!((result.x[0] - 2.0).abs() < 0.2, "p0 = {}", result.x[0]);
        assert!((result.x[1] - 1.0).abs() < 0.2, "p1 = {}", result.x[1]);
    }

    #[test]
    fn stops_early_when_already_fit() {
        let p_star = Array::from_slice(&[2.0, 1.0]);
        let data: Vec<Observation> = (0..5)
            .map(|i| {
                let t = i as Real * 0.2;
                let x = Array::from_slice(&[t]);
                Observation::new(x.clone(), exponential(&p_star, &x))
            })
            .collect();
        let ds = VecDataSet::new(data);
        let cfg = LevenbergMarquardtConfig {
            tol: 1e-6,
            ..LevenbergMarquardtConfig::default()
        };
        let result = levenberg_marquardt::<_, fn(&Array, &Array) -> Array, _>(
            &exponential,
            None,
            &ds,
            &p_star,
            &cfg,
        )
        .unwrap();
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn rejects_too_few_observations() {
        let data = vec![Observation::new(Array::from_slice(&[0.0]), 1.0)];
        let ds = VecDataSet::new(data);
        let p0 = Array::from_slice(&[1.0, 1.0]);
        let cfg = LevenbergMarquardtConfig::default();
        assert!(matches!(
            levenberg_marquardt::<_, fn(&Array, &Array) -> Array, _>(
                &exponential,
                None,
                &ds,
                &p0,
                &cfg
            ),
            Err(Error::InvalidArgument(_))
        ));
    }
}
