//! Strong-Wolfe line search: bracketing stage plus safeguarded zoom.
//!
//! Follows the two-stage procedure of Nocedal & Wright, Algorithms 3.5
//! and 3.6. Exposed both as a scalar routine (`strong_wolfe`, returning
//! just the accepted step length) and as a point-threaded routine
//! (`strong_wolfe_point`) that returns the already-evaluated
//! `(x, f, ∇f)` so callers such as BFGS never re-evaluate the objective
//! at the accepted point.

use crate::array::Array;
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`strong_wolfe`] / [`strong_wolfe_point`].
#[derive(Debug, Clone, Copy)]
pub struct WolfeConfig {
    /// Maximum number of bracket-stage extensions.
    pub max_iter_line: usize,
    /// Maximum number of zoom-stage iterations.
    pub max_iter_zoom: usize,
    /// Sufficient-decrease (Armijo) constant.
    pub c1: Real,
    /// Curvature constant.
    pub c2: Real,
    /// Step-growth factor used in the bracket stage.
    pub c3: Real,
}

impl Default for WolfeConfig {
    fn default() -> Self {
        Self {
            max_iter_line: 50,
            max_iter_zoom: 50,
            c1: 1e-4,
            c2: 0.9,
            c3: 2.0,
        }
    }
}

/// A point on the objective together with its function value and
/// gradient, threaded through successive line searches so BFGS and the
/// CG family never recompute a quantity the search already has.
#[derive(Debug, Clone)]
pub struct LineSearchPoint {
    /// The point itself.
    pub x: Array,
    /// `f(x)`.
    pub f: Real,
    /// `∇f(x)`.
    pub grad: Array,
}

impl LineSearchPoint {
    /// Evaluate `f` and `grad` at `x` to build the initial point.
    pub fn new<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(f: &F, grad: &G, x: &Array) -> Self {
        let x = x.clone();
        let fv = f(&x);
        let g = grad(&x);
        Self { x, f: fv, grad: g }
    }
}

#[derive(Debug, Clone)]
struct Eval {
    alpha: Real,
    x: Array,
    f: Real,
    g: Array,
    dphi: Real,
}

fn evaluate<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
    f: &F,
    grad: &G,
    x0: &Array,
    d: &Array,
    alpha: Real,
) -> Eval {
    let x = x0 + &(d * alpha);
    let fv = f(&x);
    let g = grad(&x);
    let dphi = g.dot(d);
    Eval {
        alpha,
        x,
        f: fv,
        g,
        dphi,
    }
}

/// Cubic-interpolation minimizer through `(a, fa, fpa)` and two further
/// function values `(b, fb)`, `(c, fc)` (Nocedal & Wright eq. 3.59 form).
fn cubic_min(a: Real, fa: Real, fpa: Real, b: Real, fb: Real, c: Real, fc: Real) -> Option<Real> {
    let db = b - a;
    let dc = c - a;
    let denom = (db * dc).powi(2) * (db - dc);
    if denom == 0.0 {
        return None;
    }
    let coeff_a = (dc.powi(2) * (fb - fa - fpa * db) - db.powi(2) * (fc - fa - fpa * dc)) / denom;
    let coeff_b =
        (-dc.powi(3) * (fb - fa - fpa * db) + db.powi(3) * (fc - fa - fpa * dc)) / denom;
    if coeff_a == 0.0 {
        return None;
    }
    let radical = coeff_b * coeff_b - 3.0 * coeff_a * fpa;
    if radical < 0.0 {
        return None;
    }
    Some(a + (-coeff_b + radical.sqrt()) / (3.0 * coeff_a))
}

/// Quadratic-interpolation minimizer through `(a, fa, fpa)` and `(b, fb)`.
fn quadratic_min(a: Real, fa: Real, fpa: Real, b: Real, fb: Real) -> Option<Real> {
    let db = b - a;
    if db == 0.0 {
        return None;
    }
    let coeff_b = (fb - fa - fpa * db) / (db * db);
    if coeff_b == 0.0 {
        return None;
    }
    Some(a - fpa / (2.0 * coeff_b))
}

fn trial_alpha(lo: &Eval, hi: &Eval, prev: Option<&Eval>) -> Real {
    let a = lo.alpha.min(hi.alpha);
    let b = lo.alpha.max(hi.alpha);
    let lo_safe = a + 0.1 * (b - a);
    let hi_safe = a + 0.9 * (b - a);

    let candidate = match prev {
        Some(p) => cubic_min(lo.alpha, lo.f, lo.dphi, hi.alpha, hi.f, p.alpha, p.f),
        None => quadratic_min(lo.alpha, lo.f, lo.dphi, hi.alpha, hi.f),
    };

    match candidate {
        Some(c) if c.is_finite() && c > lo_safe && c < hi_safe => c,
        _ => 0.5 * (a + b),
    }
}

fn zoom<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
    f: &F,
    grad: &G,
    x0: &Array,
    d: &Array,
    phi0: Real,
    dphi0: Real,
    mut lo: Eval,
    mut hi: Eval,
    cfg: &WolfeConfig,
) -> Result<Eval> {
    let mut prev_trial: Option<Eval> = None;
    for _ in 0..cfg.max_iter_zoom {
        let trial = trial_alpha(&lo, &hi, prev_trial.as_ref());
        let e = evaluate(f, grad, x0, d, trial);

        if e.f > phi0 + cfg.c1 * trial * dphi0 || e.f >= lo.f {
            prev_trial = Some(hi);
            hi = e;
        } else {
            if e.dphi.abs() <= -cfg.c2 * dphi0 {
                return Ok(e);
            }
            if e.dphi * (hi.alpha - lo.alpha) >= 0.0 {
                prev_trial = Some(hi);
                hi = lo.clone();
            } else {
                prev_trial = Some(lo);
            }
            lo = e;
        }
    }
    Err(Error::MaxIter("strong-Wolfe zoom".into()))
}

fn search<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
    f: &F,
    grad: &G,
    x0: &Array,
    d: &Array,
    phi0: Real,
    g0: &Array,
    cfg: &WolfeConfig,
) -> Result<Eval> {
    let dphi0 = g0.dot(d);
    if dphi0 >= 0.0 {
        return Err(Error::Precondition(format!(
            "strong-Wolfe search direction is not a descent direction, dphi0={dphi0}"
        )));
    }

    let mut prev = Eval {
        alpha: 0.0,
        x: x0.clone(),
        f: phi0,
        g: g0.clone(),
        dphi: dphi0,
    };
    let mut alpha = 1.0;

    for iter in 0..cfg.max_iter_line {
        let cur = evaluate(f, grad, x0, d, alpha);

        if cur.f > phi0 + cfg.c1 * alpha * dphi0 || (iter > 0 && cur.f >= prev.f) {
            return zoom(f, grad, x0, d, phi0, dphi0, prev, cur, cfg);
        }
        if cur.dphi.abs() <= -cfg.c2 * dphi0 {
            return Ok(cur);
        }
        if cur.dphi >= 0.0 {
            return zoom(f, grad, x0, d, phi0, dphi0, cur, prev, cfg);
        }

        prev = cur;
        alpha *= cfg.c3;
    }
    Err(Error::MaxIter("strong-Wolfe bracket".into()))
}

/// Find a step length `α` satisfying the strong Wolfe conditions along
/// `d` from `x`, evaluating `f`/`grad` as needed.
pub fn strong_wolfe<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
    f: F,
    grad: G,
    x: &Array,
    d: &Array,
    cfg: &WolfeConfig,
) -> Result<Real> {
    let phi0 = f(x);
    let g0 = grad(x);
    let e = search(&f, &grad, x, d, phi0, &g0, cfg)?;
    Ok(e.alpha)
}

/// Point-threaded strong-Wolfe search: advances `point` along `d`,
/// returning the new point with its function value and gradient already
/// evaluated at the accepted step.
pub fn strong_wolfe_point<F: Fn(&Array) -> Real, G: Fn(&Array) -> Array>(
    f: F,
    grad: G,
    point: &LineSearchPoint,
    d: &Array,
    cfg: &WolfeConfig,
) -> Result<LineSearchPoint> {
    let e = search(&f, &grad, &point.x, d, point.f, &point.grad, cfg)?;
    Ok(LineSearchPoint {
        x: e.x,
        f: e.f,
        grad: e.g,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &Array) -> Real {
        0.5 * x.dot(x)
    }
    fn quadratic_grad(x: &Array) -> Array {
        x.clone()
    }

    #[test]
    fn accepts_step_on_quadratic_bowl() {
        let x = Array::from_slice(&[1.0, 1.0]);
        let d = Array::from_slice(&[-1.0, -1.0]);
        let cfg = WolfeConfig::default();
        let alpha = strong_wolfe(quadratic, quadratic_grad, &x, &d, &cfg).unwrap();
        assert!(alpha > 0.0);
        let x_new = &x + &(&d * alpha);
        assert!(quadratic(&x_new) < quadratic(&x));
    }

    #[test]
    fn point_threaded_matches_scalar_result() {
        let x = Array::from_slice(&[2.0, -1.0]);
        let d = Array::from_slice(&[-2.0, 1.0]);
        let cfg = WolfeConfig::default();
        let point = LineSearchPoint::new(&quadratic, &quadratic_grad, &x);
        let advanced = strong_wolfe_point(quadratic, quadratic_grad, &point, &d, &cfg).unwrap();
        assert!((advanced.f - quadratic(&advanced.x)).abs() < 1e-12);
        assert!(advanced.f <= point.f);
    }

    #[test]
    fn rejects_ascent_direction() {
        let x = Array::from_slice(&[1.0, 1.0]);
        let d = Array::from_slice(&[1.0, 1.0]); // same sign as gradient: ascent
        let cfg = WolfeConfig::default();
        assert!(matches!(
            strong_wolfe(quadratic, quadratic_grad, &x, &d, &cfg),
            Err(Error::Precondition(_))
        ));
    }
}
