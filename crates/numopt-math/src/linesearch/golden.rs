//! Golden-section bracket and contraction for derivative-free 1D search.
//!
//! `bracket` walks downhill with a geometrically growing step until the
//! function increases again; `minimize` then contracts the resulting
//! interval using the golden ratio for a fixed, precomputed number of
//! iterations.

use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Configuration for [`bracket`] and [`minimize`].
#[derive(Debug, Clone, Copy)]
pub struct GoldenConfig {
    /// Initial step used by `bracket`.
    pub h: Real,
    /// Target interval width for `minimize`.
    pub tol: Real,
    /// Maximum number of geometric extensions `bracket` will try.
    pub max_iter: usize,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            h: 0.1,
            tol: 1e-10,
            max_iter: 100,
        }
    }
}

const PHI: Real = 1.618_033_988_749_895; // (1 + √5) / 2
const GOLDEN_R: Real = 0.618_033_988_749_895; // (√5 - 1) / 2

/// Find an interval `(a, b)` bracketing a local minimum of `f`, starting
/// from `x1` and extending downhill with step `φ·h` at each try.
///
/// Fails with [`Error::MaxIter`] if no increase is observed within
/// `cfg.max_iter` extensions.
pub fn bracket<F: Fn(Real) -> Real>(f: F, x1: Real, cfg: &GoldenConfig) -> Result<(Real, Real)> {
    if cfg.h <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "golden-section bracket requires h > 0, got {}",
            cfg.h
        )));
    }

    let f1 = f(x1);
    let mut step = cfg.h;
    let mut b = x1 + step;
    let mut fb = f(b);
    if fb > f1 {
        step = -step;
        b = x1 + step;
        fb = f(b);
        if fb > f1 {
            // x1 is a local minimum relative to both directions already.
            return Ok((x1 - cfg.h, x1 + cfg.h));
        }
    }

    let mut a = x1;
    for _ in 0..cfg.max_iter {
        step *= PHI;
        let c = b + step;
        let fc = f(c);
        if fc > fb {
            return Ok(if a < c { (a, c) } else { (c, a) });
        }
        a = b;
        b = c;
        fb = fc;
    }
    Err(Error::MaxIter("golden-section bracket".into()))
}

/// Contract `[a, b]` toward a minimum of `f` using golden-section search,
/// running the exact number of iterations `⌈ln(tol/|b−a|) / ln r⌉`
/// prescribed by the target width `cfg.tol`.
pub fn minimize<F: Fn(Real) -> Real>(
    f: F,
    a: Real,
    b: Real,
    cfg: &GoldenConfig,
) -> Result<(Real, Real)> {
    if cfg.tol <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "golden-section minimize requires tol > 0, got {}",
            cfg.tol
        )));
    }
    let (mut lo, mut hi) = (a.min(b), a.max(b));
    let width = hi - lo;
    if width <= 0.0 {
        return Err(Error::InvalidArgument(
            "golden-section minimize requires a non-degenerate interval".into(),
        ));
    }

    let n_iter = if cfg.tol >= width {
        0
    } else {
        ((cfg.tol / width).ln() / GOLDEN_R.ln()).ceil() as usize
    };

    let mut c = hi - GOLDEN_R * (hi - lo);
    let mut d = lo + GOLDEN_R * (hi - lo);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..n_iter {
        if fc < fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - GOLDEN_R * (hi - lo);
            fc = f(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + GOLDEN_R * (hi - lo);
            fd = f(d);
        }
    }

    Ok(if fc < fd { (c, fc) } else { (d, fd) })
}
