//! # numopt
//!
//! A library of numerical optimization algorithms: dense linear algebra,
//! line searches, unconstrained minimizers, Levenberg–Marquardt nonlinear
//! least squares, and a two-phase simplex LP solver.
//!
//! This crate is a **façade** that re-exports the underlying workspace
//! crates. Application code should depend on this crate rather than on
//! `numopt-core`/`numopt-math` directly.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! numopt = "0.1"
//! ```
//!
//! ```rust
//! use numopt::math::array::Array;
//! use numopt::math::optimize::{nelder_mead::{NelderMead, NelderMeadConfig}, Minimizer};
//!
//! let target = Array::from_slice(&[0.5, 2.0]);
//! let f = move |x: &Array| {
//!     let d = x - &target;
//!     d.dot(&d)
//! };
//! let x0 = Array::from_slice(&[0.0, 0.0]);
//! let result = NelderMead.minimize(&f, &x0, &NelderMeadConfig::default()).unwrap();
//! assert!(result.x.size() == 2);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Error taxonomy, the `DataSet` abstraction, and the `Real` alias shared
/// by every solver.
pub use numopt_core as core;

/// Dense linear algebra, line searches, unconstrained minimizers,
/// Levenberg–Marquardt, and the simplex LP solver.
pub use numopt_math as math;
