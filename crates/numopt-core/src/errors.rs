//! Error taxonomy shared by every solver in the workspace.
//!
//! A single `thiserror`-derived enum surfaces every failure a numerical
//! kernel can report. Numerical kernels never recover internally — they
//! return the first error up the call chain, so the user sees exactly one
//! error per solver invocation. `ensure!`/`ensure_post!`/`fail!` are the
//! precondition/postcondition/unconditional-failure macros used at the
//! boundary of every public entry point.

use thiserror::Error;

/// The top-level error type used throughout the `numopt` workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Dimension mismatch, negative tolerance, empty data set, or similar.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Outer or inner iteration cap reached without convergence.
    #[error("maximum iterations reached: {0}")]
    MaxIter(String),

    /// QR found a pivot below the rank threshold.
    #[error("rank deficient: {0}")]
    RankDeficient(String),

    /// LP phase-1 optimum is strictly positive: no feasible point exists.
    #[error("infeasible")]
    Infeasible,

    /// LP pivot selection found no finite ratio: the objective is unbounded.
    #[error("unbounded")]
    Unbounded,

    /// A constraint claimed linear does not fit an affine probe.
    #[error("constraint is not linear: {0}")]
    NonLinearConstraint(String),

    /// NaN or infinity encountered in an inner step.
    #[error("numerical blowup: {0}")]
    NumericalBlowup(String),
}

/// Shorthand `Result` type used throughout the `numopt` workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use numopt_core::{ensure, errors::Error};
/// fn positive(x: f64) -> numopt_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use numopt_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> numopt_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use numopt_core::{fail, errors::Error};
/// fn always_err() -> numopt_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(Error::Infeasible.to_string(), "infeasible");
        assert_eq!(Error::Unbounded.to_string(), "unbounded");
        assert_eq!(
            Error::MaxIter("zoom".into()).to_string(),
            "maximum iterations reached: zoom"
        );
    }

    #[test]
    fn index_out_of_range_fields() {
        let e = Error::IndexOutOfRange { index: 5, size: 3 };
        assert_eq!(e.to_string(), "index (5) out of range [0, 3)");
    }
}
