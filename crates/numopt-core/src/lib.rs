//! # numopt-core
//!
//! Core types shared across the `numopt` workspace: the floating-point and
//! size aliases used throughout, the error hierarchy, and the `DataSet`
//! collection abstraction that QR and Levenberg–Marquardt fold over.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod errors;

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// Integer index type used for dataset row identifiers.
pub type Index = i64;
