//! Line search algorithms shared by the unconstrained minimizers.
//!
//! [`golden`] brackets and contracts a 1D interval without derivatives;
//! [`wolfe`] advances along a descent direction subject to the strong
//! Wolfe conditions, in both a scalar-argument form and a point-threaded
//! form that lets a caller reuse the freshly evaluated `(x, f, ∇f)`.

pub mod golden;
pub mod wolfe;

pub use golden::{bracket, minimize as golden_minimize, GoldenConfig};
pub use wolfe::{strong_wolfe, strong_wolfe_point, LineSearchPoint, WolfeConfig};
