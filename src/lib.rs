#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # Resmin
//!
//! Solving nonlinear equations and systems of equations by minimizing the sum
//! of squared residuals.
//!
//! Every equation `lhs = rhs` can be rewritten into the residual form
//! `lhs - rhs = 0`. The sum of squares of all residuals is a non-negative
//! function that is zero exactly in the roots of the system. Finding a root
//! is therefore the same as finding a minimum with zero value, and any
//! unconstrained minimizer can do that.
//!
//! ## Problem
//!
//! Mathematically, the problem is formulated as
//!
//! ```text
//! S(x) = r1(x)^2 + ... + rn(x)^2 -> min,
//!
//! where r(x) = { r1(x), ..., rn(x) } are the residuals
//! and x = { x1, ..., xn }
//! ```
//!
//! The minimizer is local. The initial guess decides which root is found when
//! there are more of them, and a minimum with nonzero value means that the
//! minimizer got stuck away from any root.
//!
//! Simple problems are written as closures, see
//! [`objective`](crate::objective).
//!
//! ```rust
//! use resmin::objective::Residuals;
//! use resmin::{solve, SolveOptions};
//!
//! // x0 + 2 x1 = 0
//! // sin(x0) / x1 = 0
//! let r = Residuals::new(|x: &[f64]| [x[0] + 2.0 * x[1], x[0].sin() / x[1]]);
//!
//! let solution = solve(&r, &[1.0, 2.0], &SolveOptions::default()).unwrap();
//!
//! assert!(solution.residuals.iter().all(|ri| ri.abs() < 1e-5));
//! ```
//!
//! Otherwise, the problem is any type that implements the [`System`] and
//! [`Problem`] traits.
//!
//! ```rust
//! // Resmin is based on `nalgebra` crate.
//! use resmin::nalgebra as na;
//! use resmin::{Domain, Problem, System};
//! use na::{Dyn, IsContiguous};
//!
//! // x^2 + y^2 = 4
//! // x y + y z = -1
//! // y^2 + z^2 = 2
//! struct Quadrics;
//!
//! impl Problem for Quadrics {
//!     // The numeric type. Usually f64 or f32.
//!     type Field = f64;
//!
//!     // Specification for the domain. At the very least, the dimension
//!     // must be known.
//!     fn domain(&self) -> Domain<Self::Field> {
//!         Domain::unconstrained(3)
//!     }
//! }
//!
//! impl System for Quadrics {
//!     // Evaluate the residuals in given point.
//!     fn eval<Sx, Srx>(
//!         &self,
//!         x: &na::Vector<Self::Field, Dyn, Sx>,
//!         rx: &mut na::Vector<Self::Field, Dyn, Srx>,
//!     ) where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!         Srx: na::storage::StorageMut<Self::Field, Dyn>,
//!     {
//!         rx[0] = x[0].powi(2) + x[1].powi(2) - 4.0;
//!         rx[1] = x[0] * x[1] + x[1] * x[2] + 1.0;
//!         rx[2] = x[1].powi(2) + x[2].powi(2) - 2.0;
//!     }
//! }
//! ```
//!
//! There is no need for defining the gradient. The default quasi-Newton
//! minimizer approximates it by [finite
//! differences](https://en.wikipedia.org/wiki/Finite_difference_method) and
//! the Nelder-Mead minimizer is derivative-free by definition.
//!
//! ## Solving
//!
//! [`solve`] runs the minimization and evaluates the residuals in the found
//! point. These are the authoritative check of the result.
//!
//! ```rust
//! # use resmin::nalgebra as na;
//! # use resmin::{Domain, Problem, System};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Quadrics;
//! #
//! # impl Problem for Quadrics {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(3)
//! #     }
//! # }
//! #
//! # impl System for Quadrics {
//! #     fn eval<Sx, Srx>(
//! #         &self,
//! #         x: &na::Vector<Self::Field, Dyn, Sx>,
//! #         rx: &mut na::Vector<Self::Field, Dyn, Srx>,
//! #     ) where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #         Srx: na::storage::StorageMut<Self::Field, Dyn>,
//! #     {
//! #         rx[0] = x[0].powi(2) + x[1].powi(2) - 4.0;
//! #         rx[1] = x[0] * x[1] + x[1] * x[2] + 1.0;
//! #         rx[2] = x[1].powi(2) + x[2].powi(2) - 2.0;
//! #     }
//! # }
//! use resmin::{solve, Method, SolveOptions, Termination};
//!
//! let mut options = SolveOptions::default();
//! options.set_method(Method::QuasiNewton).set_tolerance(1e-12);
//!
//! let solution = solve(&Quadrics, &[1.0, 2.0, 1.0], &options).expect("residuals are defined");
//!
//! match solution.termination {
//!     Termination::Converged => println!("solved: {:?}", solution.x),
//!     other => println!("{}: best effort {:?}", other, solution.x),
//! }
//! ```
//!
//! For full control over the iteration process, use the [`OptimizerDriver`].
//!
//! ## Algorithms
//!
//! * [Quasi-Newton](algo::quasi_newton) -- BFGS method with a line search.
//!   Default and recommended.
//! * [Nelder-Mead](algo::nelder_mead) -- Derivative-free simplex method. May be
//!   useful for objectives with ill-defined gradient.
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
pub mod analysis;
mod core;
pub mod derivatives;
pub mod driver;
pub mod objective;
#[cfg(feature = "plot")]
pub mod plot;
pub mod solve;

pub use core::*;
pub use driver::OptimizerDriver;
pub use solve::{minimize, solve, Method, Minimum, Solution, SolveError, SolveOptions, Termination};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(all(test, not(feature = "testing")))]
pub(crate) mod testing;

pub use nalgebra;
