//! Core abstractions and types for resmin.
//!
//! *Users* are mainly interested in implementing the [`System`] trait (or
//! using the closure adapters in [`objective`](crate::objective)), optionally
//! specifying the [domain](Domain).
//!
//! Algorithms *developers* are interested in implementing the [`Optimizer`]
//! trait and using tools in the [derivatives](crate::derivatives) module.

mod base;
mod domain;
mod function;
mod optimizer;
mod system;

pub use base::*;
pub use domain::*;
pub use function::*;
pub use optimizer::*;
pub use system::*;
