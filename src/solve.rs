//! Solving equations by minimizing the sum of squared residuals.
//!
//! [`solve`] takes a [`System`], starts a minimizer on its sum of squared
//! residuals from the initial guess and reports the point found together with
//! the residuals in it. [`minimize`] does the same for any [`Function`].
//!
//! ```rust
//! use resmin::objective::Equation;
//! use resmin::{solve, SolveOptions, Termination};
//!
//! // x^2 + x - 5 = 0
//! let equation = Equation::new(|x: f64| x.powi(2) + x - 5.0);
//!
//! let solution = solve(&equation, &[2.0], &SolveOptions::default()).unwrap();
//!
//! assert_eq!(solution.termination, Termination::Converged);
//! assert!((solution.x[0] - 1.79128785).abs() < 1e-6);
//! assert!(solution.residuals[0].abs() < 1e-6);
//! ```
//!
//! Every call runs exactly one local minimization. The initial guess decides
//! which root is found when there are more of them, and finding a different
//! root than expected is not an error. When the minimizer does not reach the
//! tolerance, the best point it found is returned anyway and the
//! [`Termination`] status tells why it stopped.

use std::fmt;

use getset::{CopyGetters, Setters};
use log::{debug, info};
use nalgebra::{convert, ComplexField as _, DVector};
use thiserror::Error;

use crate::{
    algo::{
        nelder_mead::NelderMeadError, quasi_newton::QuasiNewtonError, NelderMead, QuasiNewton,
    },
    analysis::residuals_at,
    core::{Domain, Function, Optimizer, RealField, System},
    driver::OptimizerDriver,
};

/// Minimization method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Quasi-Newton BFGS method, see [`QuasiNewton`].
    #[default]
    QuasiNewton,
    /// Nelder-Mead simplex method, see [`NelderMead`].
    NelderMead,
}

/// Options for [`solve`] and [`minimize`].
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct SolveOptions<T: RealField + Copy> {
    /// Minimization method. Default: [`Method::QuasiNewton`].
    method: Method,
    /// The minimization converged when the objective value drops to this
    /// value. Default: `1e-12`.
    tolerance: T,
    /// Maximum number of iterations. Default: `None`, meaning `200 * n` for
    /// `n` unknowns.
    max_iters: Option<usize>,
}

impl<T: RealField + Copy> Default for SolveOptions<T> {
    fn default() -> Self {
        Self {
            method: Method::default(),
            tolerance: convert(1e-12),
            max_iters: None,
        }
    }
}

/// Reason why the minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The objective dropped to the tolerance.
    Converged,
    /// The minimizer cannot make any further progress (vanished gradient,
    /// failed line search or collapsed simplex).
    Stalled,
    /// The iteration budget was exhausted.
    MaxIters,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::Stalled => write!(f, "stalled"),
            Termination::MaxIters => write!(f, "maximum number of iterations reached"),
        }
    }
}

/// Result of [`minimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum<T> {
    /// The best point found.
    pub x: Vec<T>,
    /// Objective value in `x`.
    pub objective: T,
    /// Number of performed iterations.
    pub iters: usize,
    /// Why the minimization stopped.
    pub termination: Termination,
}

/// Result of [`solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    /// The approximate root.
    pub x: Vec<T>,
    /// Residuals of the system evaluated in `x` itself.
    pub residuals: Vec<T>,
    /// Sum of squared residuals in `x`.
    pub objective: T,
    /// Number of performed iterations.
    pub iters: usize,
    /// Why the minimization stopped.
    pub termination: Termination,
}

/// Error returned from [`solve`] and [`minimize`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    /// Initial guess has different length than the number of unknowns.
    #[error("initial guess has {actual} components, but the problem has {expected} unknowns")]
    InvalidDimensionality {
        /// Number of unknowns of the problem.
        expected: usize,
        /// Length of the initial guess.
        actual: usize,
    },
    /// The residuals are undefined (NaN or infinite) where the minimizer
    /// needed them.
    #[error("residuals are undefined")]
    UndefinedResiduals,
}

/// Errors of minimizers distinguish between stalling and being unable to
/// evaluate the objective at all.
trait MinimizerError: fmt::Display {
    fn is_undefined_value(&self) -> bool;
}

impl MinimizerError for QuasiNewtonError {
    fn is_undefined_value(&self) -> bool {
        matches!(self, QuasiNewtonError::InvalidValue)
    }
}

impl MinimizerError for NelderMeadError {
    fn is_undefined_value(&self) -> bool {
        matches!(self, NelderMeadError::SimplexInvalid)
    }
}

/// Minimizes the function starting from the initial guess `x0`.
pub fn minimize<F: Function>(
    f: &F,
    x0: &[F::Field],
    options: &SolveOptions<F::Field>,
) -> Result<Minimum<F::Field>, SolveError> {
    let dim = f.domain().dim();

    if x0.len() != dim {
        return Err(SolveError::InvalidDimensionality {
            expected: dim,
            actual: x0.len(),
        });
    }

    let max_iters = options.max_iters.unwrap_or(200 * dim);

    match options.method {
        Method::QuasiNewton => run(f, x0, QuasiNewton::new, options.tolerance, max_iters),
        Method::NelderMead => run(f, x0, NelderMead::new, options.tolerance, max_iters),
    }
}

/// Solves the system by minimizing the sum of its squared residuals,
/// starting from the initial guess `x0`.
///
/// The returned residuals are evaluated in the returned point, so they are
/// the authoritative check of the result.
pub fn solve<R: System>(
    r: &R,
    x0: &[R::Field],
    options: &SolveOptions<R::Field>,
) -> Result<Solution<R::Field>, SolveError> {
    let Minimum {
        x,
        objective,
        iters,
        termination,
    } = minimize(r, x0, options)?;

    let residuals = residuals_at(r, &x);

    Ok(Solution {
        x,
        residuals,
        objective,
        iters,
        termination,
    })
}

fn run<F, A, FA>(
    f: &F,
    x0: &[F::Field],
    factory: FA,
    tolerance: F::Field,
    max_iters: usize,
) -> Result<Minimum<F::Field>, SolveError>
where
    F: Function,
    A: Optimizer<F>,
    A::Error: MinimizerError,
    FA: FnOnce(&F, &Domain<F::Field>) -> A,
{
    let mut driver = OptimizerDriver::builder(f)
        .with_initial(x0.to_vec())
        .with_algo(factory)
        .build();

    let termination = loop {
        if driver.iters() >= max_iters {
            break Termination::MaxIters;
        }

        match driver.next() {
            Ok((_, fx)) => {
                if fx <= tolerance {
                    break Termination::Converged;
                }
            }
            Err(error) if error.is_undefined_value() => {
                debug!("{} cannot evaluate the objective: {}", A::NAME, error);
                return Err(SolveError::UndefinedResiduals);
            }
            Err(error) => {
                debug!("{} stopped: {}", A::NAME, error);
                break Termination::Stalled;
            }
        }
    };

    let x = driver.x().to_vec();
    let iters = driver.iters();
    let objective = f.apply(&DVector::from_column_slice(&x));

    if !objective.is_finite() {
        return Err(SolveError::UndefinedResiduals);
    }

    // A minimizer started in the minimum stalls right away.
    let termination = if termination == Termination::Stalled && objective <= tolerance {
        Termination::Converged
    } else {
        termination
    };

    info!(
        "{} {} after {} iterations, objective = {}",
        A::NAME,
        termination,
        iters,
        objective
    );

    Ok(Minimum {
        x,
        objective,
        iters,
        termination,
    })
}
