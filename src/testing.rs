//! Testing systems and utilities useful for benchmarking, debugging and smoke
//! testing.
//!
//! [`ExtendedRosenbrock`] and [`Sphere`] are recommended for first tests of a
//! minimizer. [`Quadratic`], [`SineRatio`] and [`Quadrics`] are small
//! textbook equations whose roots are known, and [`SineRatio`] additionally
//! has residuals undefined on a whole line.
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)
//!
//! \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
//! Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)

use std::error::Error as StdError;

use nalgebra::{
    dvector,
    storage::{Storage, StorageMut},
    ComplexField as _, DVector, Dyn, IsContiguous, OVector, Vector,
};
use thiserror::Error;

use crate::core::{Domain, Function, Optimizer, Problem, System};

/// Extension of the [`Problem`] trait that provides additional information
/// that is useful for testing minimizers.
pub trait TestProblem: Problem {
    /// Standard initial values for the problem. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>>;
}

/// Extension of the [`System`] trait that provides additional information that
/// is useful for testing minimizers on equations.
pub trait TestSystem: System + TestProblem {
    /// A set of roots (if known and finite). This is mostly just for
    /// information, for example to know how close a minimizer got even if it
    /// failed. For testing if a given point is root, [`TestSystem::is_root`]
    /// should be used.
    fn roots(&self) -> Vec<OVector<Self::Field, Dyn>> {
        Vec::new()
    }

    /// Test if given point is a root of the system, given the tolerance `eps`.
    fn is_root<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let norm = self.norm(x);
        norm.is_finite() && norm <= eps
    }
}

/// [Extended Rosenbrock
/// function](https://en.wikipedia.org/wiki/Rosenbrock_function) \[1,2\] (also
/// known as Rosenbrock's valley or banana function).
///
/// The global minimum is inside a long, narrow, parabolic shaped flat valley.
/// The challenge is to find the solution inside the valley.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedRosenbrock {
    n: usize,
}

impl ExtendedRosenbrock {
    /// Initializes the system with given dimension.
    ///
    /// The dimension **must** be a multiple of 2.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        assert!(n % 2 == 0, "n must be a multiple of 2");
        Self { n }
    }

    fn residuals<'a, Sx>(&self, x: &'a Vector<f64, Dyn, Sx>) -> impl Iterator<Item = f64> + 'a
    where
        Sx: Storage<f64, Dyn> + IsContiguous,
    {
        (0..self.n).map(move |i| {
            if i % 2 == 0 {
                10.0 * (x[i + 1] - x[i].powi(2))
            } else {
                1.0 - x[i - 1]
            }
        })
    }
}

impl Default for ExtendedRosenbrock {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for ExtendedRosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl System for ExtendedRosenbrock {
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        eval(self.residuals(x), rx)
    }

    fn norm_squared<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        norm_squared(self.residuals(x))
    }
}

impl TestProblem for ExtendedRosenbrock {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let init1 = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { -1.2 } else { 1.0 }),
        );

        let init2 = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { 6.39 } else { -0.221 }),
        );

        vec![init1, init2]
    }
}

impl TestSystem for ExtendedRosenbrock {
    fn roots(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![DVector::from_element(self.n, 1.0)]
    }
}

/// Sphere function, the residuals being the variables themselves.
///
/// The simplest possible problem. Its sum of squares is the sphere function
/// \[1\] with the single root in the origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    n: usize,
}

impl Sphere {
    /// Initializes the system with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self { n }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Sphere {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl System for Sphere {
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        rx.copy_from(x);
    }

    fn norm_squared<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.norm_squared()
    }
}

impl TestProblem for Sphere {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let init = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { 10.0 } else { -10.0 }),
        );

        vec![init]
    }
}

impl TestSystem for Sphere {
    fn roots(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![DVector::from_element(self.n, 0.0)]
    }
}

/// Quadratic equation `x^2 + x - 5 = 0`.
///
/// It has two roots, `(-1 +- sqrt(21)) / 2`, and the initial guess decides
/// which of them a local minimizer finds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl Quadratic {
    /// Initializes the equation.
    pub fn new() -> Self {
        Self
    }
}

impl Problem for Quadratic {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(1)
    }
}

impl System for Quadratic {
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        rx[0] = x[0].powi(2) + x[0] - 5.0;
    }
}

impl TestProblem for Quadratic {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![2.0], dvector![-3.0]]
    }
}

impl TestSystem for Quadratic {
    fn roots(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let d = 21f64.sqrt();
        vec![dvector![0.5 * (d - 1.0)], dvector![-0.5 * (d + 1.0)]]
    }
}

/// System `x0 + 2 x1 = 0`, `sin(x0) / x1 = 0`.
///
/// The second residual is undefined for `x1 = 0`. The roots are
/// `(k pi, -k pi / 2)` for any nonzero integer `k`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SineRatio;

impl SineRatio {
    /// Initializes the system.
    pub fn new() -> Self {
        Self
    }
}

impl Problem for SineRatio {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(2)
    }
}

impl System for SineRatio {
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        rx[0] = x[0] + 2.0 * x[1];
        rx[1] = x[0].sin() / x[1];
    }
}

impl TestProblem for SineRatio {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![1.0, 2.0]]
    }
}

impl TestSystem for SineRatio {
    fn roots(&self) -> Vec<OVector<Self::Field, Dyn>> {
        use std::f64::consts::{FRAC_PI_2, PI};

        vec![dvector![-PI, FRAC_PI_2], dvector![PI, -FRAC_PI_2]]
    }
}

/// System of three quadrics `x^2 + y^2 = 4`, `xy + yz = -1`, `y^2 + z^2 = 2`.
///
/// All residuals are invariant under `(x, y, z) -> (-x, -y, -z)`, so the
/// roots come in pairs of opposite points.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadrics;

impl Quadrics {
    /// Initializes the system.
    pub fn new() -> Self {
        Self
    }
}

impl Problem for Quadrics {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(3)
    }
}

impl System for Quadrics {
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        rx[0] = x[0].powi(2) + x[1].powi(2) - 4.0;
        rx[1] = x[0] * x[1] + x[1] * x[2] + 1.0;
        rx[2] = x[1].powi(2) + x[2].powi(2) - 2.0;
    }
}

impl TestProblem for Quadrics {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![1.0, 2.0, 1.0]]
    }
}

impl TestSystem for Quadrics {
    fn roots(&self) -> Vec<OVector<Self::Field, Dyn>> {
        // Known to eight decimal places.
        vec![
            dvector![1.60890092, -1.18803949, -0.76717806],
            dvector![-1.60890092, 1.18803949, 0.76717806],
        ]
    }
}

/// Minimization error of the testing driver (see [`optimize`]).
#[derive(Debug, Error)]
pub enum TestingError<E: StdError + 'static> {
    /// Error of the minimizer used.
    #[error("{0}")]
    Inner(#[from] E),
    /// Minimizer did not terminate.
    #[error("minimizer did not terminate")]
    Termination,
}

/// A simple minimizer driver that can be used in tests.
///
/// The iteration stops successfully once the objective value drops to
/// `tolerance`. All objectives built from residuals have zero minimum.
pub fn optimize<F: Function, O: Optimizer<F>>(
    f: &F,
    dom: &Domain<F::Field>,
    mut optimizer: O,
    mut x: OVector<F::Field, Dyn>,
    max_iters: usize,
    tolerance: F::Field,
) -> Result<OVector<F::Field, Dyn>, TestingError<O::Error>>
where
    O::Error: StdError,
{
    let mut iter = 0;

    loop {
        let fx = optimizer.opt_next(f, dom, &mut x)?;

        if fx <= tolerance {
            // Converged.
            return Ok(x);
        }

        if iter == max_iters {
            return Err(TestingError::Termination);
        } else {
            iter += 1;
        }
    }
}

fn eval<Srx>(residuals: impl Iterator<Item = f64>, rx: &mut Vector<f64, Dyn, Srx>)
where
    Srx: StorageMut<f64, Dyn>,
{
    rx.iter_mut().zip(residuals).for_each(|(rxi, v)| *rxi = v);
}

fn norm_squared(residuals: impl Iterator<Item = f64>) -> f64 {
    residuals.map(|v| v.powi(2)).sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roots_are_roots() {
        fn check<R: TestSystem<Field = f64>>(r: &R, eps: f64) {
            for root in r.roots() {
                assert!(r.is_root(&root, eps), "{:?}", root.as_slice());
            }
        }

        check(&ExtendedRosenbrock::new(4), 1e-12);
        check(&Sphere::new(3), 1e-12);
        check(&Quadratic::new(), 1e-12);
        check(&SineRatio::new(), 1e-12);
        check(&Quadrics::new(), 1e-7);
    }

    #[test]
    fn initials_match_dimension() {
        assert!(ExtendedRosenbrock::new(4)
            .initials()
            .iter()
            .all(|x| x.nrows() == 4));
        assert!(Sphere::new(3).initials().iter().all(|x| x.nrows() == 3));
        assert!(Quadrics::new().initials().iter().all(|x| x.nrows() == 3));
    }

    #[test]
    fn undefined_residual_is_not_root() {
        let r = SineRatio::new();
        assert!(!r.is_root(&dvector![0.0, 0.0], 1e-6));
    }
}
