//! Turning residuals into an objective function.
//!
//! An equation `lhs = rhs` is solved by rewriting it as the residual
//! `lhs - rhs = 0` and minimizing the square of the residual. A system of
//! equations is solved the same way, the objective being the sum of squared
//! residuals of all equations. The objective is non-negative and it is zero
//! exactly in the roots, so any minimum with zero value is a solution.
//!
//! This module offers the transformation in two flavors. The
//! [`sum_of_squares`] higher-order function works on plain closures, and the
//! [`Equation`] and [`Residuals`] adapters turn closures into a [`System`],
//! which in turn is a [`Function`](crate::core::Function) that minimizers
//! accept.
//!
//! ```rust
//! use resmin::objective::{sum_of_squares, Residuals};
//! use resmin::Function;
//! use resmin::nalgebra::dvector;
//!
//! let residuals = |x: &[f64]| [x[0] + 2.0 * x[1], x[0] - x[1] - 3.0];
//!
//! let objective = sum_of_squares(residuals);
//! assert_eq!(objective(&[2.0, -1.0]), 0.0);
//!
//! let system = Residuals::new(residuals);
//! assert_eq!(system.apply(&dvector![0.0, 0.0]), objective(&[0.0, 0.0]));
//! ```

use std::marker::PhantomData;

use nalgebra::{
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, Vector,
};

use crate::core::{Domain, Problem, RealField, System};

/// Builds the sum-of-squares objective from a residual function.
///
/// The residual function maps the vector of unknowns to the residuals of all
/// equations. Non-finite residuals make the objective non-finite; minimizers
/// treat such values as infinitely bad.
pub fn sum_of_squares<T, R, I>(residuals: R) -> impl Fn(&[T]) -> T
where
    T: RealField + Copy,
    R: Fn(&[T]) -> I,
    I: IntoIterator<Item = T>,
{
    move |x: &[T]| {
        residuals(x)
            .into_iter()
            .fold(T::zero(), |acc, r| acc + r * r)
    }
}

/// Single equation in one unknown, given by its residual.
pub struct Equation<T, R> {
    residual: R,
    _field: PhantomData<T>,
}

impl<T, R> Equation<T, R>
where
    T: RealField + Copy,
    R: Fn(T) -> T,
{
    /// Wraps the residual of an equation.
    pub fn new(residual: R) -> Self {
        Self {
            residual,
            _field: PhantomData,
        }
    }

    /// Value of the residual in given point.
    pub fn residual(&self, x: T) -> T {
        (self.residual)(x)
    }

    /// Value of the objective (squared residual) in given point.
    pub fn objective(&self, x: T) -> T {
        let r = self.residual(x);
        r * r
    }
}

impl<T, R> Problem for Equation<T, R>
where
    T: RealField + Copy,
    R: Fn(T) -> T,
{
    type Field = T;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(1)
    }
}

impl<T, R> System for Equation<T, R>
where
    T: RealField + Copy,
    R: Fn(T) -> T,
{
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        rx[0] = self.residual(x[0]);
    }

    fn norm_squared<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.objective(x[0])
    }
}

/// System of `N` equations, given by a closure returning all residuals at
/// once.
///
/// The number of unknowns equals the number of equations.
pub struct Residuals<T, R, const N: usize> {
    residuals: R,
    _field: PhantomData<T>,
}

impl<T, R, const N: usize> Residuals<T, R, N>
where
    T: RealField + Copy,
    R: Fn(&[T]) -> [T; N],
{
    /// Wraps the residuals of a system.
    pub fn new(residuals: R) -> Self {
        Self {
            residuals,
            _field: PhantomData,
        }
    }

    /// Values of the residuals in given point.
    pub fn residuals(&self, x: &[T]) -> [T; N] {
        (self.residuals)(x)
    }

    /// Value of the objective (sum of squared residuals) in given point.
    pub fn objective(&self, x: &[T]) -> T {
        self.residuals(x)
            .iter()
            .fold(T::zero(), |acc, r| acc + *r * *r)
    }
}

impl<T, R, const N: usize> Problem for Residuals<T, R, N>
where
    T: RealField + Copy,
    R: Fn(&[T]) -> [T; N],
{
    type Field = T;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(N)
    }
}

impl<T, R, const N: usize> System for Residuals<T, R, N>
where
    T: RealField + Copy,
    R: Fn(&[T]) -> [T; N],
{
    fn eval<Sx, Srx>(&self, x: &Vector<Self::Field, Dyn, Sx>, rx: &mut Vector<Self::Field, Dyn, Srx>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>,
    {
        let values = self.residuals(x.as_slice());
        rx.iter_mut()
            .zip(values.iter())
            .for_each(|(ri, vi)| *ri = *vi);
    }

    fn norm_squared<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.objective(x.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::analysis::linspace;
    use crate::core::Function;

    #[test]
    fn objective_is_non_negative() {
        let equation = Equation::new(|x: f64| x.powi(2) + x - 5.0);

        for x in linspace(-4.0, 3.0, 50) {
            assert!(equation.objective(x) >= 0.0);
            assert_eq!(equation.apply(&dvector![x]), equation.objective(x));
        }
    }

    #[test]
    fn objective_is_zero_in_exact_root() {
        let equation = Equation::new(|x: f64| x * x - 4.0);
        assert_eq!(equation.objective(2.0), 0.0);
        assert_eq!(equation.objective(-2.0), 0.0);
        assert_eq!(equation.objective(1.0), 9.0);

        let system = Residuals::new(|x: &[f64]| [x[0] + 2.0 * x[1], x[0] - x[1] - 3.0]);
        assert_eq!(system.objective(&[2.0, -1.0]), 0.0);
        assert_eq!(system.apply(&dvector![2.0, -1.0]), 0.0);
    }

    #[test]
    fn adapters_match_sum_of_squares() {
        let residuals = |x: &[f64]| [x[0].powi(2) + x[1].powi(2) - 4.0, x[0] * x[1] + 1.0];
        let objective = sum_of_squares(residuals);
        let system = Residuals::new(residuals);

        for (x0, x1) in [(1.0, 2.0), (-0.5, 3.0), (0.0, 0.0)] {
            let x = dvector![x0, x1];
            assert_abs_diff_eq!(system.apply(&x), objective(&[x0, x1]), epsilon = 1e-12);

            // The overridden sum must agree with the default one going
            // through eval.
            let mut rx = dvector![0.0, 0.0];
            system.eval(&x, &mut rx);
            assert_abs_diff_eq!(system.norm_squared(&x), rx.norm_squared(), epsilon = 1e-12);
        }
    }

    #[test]
    fn sum_of_squares_accepts_vectors() {
        let objective = sum_of_squares(|x: &[f64]| x.iter().map(|xi| xi - 1.0).collect::<Vec<_>>());

        assert_eq!(objective(&[1.0, 1.0, 1.0]), 0.0);
        assert_eq!(objective(&[3.0, 0.0, 1.0]), 5.0);
    }

    #[test]
    fn dimensions_of_adapters() {
        let equation = Equation::new(|x: f64| x);
        let system = Residuals::new(|x: &[f64]| [x[0], x[1], x[2]]);

        assert_eq!(equation.domain().dim(), 1);
        assert_eq!(system.domain().dim(), 3);
    }

    #[test]
    fn undefined_residual_gives_non_finite_objective() {
        let system = Residuals::new(|x: &[f64]| [x[0] + 2.0 * x[1], x[0].sin() / x[1]]);
        assert!(!system.objective(&[1.0, 0.0]).is_finite());
    }
}
