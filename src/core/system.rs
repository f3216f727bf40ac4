use nalgebra::{
    storage::{Storage, StorageMut},
    ComplexField as _, Dyn, IsContiguous, Vector,
};

use super::base::Problem;

/// Definition of a system of equations in residual form.
///
/// Every equation `lhs = rhs` is rewritten as `lhs - rhs = 0` and its
/// left-hand side is the residual. A point is a root when all residuals are
/// zero.
///
/// ## Defining a system
///
/// A system is any type that implements [`System`] and [`Problem`] traits.
///
/// ```rust
/// use resmin::nalgebra as na;
/// use resmin::{Domain, Problem, System};
/// use na::{Dyn, IsContiguous};
///
/// // x0 + 2 x1 = 0
/// // sin(x0) / x1 = 0
/// struct SineRatio;
///
/// impl Problem for SineRatio {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(2)
///     }
/// }
///
/// impl System for SineRatio {
///     fn eval<Sx, Srx>(
///         &self,
///         x: &na::Vector<Self::Field, Dyn, Sx>,
///         rx: &mut na::Vector<Self::Field, Dyn, Srx>,
///     ) where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///         Srx: na::storage::StorageMut<Self::Field, Dyn>,
///     {
///         // Compute the residuals of all equations.
///         rx[0] = x[0] + 2.0 * x[1];
///         rx[1] = x[0].sin() / x[1];
///     }
/// }
/// ```
pub trait System: Problem {
    /// Calculates the system residuals in given point.
    fn eval<Sx, Srx>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        rx: &mut Vector<Self::Field, Dyn, Srx>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Srx: StorageMut<Self::Field, Dyn>;

    /// Calculates the sum of squared residuals.
    ///
    /// The default implementation allocates a temporary vector for the
    /// residuals on every call. Minimizers call this method in every function
    /// evaluation, so consider overriding it to avoid the allocation.
    fn norm_squared<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let mut rx = x.clone_owned();
        self.eval(x, &mut rx);
        rx.norm_squared()
    }

    /// Calculates the norm of the residuals vector.
    fn norm<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.norm_squared(x).sqrt()
    }
}
