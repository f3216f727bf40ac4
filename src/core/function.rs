use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use super::{base::Problem, system::System};

/// Definition of a function to be minimized.
///
/// Any [`System`] is a function, namely the sum of its squared residuals. Its
/// minimum value is zero and it is attained exactly in the roots of the
/// system, which is what makes minimizers usable as equation solvers.
///
/// ## Defining a function
///
/// A function is any type that implements [`Function`] and [`Problem`] traits.
///
/// ```rust
/// use resmin::nalgebra as na;
/// use resmin::{Domain, Function, Problem};
/// use na::{Dyn, IsContiguous};
///
/// // Objective of x^2 + x - 5 = 0 written by hand.
/// struct Objective;
///
/// impl Problem for Objective {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(1)
///     }
/// }
///
/// impl Function for Objective {
///     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         (x[0].powi(2) + x[0] - 5.0).powi(2)
///     }
/// }
/// ```
pub trait Function: Problem {
    /// Calculates the function value in given point.
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

impl<F> Function for F
where
    F: System,
{
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.norm_squared(x)
    }
}
