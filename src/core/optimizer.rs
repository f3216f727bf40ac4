use nalgebra::{storage::StorageMut, Dyn, IsContiguous, Vector};

use super::{domain::Domain, function::Function};

/// Interface of an optimizer.
///
/// An optimizer is an iterative algorithm which takes a point _x_ and computes
/// the next step in the optimization process. Repeated calls to the next step
/// should eventually converge into a minimum _x'_. For a sum of squared
/// residuals, a minimum with zero value is a root of the underlying system.
///
/// ## Implementing an optimizer
///
/// Here is an implementation of a "coordinate halving" optimizer which moves
/// every variable halfway to zero as long as it improves the function value.
///
/// ```rust
/// use resmin::nalgebra as na;
/// use resmin::{Domain, Function, Optimizer};
/// use na::{storage::StorageMut, Dyn, IsContiguous, Vector};
///
/// struct Halving;
///
/// impl<F: Function> Optimizer<F> for Halving {
///     const NAME: &'static str = "Halving";
///     type Error = std::convert::Infallible;
///
///     fn opt_next<Sx>(
///         &mut self,
///         f: &F,
///         dom: &Domain<F::Field>,
///         x: &mut Vector<F::Field, Dyn, Sx>,
///     ) -> Result<F::Field, Self::Error>
///     where
///         Sx: StorageMut<F::Field, Dyn> + IsContiguous,
///     {
///         let mut fx = f.apply(x);
///         let half: F::Field = na::convert(0.5);
///
///         for i in 0..dom.dim() {
///             let xi = x[i];
///             x[i] = xi * half;
///
///             let trial = f.apply(x);
///             if trial < fx {
///                 fx = trial;
///             } else {
///                 x[i] = xi;
///             }
///         }
///
///         // We must return the value in the new point.
///         Ok(fx)
///     }
/// }
/// ```
pub trait Optimizer<F: Function> {
    /// Name of the optimizer.
    const NAME: &'static str;

    /// Error while computing the next step.
    type Error;

    /// Computes the next step in the optimization process.
    ///
    /// The value of `x` is the current point. After the method returns, `x`
    /// should hold the variable values of the performed step and the return
    /// value _must_ be the function value of that step as computed by
    /// [`Function::apply`].
    ///
    /// The implementations _can_ assume that subsequent calls to `opt_next`
    /// pass the value of `x` as was returned in the previous iteration.
    fn opt_next<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous;
}
