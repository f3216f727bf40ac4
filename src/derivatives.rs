//! Tools for derivative-based methods.

use std::ops::Deref;

use nalgebra::{
    storage::{Storage, StorageMut},
    ComplexField as _, DimName, Dyn, IsContiguous, OVector, RealField as _, Vector, U1,
};
use num_traits::{One, Zero};

use crate::core::{Function, Problem, RealField as _};

/// Gradient vector of a function, approximated by forward differences.
#[derive(Debug)]
pub struct Gradient<F: Problem> {
    grad: OVector<F::Field, Dyn>,
}

impl<F: Problem> Gradient<F> {
    /// Initializes the gradient vector with zeros.
    pub fn zeros(f: &F) -> Self {
        let dim = Dyn(f.domain().dim());

        Self {
            grad: OVector::zeros_generic(dim, U1::name()),
        }
    }
}

impl<F: Function> Gradient<F> {
    /// Computes the gradient vector of the function in given point with given
    /// scale of variables. See [`compute`](Gradient::compute) for more details.
    pub fn new<Sx, Sscale>(
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
        scale: &Vector<F::Field, Dyn, Sscale>,
        fx: F::Field,
    ) -> Self
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
        Sscale: Storage<F::Field, Dyn>,
    {
        let mut grad = Self::zeros(f);
        grad.compute(f, x, scale, fx);
        grad
    }

    /// Computes the gradient vector of the function in given point with given
    /// scale of variables.
    ///
    /// The parameter `x` is mutable to allow temporary mutations avoiding
    /// unnecessary allocations, but after this method ends, the content of the
    /// vector is exactly the same as before.
    ///
    /// Information about variable scale is useful for problematic cases of
    /// finite differentiation (e.g., when the value is near zero).
    pub fn compute<Sx, Sscale>(
        &mut self,
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
        scale: &Vector<F::Field, Dyn, Sscale>,
        fx: F::Field,
    ) -> &mut Self
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
        Sscale: Storage<F::Field, Dyn>,
    {
        let eps = F::Field::EPSILON_SQRT;

        for i in 0..self.grad.nrows() {
            let xi = x[i];

            // Compute the step size. We would like to have the step as small as
            // possible (to be as close to the real derivative as possible). But
            // at the same time, very small step could cause f(x + e_i * step_i)
            // ~= f(x) with very small number of good digits.
            //
            // A reasonable way to balance these competing needs is to scale
            // each component by x_i itself. To avoid problems when x_i is close
            // to zero, it is modified to take the typical magnitude instead.
            let magnitude = F::Field::one() / scale[i];
            let step = eps * xi.abs().max(magnitude) * F::Field::one().copysign(xi);
            let step = if step == F::Field::zero() { eps } else { step };

            // Update the point.
            x[i] = xi + step;
            let fxi = f.apply(x);

            // Compute the derivative approximation: grad[i] = (f(x + e_i * step_i) - f(x)) / step_i.
            self.grad[i] = (fxi - fx) / step;

            // Restore the original value.
            x[i] = xi;
        }

        self
    }
}

impl<F: Problem> Deref for Gradient<F> {
    type Target = OVector<F::Field, Dyn>;

    fn deref(&self) -> &Self::Target {
        &self.grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Domain;
    use crate::testing::ExtendedRosenbrock;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    struct MixedVars;

    impl Problem for MixedVars {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(2)
        }
    }

    impl Function for MixedVars {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            // A simple, arbitrary function with mixed terms.
            let x1 = x[0];
            let x2 = x[1];

            x1.powi(2) + x1 * x2 + x2.powi(3)
        }
    }

    #[test]
    fn mixed_vars_gradient() {
        let mut x = dvector![3.0, -3.0];
        let scale = dvector![1.0, 1.0];

        let func = MixedVars;
        let fx = func.apply(&x);
        let grad = Gradient::new(&func, &mut x, &scale, fx);

        let expected = dvector![3.0, 30.0];
        assert_abs_diff_eq!(&*grad, &expected, epsilon = 10e-6);
        assert_eq!(x, dvector![3.0, -3.0]);
    }

    #[test]
    fn rosenbrock_gradient_of_sum_of_squares() {
        let mut x = dvector![2.0, 2.0];
        let scale = dvector![1.0, 1.0];

        // f = (10 (x2 - x1^2))^2 + (1 - x1)^2
        let func = ExtendedRosenbrock::new(2);
        let fx = func.apply(&x);
        let grad = Gradient::new(&func, &mut x, &scale, fx);

        // df/dx1 = -400 x1 (x2 - x1^2) - 2 (1 - x1), df/dx2 = 200 (x2 - x1^2)
        let expected = dvector![1602.0, -400.0];
        assert_abs_diff_eq!(&*grad, &expected, epsilon = 1e-3);
    }
}
