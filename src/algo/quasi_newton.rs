//! Quasi-Newton (BFGS) minimization method.
//!
//! [BFGS](https://en.wikipedia.org/wiki/Broyden%E2%80%93Fletcher%E2%80%93Goldfarb%E2%80%93Shanno_algorithm)
//! keeps an approximation of the inverse Hessian matrix that is refined
//! after every step from the change of the gradient. The search direction is
//! the quasi-Newton direction _-H g_ and the step length along it is found by
//! a line search satisfying the strong Wolfe conditions.
//!
//! The gradient is approximated by forward differences, so only the function
//! values are needed. This is the general-purpose minimizer used for solving
//! equations through their sum of squared residuals.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
//! Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    ComplexField as _, DimName, Dyn, IsContiguous, OMatrix, OVector, RealField as _, Vector, U1,
};
use thiserror::Error;

use super::RealFieldNanExt;
use crate::{
    core::{Domain, Function, Optimizer, Problem},
    derivatives::Gradient,
};

/// Options for [`QuasiNewton`] minimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct QuasiNewtonOptions<F: Problem> {
    /// The minimizer stops with [`QuasiNewtonError::Stationary`] when the
    /// largest absolute gradient component drops to this value. Default:
    /// `1e-5`.
    gradient_tolerance: F::Field,
    /// Sufficient decrease parameter of the Wolfe conditions. Default:
    /// `1e-4`.
    c1: F::Field,
    /// Curvature parameter of the Wolfe conditions. Default: `0.9`.
    c2: F::Field,
    /// Maximum number of step doublings in the line search. Default: `20`.
    max_line_search_iters: usize,
    /// Maximum number of bisections when zooming into a bracket. Default:
    /// `30`.
    max_zoom_iters: usize,
}

impl<F: Problem> Default for QuasiNewtonOptions<F> {
    fn default() -> Self {
        Self {
            gradient_tolerance: convert(1e-5),
            c1: convert(1e-4),
            c2: convert(0.9),
            max_line_search_iters: 20,
            max_zoom_iters: 30,
        }
    }
}

/// Quasi-Newton minimizer.
///
/// See [module](self) documentation for more details.
pub struct QuasiNewton<F: Problem> {
    options: QuasiNewtonOptions<F>,
    scale: OVector<F::Field, Dyn>,
    grad: Gradient<F>,
    grad_trial: Gradient<F>,
    hess_inv: OMatrix<F::Field, Dyn, Dyn>,
    dir: OVector<F::Field, Dyn>,
    x_trial: OVector<F::Field, Dyn>,
    s: OVector<F::Field, Dyn>,
    y: OVector<F::Field, Dyn>,
    hy: OVector<F::Field, Dyn>,
    fx: F::Field,
    fx_prev: F::Field,
    initialized: bool,
}

impl<F: Problem> QuasiNewton<F> {
    /// Initializes quasi-Newton minimizer with default options.
    pub fn new(f: &F, dom: &Domain<F::Field>) -> Self {
        Self::with_options(f, dom, QuasiNewtonOptions::default())
    }

    /// Initializes quasi-Newton minimizer with given options.
    pub fn with_options(f: &F, dom: &Domain<F::Field>, options: QuasiNewtonOptions<F>) -> Self {
        let dim = Dyn(dom.dim());

        Self {
            options,
            scale: dom.scale_or_ones(),
            grad: Gradient::zeros(f),
            grad_trial: Gradient::zeros(f),
            hess_inv: OMatrix::identity_generic(dim, dim),
            dir: OVector::zeros_generic(dim, U1::name()),
            x_trial: OVector::zeros_generic(dim, U1::name()),
            s: OVector::zeros_generic(dim, U1::name()),
            y: OVector::zeros_generic(dim, U1::name()),
            hy: OVector::zeros_generic(dim, U1::name()),
            fx: convert(f64::INFINITY),
            fx_prev: convert(f64::INFINITY),
            initialized: false,
        }
    }

    /// Resets the internal state of the minimizer.
    pub fn reset(&mut self) {
        self.hess_inv.fill_with_identity();
        self.initialized = false;
    }
}

/// Error returned from [`QuasiNewton`] minimizer.
#[derive(Debug, Error)]
pub enum QuasiNewtonError {
    /// The objective is not finite in the initial point.
    #[error("objective value is not finite in the initial point")]
    InvalidValue,
    /// The gradient vanished, the point is stationary.
    #[error("gradient vanished")]
    Stationary,
    /// No step length satisfying the Wolfe conditions was found.
    #[error("line search failed to find an acceptable step")]
    LineSearchFailed,
}

impl<F: Function> QuasiNewton<F> {
    fn trial_value<Sx>(&mut self, f: &F, x: &Vector<F::Field, Dyn, Sx>, alpha: F::Field) -> F::Field
    where
        Sx: Storage<F::Field, Dyn>,
    {
        self.x_trial.copy_from(x);
        self.x_trial.axpy(alpha, &self.dir, convert(1.0));
        f.apply(&self.x_trial).nan_to_inf()
    }

    /// Directional derivative in the last trial point. Leaves the gradient in
    /// that point in `grad_trial`.
    fn trial_slope(&mut self, f: &F, f_trial: F::Field) -> F::Field {
        self.grad_trial
            .compute(f, &mut self.x_trial, &self.scale, f_trial);
        self.grad_trial.dot(&self.dir)
    }

    /// Bisection of the bracket `[lo, hi]` which is known to contain a step
    /// satisfying the strong Wolfe conditions.
    fn zoom<Sx>(
        &mut self,
        f: &F,
        x: &Vector<F::Field, Dyn, Sx>,
        slope: F::Field,
        mut lo: F::Field,
        mut hi: F::Field,
        mut f_lo: F::Field,
    ) -> Result<(F::Field, F::Field), QuasiNewtonError>
    where
        Sx: Storage<F::Field, Dyn>,
    {
        let QuasiNewtonOptions {
            c1,
            c2,
            max_zoom_iters,
            ..
        } = self.options;
        let half: F::Field = convert(0.5);
        let fx = self.fx;

        for _ in 0..max_zoom_iters {
            let alpha = half * (lo + hi);
            let f_alpha = self.trial_value(f, x, alpha);

            if f_alpha > fx + c1 * alpha * slope || f_alpha >= f_lo {
                hi = alpha;
                continue;
            }

            let slope_alpha = self.trial_slope(f, f_alpha);

            if !slope_alpha.is_finite() {
                hi = alpha;
                continue;
            }

            if slope_alpha.abs() <= -c2 * slope {
                return Ok((alpha, f_alpha));
            }

            if slope_alpha * (hi - lo) >= convert(0.0) {
                hi = lo;
            }

            lo = alpha;
            f_lo = f_alpha;
        }

        Err(QuasiNewtonError::LineSearchFailed)
    }

    /// Finds a step length satisfying the strong Wolfe conditions, starting
    /// with `alpha` and doubling it while the objective keeps decreasing.
    fn line_search<Sx>(
        &mut self,
        f: &F,
        x: &Vector<F::Field, Dyn, Sx>,
        slope: F::Field,
        mut alpha: F::Field,
    ) -> Result<(F::Field, F::Field), QuasiNewtonError>
    where
        Sx: Storage<F::Field, Dyn>,
    {
        let QuasiNewtonOptions {
            c1,
            c2,
            max_line_search_iters,
            ..
        } = self.options;
        let fx = self.fx;

        let mut alpha_prev = convert(0.0);
        let mut f_prev = fx;

        for i in 0..max_line_search_iters {
            let f_alpha = self.trial_value(f, x, alpha);

            if f_alpha > fx + c1 * alpha * slope || (i > 0 && f_alpha >= f_prev) {
                return self.zoom(f, x, slope, alpha_prev, alpha, f_prev);
            }

            let slope_alpha = self.trial_slope(f, f_alpha);

            if !slope_alpha.is_finite() {
                return self.zoom(f, x, slope, alpha_prev, alpha, f_prev);
            }

            if slope_alpha.abs() <= -c2 * slope {
                return Ok((alpha, f_alpha));
            }

            if slope_alpha >= convert(0.0) {
                return self.zoom(f, x, slope, alpha, alpha_prev, f_alpha);
            }

            alpha_prev = alpha;
            f_prev = f_alpha;
            alpha *= convert(2.0);
        }

        Err(QuasiNewtonError::LineSearchFailed)
    }

    fn next_inner<Sx>(
        &mut self,
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, QuasiNewtonError>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        let zero: F::Field = convert(0.0);
        let one: F::Field = convert(1.0);

        if !self.initialized {
            let fx = f.apply(x);

            if !fx.is_finite() {
                debug!("objective in the initial point is {}", fx);
                return Err(QuasiNewtonError::InvalidValue);
            }

            self.grad.compute(f, x, &self.scale, fx);
            self.hess_inv.fill_with_identity();
            self.fx = fx;
            // Pretends a previous decrease of half the gradient norm for the
            // initial step length estimate.
            self.fx_prev = fx + self.grad.norm() * convert(0.5);
            self.initialized = true;
        }

        let grad_max = self
            .grad
            .iter()
            .fold(zero, |max, gi| if gi.abs() > max { gi.abs() } else { max });

        if grad_max <= self.options.gradient_tolerance {
            debug!("gradient vanished: {} <= {}", grad_max, self.options.gradient_tolerance);
            return Err(QuasiNewtonError::Stationary);
        }

        // Quasi-Newton direction p = -H g.
        self.dir.gemv(-one, &self.hess_inv, &*self.grad, zero);
        let mut slope = self.grad.dot(&self.dir);

        if !(slope < zero) {
            debug!("not a descent direction (slope = {}), resetting inverse Hessian", slope);
            self.hess_inv.fill_with_identity();
            self.dir.copy_from(&*self.grad);
            self.dir.neg_mut();
            slope = self.grad.dot(&self.dir);
        }

        // Initial step length from the last decrease, capped at the full
        // quasi-Newton step.
        let alpha_init = (self.fx - self.fx_prev) * convert(2.02) / slope;
        let alpha_init = if alpha_init > zero {
            alpha_init.min(one)
        } else {
            one
        };

        let (alpha, f_alpha) = self.line_search(f, x, slope, alpha_init)?;

        // The trial point after the line search is x + alpha p and the trial
        // gradient is computed in it.
        self.s.copy_from(&self.dir);
        self.s *= alpha;
        x.copy_from(&self.x_trial);

        self.grad_trial.sub_to(&*self.grad, &mut self.y);
        let ys = self.y.dot(&self.s);

        if ys > zero {
            // H <- (I - rho s y^T) H (I - rho y s^T) + rho s s^T, expanded
            // into rank-one updates.
            let rho = one / ys;
            self.hy.gemv(one, &self.hess_inv, &self.y, zero);
            let yhy = self.y.dot(&self.hy);

            self.hess_inv.ger(-rho, &self.hy, &self.s, one);
            self.hess_inv.ger(-rho, &self.s, &self.hy, one);
            self.hess_inv.ger(rho * rho * yhy + rho, &self.s, &self.s, one);
        } else {
            debug!("skipping inverse Hessian update (y^T s = {})", ys);
        }

        std::mem::swap(&mut self.grad, &mut self.grad_trial);
        self.fx_prev = self.fx;
        self.fx = f_alpha;

        debug!("step length {},\tfx = {}", alpha, f_alpha);

        Ok(f_alpha)
    }
}

impl<F: Function> Optimizer<F> for QuasiNewton<F> {
    const NAME: &'static str = "Quasi-Newton";

    type Error = QuasiNewtonError;

    fn opt_next<Sx>(
        &mut self,
        f: &F,
        _dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        self.next_inner(f, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::driver::OptimizerDriver;
    use crate::objective::Equation;
    use crate::testing::*;

    #[test]
    fn rosenbrock() {
        let f = ExtendedRosenbrock::new(2);

        for x in f.initials() {
            let mut optimizer = OptimizerDriver::builder(&f)
                .with_initial(x.as_slice().to_vec())
                .with_algo(QuasiNewton::new)
                .build();

            // Close to the minimum, the finite-difference gradient is
            // dominated by noise and the iteration may stall.
            match optimizer.find(|state| state.fx() <= 1e-12 || state.iter() >= 400) {
                Ok(_) | Err(QuasiNewtonError::Stationary) | Err(QuasiNewtonError::LineSearchFailed) => {}
                Err(error) => panic!("unexpected error: {}", error),
            }

            assert_abs_diff_eq!(optimizer.x()[0], 1.0, epsilon = 1e-4);
            assert_abs_diff_eq!(optimizer.x()[1], 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn sphere() {
        for n in [1, 4] {
            let f = Sphere::new(n);
            let dom = f.domain();
            let eps = convert(1e-10);

            for x in f.initials() {
                let optimizer = QuasiNewton::new(&f, &dom);
                optimize(&f, &dom, optimizer, x, 100, eps).unwrap();
            }
        }
    }

    #[test]
    fn quadratic_equation_both_roots() {
        let f = Equation::new(|x: f64| x.powi(2) + x - 5.0);
        let dom = f.domain();
        let eps = convert(1e-12);

        let x = optimize(&f, &dom, QuasiNewton::new(&f, &dom), dvector![2.0], 100, eps).unwrap();
        assert_abs_diff_eq!(x[0], 1.79128785, epsilon = 1e-6);

        let x = optimize(&f, &dom, QuasiNewton::new(&f, &dom), dvector![-3.0], 100, eps).unwrap();
        assert_abs_diff_eq!(x[0], -2.79128785, epsilon = 1e-6);
    }

    #[test]
    fn steps_away_from_undefined_region() {
        let undefined = Cell::new(0);
        let f = Equation::new(|x: f64| {
            if x < 0.0 {
                undefined.set(undefined.get() + 1);
            }
            10.0 * (x.sqrt() - 1.0)
        });
        let dom = f.domain();
        let eps = convert(1e-12);

        // The first line search overshoots to negative x where the residual
        // is NaN.
        let x = optimize(&f, &dom, QuasiNewton::new(&f, &dom), dvector![25.0], 100, eps).unwrap();

        assert!(undefined.get() > 0);
        assert!(x[0].is_finite());
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn stationary_starting_point() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut optimizer = QuasiNewton::new(&f, &dom);
        let mut x = dvector![0.0, 0.0];

        assert!(matches!(
            optimizer.opt_next(&f, &dom, &mut x),
            Err(QuasiNewtonError::Stationary)
        ));
        assert_eq!(x, dvector![0.0, 0.0]);
    }

    #[test]
    fn invalid_starting_point() {
        let f = Equation::new(|x: f64| 1.0 / x);
        let dom = f.domain();

        let mut optimizer = QuasiNewton::new(&f, &dom);
        let mut x = dvector![0.0];

        assert!(matches!(
            optimizer.opt_next(&f, &dom, &mut x),
            Err(QuasiNewtonError::InvalidValue)
        ));
    }

    #[test]
    fn objective_decreases() {
        let f = ExtendedRosenbrock::new(2);
        let dom = f.domain();

        let mut optimizer = QuasiNewton::new(&f, &dom);
        let mut x = dvector![-1.2, 1.0];
        let mut fx = f.apply(&x);

        for _ in 0..10 {
            let fx_next = optimizer.opt_next(&f, &dom, &mut x).unwrap();
            assert!(fx_next <= fx);
            assert_eq!(fx_next, f.apply(&x));
            fx = fx_next;
        }
    }
}
