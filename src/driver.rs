//! Stepping a minimizer by hand.
//!
//! [`solve`](crate::solve) and [`minimize`](crate::minimize) run the whole
//! minimization and only report the outcome. The [`OptimizerDriver`] owns the
//! same state (problem domain, minimizer, current point and its value) but
//! leaves the iteration to the caller, which is useful for printing the
//! progress or for custom stopping rules.
//!
//! ```rust
//! use resmin::objective::Equation;
//! use resmin::OptimizerDriver;
//!
//! // x^2 + x - 5 = 0
//! let f = Equation::new(|x: f64| x.powi(2) + x - 5.0);
//!
//! let mut driver = OptimizerDriver::builder(&f)
//!     .with_initial(vec![2.0])
//!     .build();
//!
//! let (x, fx) = driver
//!     .find(|state| {
//!         println!("iter = {}\tS(x) = {}\tx = {:?}", state.iter(), state.fx(), state.x());
//!         state.fx() <= 1e-10 || state.iter() >= 100
//!     })
//!     .expect("residual is defined everywhere");
//!
//! assert!(fx <= 1e-10);
//! assert!((x[0] - 1.79128785).abs() < 1e-4);
//! ```
//!
//! A different minimizer is chosen by passing its constructor:
//!
//! ```rust
//! # use resmin::objective::Equation;
//! # use resmin::OptimizerDriver;
//! #
//! # let f = Equation::new(|x: f64| x.powi(2) + x - 5.0);
//! #
//! let mut driver = OptimizerDriver::builder(&f)
//!     .with_initial(vec![-3.0])
//!     .with_algo(resmin::algo::NelderMead::new)
//!     .build();
//!
//! let (x, fx) = driver.next().expect("residual is defined everywhere");
//! ```
//!
//! Without [`with_initial`](OptimizerBuilder::with_initial), the iteration
//! starts in the origin.

use nalgebra::{convert, DVector};

use crate::{algo::QuasiNewton, Domain, Function, Optimizer, Problem};

/// Builder for the [`OptimizerDriver`], see [`OptimizerDriver::builder`].
pub struct OptimizerBuilder<'a, F: Problem, A> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: A,
    x0: Option<Vec<F::Field>>,
}

impl<'a, F: Problem, A> OptimizerBuilder<'a, F, A> {
    /// Sets the initial guess.
    ///
    /// # Panics
    ///
    /// When the length of `x0` differs from the problem dimension.
    pub fn with_initial(self, x0: Vec<F::Field>) -> Self {
        assert_eq!(
            x0.len(),
            self.dom.dim(),
            "initial guess has invalid dimension"
        );

        Self {
            x0: Some(x0),
            ..self
        }
    }

    /// Replaces the minimizer.
    ///
    /// The factory gets the problem and its domain, so the `new` constructors
    /// of the minimizers in [`algo`](crate::algo) can be passed directly.
    pub fn with_algo<A2, FA>(self, factory: FA) -> OptimizerBuilder<'a, F, A2>
    where
        FA: FnOnce(&F, &Domain<F::Field>) -> A2,
    {
        let Self { f, dom, x0, .. } = self;
        let algo = factory(f, &dom);

        OptimizerBuilder { f, dom, algo, x0 }
    }

    /// Builds the [`OptimizerDriver`].
    pub fn build(self) -> OptimizerDriver<'a, F, A> {
        let Self { f, dom, algo, x0 } = self;

        let x = match x0 {
            Some(x0) => DVector::from_vec(x0),
            None => DVector::from_element(dom.dim(), convert(0.0)),
        };

        OptimizerDriver {
            f,
            dom,
            algo,
            x,
            fx: convert(f64::INFINITY),
            iters: 0,
        }
    }
}

/// Iterates a minimizer on a function.
///
/// See the [module](self) documentation for the usage.
pub struct OptimizerDriver<'a, F: Problem, A> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: A,
    x: DVector<F::Field>,
    fx: F::Field,
    iters: usize,
}

impl<'a, F: Problem> OptimizerDriver<'a, F, QuasiNewton<F>> {
    /// Starts building a driver with the default [`QuasiNewton`] minimizer.
    pub fn builder(f: &'a F) -> OptimizerBuilder<'a, F, QuasiNewton<F>> {
        let dom = f.domain();
        let algo = QuasiNewton::new(f, &dom);

        OptimizerBuilder {
            f,
            dom,
            algo,
            x0: None,
        }
    }

    /// Driver with the default minimizer started in the origin.
    pub fn new(f: &'a F) -> Self {
        Self::builder(f).build()
    }
}

impl<'a, F: Problem, A> OptimizerDriver<'a, F, A> {
    /// The current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Objective value in the current point, infinity before the first
    /// iteration.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Number of successfully performed iterations.
    pub fn iters(&self) -> usize {
        self.iters
    }
}

impl<'a, F: Function, A: Optimizer<F>> OptimizerDriver<'a, F, A> {
    /// Performs one iteration and returns the new point with its objective
    /// value.
    ///
    /// On error, the point is whatever the minimizer left there. Both
    /// minimizers of this crate leave the best point found so far.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(&[F::Field], F::Field), A::Error> {
        self.fx = self.algo.opt_next(self.f, &self.dom, &mut self.x)?;
        self.iters += 1;
        Ok((self.x.as_slice(), self.fx))
    }

    /// Iterates until `stop` returns true for the state after an iteration.
    pub fn find<C>(&mut self, mut stop: C) -> Result<(&[F::Field], F::Field), A::Error>
    where
        C: FnMut(OptimizerIterState<'_, F>) -> bool,
    {
        loop {
            self.next()?;

            let state = OptimizerIterState {
                x: &self.x,
                fx: self.fx,
                iter: self.iters,
            };

            if stop(state) {
                return Ok((self.x.as_slice(), self.fx));
            }
        }
    }

    /// Name of the minimizer.
    pub fn name(&self) -> &str {
        A::NAME
    }
}

/// Snapshot passed to the stopping rule of [`OptimizerDriver::find`].
pub struct OptimizerIterState<'a, F: Problem> {
    x: &'a DVector<F::Field>,
    fx: F::Field,
    iter: usize,
}

impl<'a, F: Problem> OptimizerIterState<'a, F> {
    /// The current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Objective value in the current point.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Number of iterations performed so far, starting at one.
    pub fn iter(&self) -> usize {
        self.iter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{algo::NelderMead, testing::Sphere};

    #[test]
    fn default_minimizer() {
        let f = Sphere::new(4);
        let mut driver = OptimizerDriver::builder(&f)
            .with_initial(vec![10.0; 4])
            .build();

        let tolerance = 1e-6;
        let (_, value) = driver
            .find(|state| state.iter() > 100 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
        assert_eq!(driver.fx(), value);
        assert_eq!(driver.name(), "Quasi-Newton");
    }

    #[test]
    fn custom_algo() {
        let f = Sphere::new(4);
        let mut driver = OptimizerDriver::builder(&f)
            .with_algo(NelderMead::new)
            .with_initial(vec![10.0; 4])
            .build();

        let tolerance = 1e-6;
        let (_, value) = driver
            .find(|state| state.iter() > 200 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
        assert_eq!(driver.name(), "Nelder-Mead");
    }

    #[test]
    fn initial() {
        let f = Sphere::new(4);
        let driver = OptimizerDriver::builder(&f)
            .with_initial(vec![10.0; 4])
            .build();

        assert_eq!(driver.x(), &[10.0; 4]);
        assert!(driver.fx().is_infinite());
        assert_eq!(driver.iters(), 0);

        let driver = OptimizerDriver::new(&f);
        assert_eq!(driver.x(), &[0.0; 4]);
    }

    #[test]
    #[should_panic(expected = "initial guess has invalid dimension")]
    fn initial_of_wrong_dimension() {
        let f = Sphere::new(3);
        OptimizerDriver::builder(&f).with_initial(vec![1.0, 2.0]);
    }

    #[test]
    fn next_stores_value() {
        let f = Sphere::new(2);
        let mut driver = OptimizerDriver::builder(&f)
            .with_initial(vec![3.0, -4.0])
            .build();

        let (_, fx) = driver.next().unwrap();

        assert!(fx < 25.0);
        assert_eq!(driver.fx(), fx);
        assert_eq!(driver.iters(), 1);
    }

    #[test]
    fn find_counts_iterations() {
        let f = Sphere::new(2);
        let mut driver = OptimizerDriver::builder(&f)
            .with_algo(NelderMead::new)
            .with_initial(vec![3.0, -4.0])
            .build();

        let mut seen = Vec::new();
        driver
            .find(|state| {
                seen.push(state.iter());
                state.iter() == 3
            })
            .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(driver.iters(), 3);
    }
}
