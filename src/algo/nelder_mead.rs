//! Nelder-Mead (simplex) minimization method.
//!
//! [Nelder-Mead](https://en.wikipedia.org/wiki/Nelder%E2%80%93Mead_method)
//! simplex-reflection method is a popular derivative-free minimization
//! algorithm. It keeps a [simplex](https://en.wikipedia.org/wiki/Simplex) of
//! _n + 1_ points and the simplex is reflected, expanded or contracted based on
//! comparing the objective values in its vertices.
//!
//! It needs no derivatives, which makes it the method of choice when the
//! residuals are not smooth or are undefined in parts of the space.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [Implementing the Nelder-Mead simplex algorithm with adaptive
//! parameters](https://link.springer.com/article/10.1007/s10589-010-9329-3)
//!
//! \[3\] [Less is more: Simplified Nelder-Mead method for large unconstrained
//! optimization](https://api.semanticscholar.org/CorpusID:59403095)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    ComplexField, Dim, DimName, Dyn, IsContiguous, OVector, RealField, Vector, U1,
};
use thiserror::Error;

use super::RealFieldNanExt;
use crate::core::{Domain, Function, Optimizer, Problem, RealField as _};

/// Family of coefficients for reflection, expansion and contractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientsFamily {
    /// Standard ("textbook") choice.
    Standard,
    /// Coefficients adjusted to the problem dimension so that expansion and
    /// contraction steps do not diminish in higher dimensions.
    Balanced,
    /// Coefficients that turn the method into a golden-section search.
    GoldenSection,
    /// Coefficients set by the user through [`NelderMeadOptions`] are left
    /// untouched.
    Fixed,
}

/// Options for [`NelderMead`] minimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct NelderMeadOptions<F: Problem> {
    /// Family for coefficients adaptation or fixed coefficients. Default:
    /// standard (see [`CoefficientsFamily`]).
    family: CoefficientsFamily,
    /// Coefficient for reflection operation. Default: `-1`.
    reflection_coeff: F::Field,
    /// Coefficient for expansion operation. Default: `-2`.
    expansion_coeff: F::Field,
    /// Coefficient for outer contraction operation. Default: `-0.5`.
    outer_contraction_coeff: F::Field,
    /// Coefficient for inner contraction operation. Default: `0.5`.
    inner_contraction_coeff: F::Field,
    /// Coefficient for shrinking operation. Default: `0.5`.
    shrink_coeff: F::Field,
}

impl<F: Problem> Default for NelderMeadOptions<F> {
    fn default() -> Self {
        Self {
            family: CoefficientsFamily::Standard,
            reflection_coeff: convert(-1.0),
            expansion_coeff: convert(-2.0),
            outer_contraction_coeff: convert(-0.5),
            inner_contraction_coeff: convert(0.5),
            shrink_coeff: convert(0.5),
        }
    }
}

impl<F: Problem> NelderMeadOptions<F> {
    fn adapt_coeffs(&mut self, dim: usize) {
        let one: F::Field = convert(1.0);

        let (reflection, expansion, outer, inner, shrink) = match self.family {
            CoefficientsFamily::Standard => (
                convert(-1.0),
                convert(-2.0),
                convert(-0.5),
                convert(0.5),
                convert(0.5),
            ),
            CoefficientsFamily::Balanced => {
                let n: F::Field = convert(dim as f64);
                let n_inv = one / n;
                (
                    convert(-1.0),
                    -(n_inv * convert(2.0) + one),
                    -(one - n_inv),
                    one - n_inv,
                    one - n_inv,
                )
            }
            CoefficientsFamily::GoldenSection => {
                let alpha = 2.0 / (5f64.sqrt() + 1.0);
                (
                    convert(-1.0),
                    convert(-1.0 / alpha),
                    convert(-alpha),
                    convert(alpha.powi(2)),
                    convert(-alpha.powi(2)),
                )
            }
            CoefficientsFamily::Fixed => return,
        };

        self.reflection_coeff = reflection;
        self.expansion_coeff = expansion;
        self.outer_contraction_coeff = outer;
        self.inner_contraction_coeff = inner;
        self.shrink_coeff = shrink;
    }
}

/// Nelder-Mead minimizer.
///
/// See [module](self) documentation for more details.
pub struct NelderMead<F: Problem> {
    options: NelderMeadOptions<F>,
    scale: OVector<F::Field, Dyn>,
    centroid: OVector<F::Field, Dyn>,
    trial: OVector<F::Field, Dyn>,
    farther: OVector<F::Field, Dyn>,
    vertices: Vec<OVector<F::Field, Dyn>>,
    values: Vec<F::Field>,
    order: Vec<usize>,
}

impl<F: Problem> NelderMead<F> {
    /// Initializes Nelder-Mead minimizer with default options.
    pub fn new(f: &F, dom: &Domain<F::Field>) -> Self {
        Self::with_options(f, dom, NelderMeadOptions::default())
    }

    /// Initializes Nelder-Mead minimizer with given options.
    pub fn with_options(_: &F, dom: &Domain<F::Field>, mut options: NelderMeadOptions<F>) -> Self {
        let n = dom.dim();
        let dim = Dyn(n);

        options.adapt_coeffs(n);

        Self {
            options,
            scale: dom.scale_or_ones(),
            centroid: OVector::zeros_generic(dim, U1::name()),
            trial: OVector::zeros_generic(dim, U1::name()),
            farther: OVector::zeros_generic(dim, U1::name()),
            vertices: Vec::with_capacity(n + 1),
            values: Vec::with_capacity(n + 1),
            order: Vec::with_capacity(n + 1),
        }
    }

    /// Resets the internal state of the minimizer.
    pub fn reset(&mut self) {
        // The simplex is built again in the next iteration.
        self.vertices.clear();
        self.values.clear();
        self.order.clear();
    }

    fn sort(&mut self) {
        let values = &self.values;
        self.order.sort_by(|a, b| {
            values[*a]
                .partial_cmp(&values[*b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn best(&self) -> F::Field {
        self.values[self.order[0]]
    }

    fn worst(&self) -> F::Field {
        self.values[self.order[self.order.len() - 1]]
    }

    fn replace_worst(&mut self, candidate: Candidate, value: F::Field) {
        let worst = self.order[self.order.len() - 1];
        let vertex = match candidate {
            Candidate::Trial => &self.trial,
            Candidate::Farther => &self.farther,
        };
        self.vertices[worst].copy_from(vertex);
        self.values[worst] = value;
    }
}

/// Error returned from [`NelderMead`] minimizer.
#[derive(Debug, Error)]
pub enum NelderMeadError {
    /// Simplex collapsed so it is impossible to make any progress.
    #[error("simplex collapsed")]
    SimplexCollapsed,
    /// Simplex contains too many invalid values (NaN, infinity).
    #[error("simplex contains too many invalid values")]
    SimplexInvalid,
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Trial,
    Farther,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Reflection,
    Expansion,
    OuterContraction,
    InnerContraction,
    Shrinkage,
}

impl Step {
    fn as_str(&self) -> &str {
        match self {
            Step::Reflection => "reflection",
            Step::Expansion => "expansion",
            Step::OuterContraction => "outer contraction",
            Step::InnerContraction => "inner contraction",
            Step::Shrinkage => "shrinkage",
        }
    }
}

impl<F: Function> NelderMead<F> {
    fn init_simplex<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &Vector<F::Field, Dyn, Sx>,
    ) -> Result<(), NelderMeadError>
    where
        Sx: Storage<F::Field, Dyn>,
    {
        let n = dom.dim();

        // The initial point and one step along each axis, sized by the
        // variable scale.
        self.vertices.push(x.clone_owned());
        self.values.push(f.apply(&self.vertices[0]));

        for j in 0..n {
            let mut vertex = x.clone_owned();
            vertex[j] += self.scale[j];

            self.values.push(f.apply(&vertex));
            self.vertices.push(vertex);
        }

        let invalid = self.values.iter().filter(|v| !v.is_finite()).count();

        if invalid >= self.vertices.len() / 2 {
            debug!(
                "{} out of {} simplex vertices have invalid value, returning error",
                invalid,
                self.vertices.len()
            );
            self.reset();
            return Err(NelderMeadError::SimplexInvalid);
        }

        self.order.extend(0..=n);
        self.sort();

        Ok(())
    }

    fn shrink(&mut self, f: &F) {
        let NelderMead {
            options,
            vertices,
            values,
            order,
            ..
        } = self;

        let best = vertices[order[0]].clone_owned();

        for &i in &order[1..] {
            let vertex = &mut vertices[i];
            vertex.on_line_mut(&best, options.shrink_coeff);
            values[i] = f.apply(vertex).nan_to_inf();
        }
    }

    fn next_inner<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, NelderMeadError>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        let n = dom.dim();

        if self.vertices.is_empty() {
            self.init_simplex(f, dom, x)?;
        }

        let NelderMeadOptions {
            reflection_coeff,
            expansion_coeff,
            outer_contraction_coeff,
            inner_contraction_coeff,
            ..
        } = self.options;

        // Centroid of all vertices but the worst one.
        self.centroid.fill(convert(0.0));
        for &i in &self.order[..n] {
            self.centroid += &self.vertices[i];
        }
        self.centroid /= convert(n as f64);

        debug!("centroid of simplex: {:?}", self.centroid.as_slice());

        let best = self.best();
        let second_worst = self.values[self.order[n - 1]];
        let worst_vertex = self.order[n];

        self.trial
            .on_line2_mut(&self.centroid, &self.vertices[worst_vertex], reflection_coeff);
        let reflection = f.apply(&self.trial).nan_to_inf();

        let step = if best <= reflection && reflection < second_worst {
            // The reflected point is neither the best nor the worst one in the
            // new simplex.
            self.replace_worst(Candidate::Trial, reflection);
            Step::Reflection
        } else if reflection < best {
            // The reflected point is the new best, so try to go farther in
            // this direction.
            self.farther
                .on_line2_mut(&self.centroid, &self.vertices[worst_vertex], expansion_coeff);
            let expansion = f.apply(&self.farther).nan_to_inf();

            if expansion < reflection {
                self.replace_worst(Candidate::Farther, expansion);
                Step::Expansion
            } else {
                self.replace_worst(Candidate::Trial, reflection);
                Step::Reflection
            }
        } else {
            // The reflected point is at least as bad as the second worst.
            // Contract the simplex, either outside or inside.
            let outside = second_worst <= reflection && reflection < self.worst();
            let (coeff, step, threshold) = if outside {
                (outer_contraction_coeff, Step::OuterContraction, reflection)
            } else {
                (inner_contraction_coeff, Step::InnerContraction, self.worst())
            };

            self.farther
                .on_line2_mut(&self.centroid, &self.vertices[worst_vertex], coeff);
            let contraction = f.apply(&self.farther).nan_to_inf();

            if contraction <= threshold {
                self.replace_worst(Candidate::Farther, contraction);
                step
            } else {
                // No contraction is acceptable. Shrink the simplex towards the
                // best vertex.
                self.shrink(f);
                Step::Shrinkage
            }
        };

        self.sort();

        debug!(
            "performed {},\tfx = {} - {}",
            step.as_str(),
            self.best(),
            self.worst()
        );

        // The best vertex is reported even when the simplex collapsed.
        x.copy_from(&self.vertices[self.order[0]]);

        if step == Step::Shrinkage || step == Step::InnerContraction {
            // Only these steps can leave the simplex without any decrease of
            // the objective. The collapse criterion is taken from "Less is
            // more: Simplified Nelder-Mead method for large unconstrained
            // optimization".
            let eps = F::Field::EPSILON_SQRT;

            let worst = self.worst();
            let best = self.best();
            let numer = (worst - best) * convert(2.0);
            let denom = worst + best + eps;

            if numer / denom <= eps {
                debug!("simplex collapsed: {} / {} <= {}", numer, denom, eps);
                return Err(NelderMeadError::SimplexCollapsed);
            }
        }

        Ok(self.best())
    }
}

impl<F: Function> Optimizer<F> for NelderMead<F> {
    const NAME: &'static str = "Nelder-Mead";

    type Error = NelderMeadError;

    fn opt_next<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        self.next_inner(f, dom, x)
    }
}

trait VectorSimplexExt<T: RealField, D: Dim> {
    /// Moves the vector towards `to`, to the point `t * (self + to)`.
    fn on_line_mut<Sto>(&mut self, to: &Vector<T, D, Sto>, t: T)
    where
        Sto: Storage<T, D>;

    /// Sets the vector to the point `from + t * (to - from)`.
    fn on_line2_mut<Sfrom, Sto>(
        &mut self,
        from: &Vector<T, D, Sfrom>,
        to: &Vector<T, D, Sto>,
        t: T,
    ) where
        Sfrom: Storage<T, D>,
        Sto: Storage<T, D>;
}

impl<T: RealField, D: Dim, S> VectorSimplexExt<T, D> for Vector<T, D, S>
where
    S: StorageMut<T, D>,
{
    fn on_line_mut<Sto>(&mut self, to: &Vector<T, D, Sto>, t: T)
    where
        Sto: Storage<T, D>,
    {
        *self += to;
        *self *= t;
    }

    fn on_line2_mut<Sfrom, Sto>(&mut self, from: &Vector<T, D, Sfrom>, to: &Vector<T, D, Sto>, t: T)
    where
        Sfrom: Storage<T, D>,
        Sto: Storage<T, D>,
    {
        to.sub_to(from, self);
        *self *= t;
        *self += from;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::objective::{Equation, Residuals};
    use crate::testing::*;

    #[test]
    fn rosenbrock() {
        let f = ExtendedRosenbrock::new(2);
        let dom = f.domain();
        let eps = convert(1e-12);

        for x in f.initials() {
            let optimizer = NelderMead::new(&f, &dom);
            optimize(&f, &dom, optimizer, x, 250, eps).unwrap();
        }
    }

    #[test]
    fn sphere() {
        let f = Sphere::new(4);
        let dom = f.domain();
        let eps = convert(1e-12);

        for x in f.initials() {
            let optimizer = NelderMead::new(&f, &dom);
            optimize(&f, &dom, optimizer, x, 200, eps).unwrap();
        }
    }

    #[test]
    fn quadratic_equation_both_roots() {
        let f = Equation::new(|x: f64| x.powi(2) + x - 5.0);
        let dom = f.domain();
        let eps = convert(1e-12);

        let x = optimize(&f, &dom, NelderMead::new(&f, &dom), dvector![2.0], 200, eps).unwrap();
        assert_abs_diff_eq!(x[0], 1.79128785, epsilon = 1e-6);

        let x = optimize(&f, &dom, NelderMead::new(&f, &dom), dvector![-3.0], 200, eps).unwrap();
        assert_abs_diff_eq!(x[0], -2.79128785, epsilon = 1e-6);
    }

    #[test]
    fn three_quadrics() {
        let f = Residuals::new(|x: &[f64]| {
            [
                x[0].powi(2) + x[1].powi(2) - 4.0,
                x[0] * x[1] + x[1] * x[2] + 1.0,
                x[1].powi(2) + x[2].powi(2) - 2.0,
            ]
        });
        let dom = f.domain();
        let eps = convert(1e-12);

        let optimizer = NelderMead::new(&f, &dom);
        let x = optimize(&f, &dom, optimizer, dvector![1.0, 2.0, 1.0], 600, eps).unwrap();

        for ri in f.residuals(x.as_slice()) {
            assert_abs_diff_eq!(ri, 0.0, epsilon = 1e-5);
        }
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

        let x = optimize(&f, &dom, NelderMead::new(&f, &dom), dvector![25.0], 200, eps).unwrap();

        assert!(undefined.get() > 0);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn invalid_simplex() {
        // Undefined everywhere except the initial point.
        let f = Equation::new(|x: f64| if x == 0.0 { 1.0 } else { f64::NAN });
        let dom = f.domain();

        let mut optimizer = NelderMead::new(&f, &dom);
        let mut x = dvector![0.0];

        assert!(matches!(
            optimizer.opt_next(&f, &dom, &mut x),
            Err(NelderMeadError::SimplexInvalid)
        ));
    }

    #[test]
    fn coefficients_families() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = NelderMeadOptions::<Sphere>::default();
        options.set_family(CoefficientsFamily::Balanced);
        options.adapt_coeffs(dom.dim());

        assert_abs_diff_eq!(options.expansion_coeff(), -2.0);
        assert_abs_diff_eq!(options.outer_contraction_coeff(), -0.5);
        assert_abs_diff_eq!(options.shrink_coeff(), 0.5);

        options.set_family(CoefficientsFamily::Fixed);
        options.set_shrink_coeff(0.25);
        options.adapt_coeffs(dom.dim());
        assert_abs_diff_eq!(options.shrink_coeff(), 0.25);
    }
}
