//! Problem domain definition (dimensionality, scaling).

use nalgebra::{DimName, Dyn, OVector, U1};

use crate::core::RealField;

/// Domain of a problem.
///
/// Equations are solved by *unconstrained* minimization, so the domain is the
/// whole space of given dimension. It may additionally carry the typical
/// magnitudes of the unknowns, which the minimizers use for sizing their
/// steps.
#[derive(Debug, Clone)]
pub struct Domain<T: RealField + Copy> {
    dim: usize,
    scale: Option<OVector<T, Dyn>>,
}

impl<T: RealField + Copy> Domain<T> {
    /// Creates unconstrained domain with given dimensionality.
    pub fn unconstrained(dim: usize) -> Self {
        assert!(dim > 0, "empty domain");

        Self { dim, scale: None }
    }

    /// Sets typical magnitudes of the unknowns.
    ///
    /// Scale of an unknown is the inverse of its magnitude. Unknowns whose
    /// values differ by many orders of magnitude make the finite differences
    /// and the initial simplex poorly sized without it.
    pub fn with_magnitudes(mut self, magnitudes: Vec<T>) -> Self {
        assert!(
            magnitudes.len() == self.dim,
            "magnitudes have invalid dimension"
        );
        assert!(
            magnitudes.iter().all(|m| m.is_finite() && *m > T::zero()),
            "magnitudes must be positive and finite"
        );

        let scale = magnitudes.into_iter().map(|m| T::one() / m);
        self.scale = Some(OVector::from_iterator_generic(
            Dyn(self.dim),
            U1::name(),
            scale,
        ));
        self
    }

    /// Gets the dimensionality of the domain.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Gets the scale if it was set by [`Domain::with_magnitudes`].
    pub fn scale(&self) -> Option<&OVector<T, Dyn>> {
        self.scale.as_ref()
    }

    /// Gets the scale, falling back to ones when none is set.
    pub fn scale_or_ones(&self) -> OVector<T, Dyn> {
        match &self.scale {
            Some(scale) => scale.clone_owned(),
            None => OVector::from_element_generic(Dyn(self.dim), U1::name(), T::one()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_has_no_scale() {
        let dom = Domain::<f64>::unconstrained(3);

        assert_eq!(dom.dim(), 3);
        assert!(dom.scale().is_none());
        assert_eq!(dom.scale_or_ones().as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    #[should_panic(expected = "empty domain")]
    fn empty_domain() {
        Domain::<f64>::unconstrained(0);
    }

    #[test]
    fn scale_from_magnitudes() {
        let dom = Domain::unconstrained(2).with_magnitudes(vec![10.0, 0.5]);

        assert_eq!(dom.scale().map(|s| s.as_slice()), Some(&[0.1, 2.0][..]));
        assert_eq!(dom.scale_or_ones().as_slice(), &[0.1, 2.0]);
    }

    #[test]
    #[should_panic(expected = "magnitudes must be positive and finite")]
    fn zero_magnitude() {
        Domain::unconstrained(2).with_magnitudes(vec![1.0, 0.0]);
    }
}
