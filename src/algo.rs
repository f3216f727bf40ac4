//! The collection of implemented minimizers.
//!
//! [`QuasiNewton`] is the default choice. [`NelderMead`] is derivative-free
//! and tolerates non-smooth objectives better.

pub mod nelder_mead;
pub mod quasi_newton;

pub use nelder_mead::NelderMead;
pub use quasi_newton::QuasiNewton;

use nalgebra::RealField;

pub(crate) trait RealFieldNanExt {
    /// Maps NaN and both infinities to positive infinity.
    fn nan_to_inf(self) -> Self;
}

impl<T: RealField> RealFieldNanExt for T {
    fn nan_to_inf(self) -> Self {
        if self.is_finite() {
            self
        } else {
            // Not finite also covers NaN and negative infinity.
            T::from_subset(&f64::INFINITY)
        }
    }
}
