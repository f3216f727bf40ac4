use super::domain::Domain;

/// Trait implemented by real numbers.
pub trait RealField: nalgebra::RealField {
    /// Square root of double precision machine epsilon. This value is a
    /// standard constant for epsilons in approximating first-order
    /// derivate-based concepts.
    const EPSILON_SQRT: Self;
}

impl RealField for f32 {
    const EPSILON_SQRT: Self = 0.00034526698;
}

impl RealField for f64 {
    const EPSILON_SQRT: Self = 0.000000014901161193847656;
}

/// The base trait for [`System`](super::system::System) and
/// [`Function`](super::function::Function).
pub trait Problem {
    /// Field type of the problem, usually f64 or f32.
    type Field: RealField + Copy;

    /// Domain of the problem. At the very least, it carries the number of
    /// unknowns.
    fn domain(&self) -> Domain<Self::Field>;
}
