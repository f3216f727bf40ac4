//! Checking the results of solving.

use log::warn;
use nalgebra::{convert, ComplexField as _, DVector, RealField};
use num_traits::One;

use crate::core::System;

/// Evaluates the residuals of the system in given point.
///
/// Use this on the vector actually returned by a solver. Re-signing or
/// otherwise editing the components before checking defeats the purpose.
pub fn residuals_at<R: System>(r: &R, x: &[R::Field]) -> Vec<R::Field> {
    let x = DVector::from_column_slice(x);
    let mut rx = x.clone_owned();
    r.eval(&x, &mut rx);
    rx.as_slice().to_vec()
}

/// Tests if given point is a root of the system, given the tolerance `eps` on
/// the residuals norm.
pub fn is_root<R: System>(r: &R, x: &[R::Field], eps: R::Field) -> bool {
    let norm = r.norm(&DVector::from_column_slice(x));
    norm.is_finite() && norm <= eps
}

/// Outcome of comparing a found solution against a reference answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceCheck {
    /// The found point matches the reference.
    Matches,
    /// The found point matches the reference with all components negated.
    /// Systems whose residuals are invariant under `x -> -x` have their roots
    /// in such pairs.
    MatchesNegated,
    /// The found point is a root, but a different one than the reference.
    DifferentRoot,
    /// The found point is not a root of the system.
    NotRoot,
    /// The reference itself is not a root of the system.
    ReferenceNotRoot,
}

/// Compares a found solution with a reference answer (for example, one
/// published next to an exercise).
///
/// Both points are checked against the residuals themselves, with tolerance
/// `eps` for the residuals norm and for the componentwise distance. A
/// mismatch is reported and logged, never corrected.
pub fn verify_reference<R: System>(
    r: &R,
    found: &[R::Field],
    reference: &[R::Field],
    eps: R::Field,
) -> ReferenceCheck {
    let close = |a: &[R::Field], b: &[R::Field], sign: R::Field| {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(ai, bi)| (*ai - sign * *bi).abs() <= eps)
    };

    let one = R::Field::one();

    let check = if !is_root(r, reference, eps) {
        ReferenceCheck::ReferenceNotRoot
    } else if !is_root(r, found, eps) {
        ReferenceCheck::NotRoot
    } else if close(found, reference, one) {
        ReferenceCheck::Matches
    } else if close(found, reference, -one) {
        ReferenceCheck::MatchesNegated
    } else {
        ReferenceCheck::DifferentRoot
    };

    if check != ReferenceCheck::Matches {
        warn!(
            "found point {:?} does not match reference {:?}: {:?}",
            found, reference, check
        );
    }

    check
}

/// Returns `n` evenly spaced points over the closed interval `[start, end]`.
pub fn linspace<T: RealField + Copy>(start: T, end: T, n: usize) -> Vec<T> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / convert::<_, T>((n - 1) as f64);
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        start + step * convert::<_, T>(i as f64)
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    use crate::testing::{Quadrics, SineRatio};

    #[test]
    fn residuals_in_root() {
        let r = SineRatio::new();
        let rx = residuals_at(&r, &[-std::f64::consts::PI, std::f64::consts::FRAC_PI_2]);

        assert_eq!(rx.len(), 2);
        assert_abs_diff_eq!(rx[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rx[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn undefined_residuals_are_not_root() {
        let r = SineRatio::new();
        assert!(!is_root(&r, &[1.0, 0.0], 1e-6));
    }

    #[test]
    fn reference_sign_flip_is_flagged() {
        let r = Quadrics::new();
        let reference = [1.60890092, -1.18803949, -0.76717806];
        let negated = [-1.60890092, 1.18803949, 0.76717806];

        assert_eq!(
            verify_reference(&r, &reference, &reference, 1e-6),
            ReferenceCheck::Matches
        );
        assert_eq!(
            verify_reference(&r, &negated, &reference, 1e-6),
            ReferenceCheck::MatchesNegated
        );
        assert_eq!(
            verify_reference(&r, &[1.0, 2.0, 1.0], &reference, 1e-6),
            ReferenceCheck::NotRoot
        );
        assert_eq!(
            verify_reference(&r, &reference, &[1.0, 2.0, 1.0], 1e-6),
            ReferenceCheck::ReferenceNotRoot
        );
    }

    #[test]
    fn linspace_endpoints() {
        let xs = linspace(-4.0, 3.0, 50);

        assert_eq!(xs.len(), 50);
        assert_eq!(xs[0], -4.0);
        assert_eq!(xs[49], 3.0);
        assert_abs_diff_eq!(xs[1] - xs[0], 7.0 / 49.0, epsilon = 1e-12);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 1.0, 1), vec![2.0]);
    }
}
