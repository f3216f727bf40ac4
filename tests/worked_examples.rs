use approx::assert_abs_diff_eq;
use resmin::{
    analysis::{linspace, verify_reference, ReferenceCheck},
    objective::{sum_of_squares, Equation, Residuals},
    solve, Method, SolveOptions, Termination,
};

#[test]
fn quadratic_equation() {
    let r = Equation::new(|x: f64| x.powi(2) + x - 5.0);
    let options = SolveOptions::default();

    for (guess, root) in [(2.0, 1.79128785), (-3.0, -2.79128785)] {
        let solution = solve(&r, &[guess], &options).unwrap();

        assert_eq!(solution.termination, Termination::Converged);
        assert_abs_diff_eq!(solution.x[0], root, epsilon = 1e-6);
        assert_abs_diff_eq!(r.residual(solution.x[0]), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn sine_ratio_system() {
    let r = Residuals::new(|x: &[f64]| [x[0] + 2.0 * x[1], x[0].sin() / x[1]]);
    let solution = solve(&r, &[1.0, 2.0], &SolveOptions::default()).unwrap();

    assert_eq!(solution.termination, Termination::Converged);
    assert_abs_diff_eq!(solution.residuals[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.residuals[1], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.objective, 0.0, epsilon = 1e-12);
}

#[test]
fn three_quadrics_system() {
    let r = Residuals::new(|x: &[f64]| {
        [
            x[0].powi(2) + x[1].powi(2) - 4.0,
            x[0] * x[1] + x[1] * x[2] + 1.0,
            x[1].powi(2) + x[2].powi(2) - 2.0,
        ]
    });
    let reference = [1.60890092, -1.18803949, -0.76717806];

    let solution = solve(&r, &[1.0, 2.0, 1.0], &SolveOptions::default()).unwrap();

    assert_eq!(solution.termination, Termination::Converged);
    for ri in &solution.residuals {
        assert_abs_diff_eq!(*ri, 0.0, epsilon = 1e-5);
    }

    // The roots come in pairs of opposite points and the default minimizer
    // finds the other one of the pair.
    assert_eq!(
        verify_reference(&r, &solution.x, &reference, 1e-5),
        ReferenceCheck::MatchesNegated
    );
}

#[test]
fn same_input_same_output() {
    let r = Equation::new(|x: f64| x.powi(2) + x - 5.0);

    for method in [Method::QuasiNewton, Method::NelderMead] {
        let mut options = SolveOptions::default();
        options.set_method(method);

        let first = solve(&r, &[2.0], &options).unwrap();
        let second = solve(&r, &[2.0], &options).unwrap();

        assert_eq!(first, second);
    }
}

#[test]
fn objective_is_non_negative() {
    let equation = Equation::new(|x: f64| x.powi(2) + x - 5.0);
    let objective = sum_of_squares(|x: &[f64]| [x[0] + 2.0 * x[1], x[0].sin() / x[1]]);

    for x in linspace(-4.0, 3.0, 50) {
        assert!(equation.objective(x) >= 0.0);

        for y in linspace(-3.0, 3.0, 7) {
            let value = objective(&[x, y]);
            assert!(value >= 0.0 || value.is_nan());
        }
    }

    assert_eq!(equation.objective(0.0), 25.0);
    // (0 + 2)^2 + (sin(0) / 1)^2
    assert_eq!(objective(&[0.0, 1.0]), 4.0);

    let root = [std::f64::consts::PI, -std::f64::consts::FRAC_PI_2];
    assert_abs_diff_eq!(objective(&root), 0.0, epsilon = 1e-12);
}
