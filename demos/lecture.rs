use std::error::Error;

use resmin::analysis::{verify_reference, ReferenceCheck};
use resmin::objective::{Equation, Residuals};
use resmin::plot::{plot_objective, PlotConfig};
use resmin::{solve, SolveOptions};

// x^2 + x - 5 = 0
fn quadratic(x: f64) -> f64 {
    x.powi(2) + x - 5.0
}

fn single_equation(plot_path: &str) -> Result<(), Box<dyn Error>> {
    let r = Equation::new(quadratic);
    let guess = 2.0;

    let solution = solve(&r, &[guess], &SolveOptions::default())?;
    let x1 = solution.x[0];

    println!("Example 1");
    println!("guess = {}", guess);
    println!("x = {:?}", solution.x);
    println!("objective function = {}", r.objective(x1));

    plot_objective(&r, -4.0..=3.0, guess, x1, plot_path, &PlotConfig::default())?;
    println!("objective plotted into {}", plot_path);

    // The other root is in the basin of a different guess.
    let guess = -3.0;
    let solution = solve(&r, &[guess], &SolveOptions::default())?;

    println!("Practice 1");
    println!("guess = {}", guess);
    println!("x = {:?} (answer -2.79128785)", solution.x);

    Ok(())
}

fn sine_ratio() -> Result<(), Box<dyn Error>> {
    // x0 + 2 x1 = 0
    // sin(x0) / x1 = 0
    let r = Residuals::new(|x: &[f64]| [x[0] + 2.0 * x[1], x[0].sin() / x[1]]);
    let guess = [1.0, 2.0];

    let solution = solve(&r, &guess, &SolveOptions::default())?;

    println!("Example 2");
    println!("guess = {:?}", guess);
    println!("(y, z) = {:?}", solution.x);
    println!("objective function = {}", solution.objective);
    println!("{} after {} iterations", solution.termination, solution.iters);

    Ok(())
}

fn three_quadrics() -> Result<(), Box<dyn Error>> {
    // x^2 + y^2 = 4
    // xy + yz = -1
    // y^2 + z^2 = 2
    let r = Residuals::new(|x: &[f64]| {
        [
            x[0].powi(2) + x[1].powi(2) - 4.0,
            x[0] * x[1] + x[1] * x[2] + 1.0,
            x[1].powi(2) + x[2].powi(2) - 2.0,
        ]
    });
    let guess = [1.0, 2.0, 1.0];
    let answer = [1.60890092, -1.18803949, -0.76717806];

    let solution = solve(&r, &guess, &SolveOptions::default())?;

    println!("Practice 2");
    println!("guess = {:?}", guess);
    println!("(x, y, z) = {:?}", solution.x);
    println!("residuals = {:?}", solution.residuals);

    match verify_reference(&r, &solution.x, &answer, 1e-5) {
        ReferenceCheck::Matches => println!("matches the answer {:?}", answer),
        ReferenceCheck::MatchesNegated => {
            println!("matches the answer {:?} with flipped signs", answer)
        }
        other => println!("does not match the answer {:?}: {:?}", answer, other),
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let plot_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("lecture_objective.svg"));

    single_equation(&plot_path)?;
    println!();
    sine_ratio()?;
    println!();
    three_quadrics()?;

    Ok(())
}
