//! Static plots of one-dimensional objective functions.
//!
//! Plotting the objective over an interval shows where it touches zero and
//! therefore where the roots of the original equation are. It also shows
//! toward which of them a minimizer started from a guess is going to slide.
//!
//! ```rust,no_run
//! use resmin::objective::Equation;
//! use resmin::plot::{plot_objective, PlotConfig};
//!
//! let f = Equation::new(|x: f64| x.powi(2) + x - 5.0);
//!
//! plot_objective(&f, -4.0..=3.0, 2.0, 1.79128785, "objective.svg", &PlotConfig::default())
//!     .unwrap();
//! ```

use std::ops::RangeInclusive;
use std::path::Path;

use log::debug;
use nalgebra::DVector;
use plotters::prelude::*;
use thiserror::Error;

use crate::{analysis::linspace, core::Function};

/// Appearance of the objective plot.
#[derive(Clone)]
pub struct PlotConfig {
    /// Image width in pixels (default: 800).
    pub width: u32,
    /// Image height in pixels (default: 600).
    pub height: u32,
    /// Plot title (default: "Objective function").
    pub title: String,
    /// X-axis label (default: "x").
    pub xlabel: String,
    /// Y-axis label (default: "S(x)").
    pub ylabel: String,
    /// Color of the objective curve (default: BLACK).
    pub line_color: RGBColor,
    /// Color of the zero line (default: RED).
    pub zero_color: RGBColor,
    /// Color of the initial guess marker (default: BLUE).
    pub guess_color: RGBColor,
    /// Color of the root marker (default: GREEN).
    pub root_color: RGBColor,
    /// Background color (default: WHITE).
    pub background: RGBColor,
    /// Line width in pixels (default: 2).
    pub line_width: u32,
    /// Number of points at which the objective is sampled (default: 50).
    pub samples: usize,
    /// Whether to show grid lines (default: true).
    pub show_grid: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: String::from("Objective function"),
            xlabel: String::from("x"),
            ylabel: String::from("S(x)"),
            line_color: BLACK,
            zero_color: RED,
            guess_color: BLUE,
            root_color: GREEN,
            background: WHITE,
            line_width: 2,
            samples: 50,
            show_grid: true,
        }
    }
}

/// Error returned from [`plot_objective`].
#[derive(Debug, Error)]
pub enum PlotError {
    /// The plotted interval is empty or not finite, or there are less than
    /// two samples.
    #[error("invalid range or number of samples")]
    InvalidRange,
    /// Only functions of one variable can be plotted.
    #[error("function has {0} variables, only one is supported")]
    NotUnivariate(usize),
    /// The drawing backend failed.
    #[error("drawing failed: {0}")]
    Drawing(String),
}

fn drawing<E: std::fmt::Display>(error: E) -> PlotError {
    PlotError::Drawing(error.to_string())
}

/// Number of dashes of the zero line.
const DASHES: usize = 40;

/// Plots the objective `f` over `range` into an SVG file at `path`.
///
/// Besides the objective curve, the plot contains a dashed zero line and
/// markers for the initial `guess` and the found `root`. Points where the
/// objective is undefined are left out of the curve.
pub fn plot_objective<F, P>(
    f: &F,
    range: RangeInclusive<f64>,
    guess: f64,
    root: f64,
    path: P,
    config: &PlotConfig,
) -> Result<(), PlotError>
where
    F: Function<Field = f64>,
    P: AsRef<Path>,
{
    let dim = f.domain().dim();
    if dim != 1 {
        return Err(PlotError::NotUnivariate(dim));
    }

    let (start, end) = range.into_inner();
    if !start.is_finite() || !end.is_finite() || start >= end || config.samples < 2 {
        return Err(PlotError::InvalidRange);
    }

    let value = |x: f64| f.apply(&DVector::from_element(1, x));

    let runs = finite_runs(
        linspace(start, end, config.samples)
            .into_iter()
            .map(|x| (x, value(x))),
    );
    let defined = runs.iter().map(Vec::len).sum::<usize>();

    // The zero line is always visible.
    let max_value = runs.iter().flatten().map(|(_, y)| *y).fold(0.0, f64::max);
    let max_value = if max_value > 0.0 { max_value } else { 1.0 };

    debug!(
        "plotting {} of {} samples in {} pieces on [{}, {}] into {}",
        defined,
        config.samples,
        runs.len(),
        start,
        end,
        path.as_ref().display()
    );

    let root_area =
        SVGBackend::new(path.as_ref(), (config.width, config.height)).into_drawing_area();
    root_area.fill(&config.background).map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root_area)
        .caption(&config.title, ("sans-serif", 30).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(start..end, (-0.05 * max_value)..(1.1 * max_value))
        .map_err(drawing)?;

    if config.show_grid {
        chart
            .configure_mesh()
            .x_desc(&config.xlabel)
            .y_desc(&config.ylabel)
            .draw()
            .map_err(drawing)?;
    }

    // The curve is not joined across the points where it is undefined.
    let line_color = config.line_color;
    let line_style = ShapeStyle::from(&line_color).stroke_width(config.line_width);
    chart
        .draw_series(runs.into_iter().map(|run| PathElement::new(run, line_style)))
        .map_err(drawing)?
        .label(config.ylabel.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color));

    // Every other segment of the interval is drawn.
    let zero_color = config.zero_color;
    let dash = (end - start) / (2 * DASHES) as f64;
    chart
        .draw_series((0..DASHES).map(|i| {
            let a = start + (2 * i) as f64 * dash;
            PathElement::new(vec![(a, 0.0), (a + dash, 0.0)], zero_color)
        }))
        .map_err(drawing)?
        .label("zero")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], zero_color));

    for (label, x, color) in [
        ("initial guess", guess, config.guess_color),
        ("root", root, config.root_color),
    ] {
        let y = value(x);
        let y = if y.is_finite() { y } else { 0.0 };

        chart
            .draw_series(std::iter::once(Circle::new((x, y), 5, color.filled())))
            .map_err(drawing)?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(drawing)?;

    root_area.present().map_err(drawing)?;

    Ok(())
}

/// Splits the sampled curve into maximal runs of finite values.
fn finite_runs(points: impl Iterator<Item = (f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut run = Vec::new();

    for (x, y) in points {
        if y.is_finite() {
            run.push((x, y));
        } else if !run.is_empty() {
            runs.push(std::mem::take(&mut run));
        }
    }

    if !run.is_empty() {
        runs.push(run);
    }

    runs
}
