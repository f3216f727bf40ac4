use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resmin::{nalgebra as na, solve, testing::*, Method, SolveOptions, System};

const METHODS: [(Method, &str); 2] = [
    (Method::QuasiNewton, "quasi-Newton"),
    (Method::NelderMead, "Nelder-Mead"),
];

fn bench_system<R>(c: &mut Criterion, name: &str, r: &R)
where
    R: TestSystem<Field = f64>,
{
    for (i, x0) in r.initials().iter().enumerate() {
        for (method, method_name) in METHODS {
            let mut options = SolveOptions::default();
            options.set_method(method);

            c.bench_function(&format!("{} {} {}", method_name, name, i + 1), |b| {
                b.iter(|| black_box(solve(r, black_box(x0.as_slice()), &options)))
            });
        }
    }
}

fn quadratic(c: &mut Criterion) {
    bench_system(c, "quadratic", &Quadratic::new());
}

fn sine_ratio(c: &mut Criterion) {
    bench_system(c, "sine ratio", &SineRatio::new());
}

fn quadrics(c: &mut Criterion) {
    bench_system(c, "quadrics", &Quadrics::new());
}

fn rosenbrock(c: &mut Criterion) {
    bench_system(c, "rosenbrock", &ExtendedRosenbrock::new(2));
}

fn objective_eval(c: &mut Criterion) {
    let r = Quadrics::new();
    let x = na::dvector![1.0, 2.0, 1.0];

    c.bench_function("quadrics sum of squares", |b| {
        b.iter(|| black_box(r.norm_squared(black_box(&x))))
    });
}

criterion_group!(
    methods,
    quadratic,
    sine_ratio,
    quadrics,
    rosenbrock,
    objective_eval
);
criterion_main!(methods);
