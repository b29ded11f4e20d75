use criterion::{black_box, criterion_group, criterion_main, Criterion};
use numopt_math::array::Array;
use numopt_math::optimize::bfgs::{Bfgs, BfgsConfig};
use numopt_math::optimize::cg::{ConjugateGradient, ConjugateGradientConfig};
use numopt_math::optimize::nelder_mead::{NelderMead, NelderMeadConfig};
use numopt_math::optimize::{GradientAwareMinimizer, Minimizer};

fn rosenbrock(x: &Array) -> f64 {
    let a = 1.0 - x[0];
    let b = x[1] - x[0] * x[0];
    a * a + 100.0 * b * b
}

fn rosenbrock_grad(x: &Array) -> Array {
    let dx0 = -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]);
    let dx1 = 200.0 * (x[1] - x[0] * x[0]);
    Array::from_slice(&[dx0, dx1])
}

fn bench_nelder_mead(c: &mut Criterion) {
    let cfg = NelderMeadConfig::default();
    c.bench_function("nelder_mead/rosenbrock", |b| {
        b.iter(|| {
            let x0 = Array::from_slice(&[-1.2, 1.0]);
            black_box(NelderMead.minimize(&rosenbrock, &x0, &cfg).unwrap())
        })
    });
}

fn bench_bfgs(c: &mut Criterion) {
    let cfg = BfgsConfig::default();
    c.bench_function("bfgs/rosenbrock", |b| {
        b.iter(|| {
            let x0 = Array::from_slice(&[-1.2, 1.0]);
            black_box(
                Bfgs
                    .minimize_with_gradient(&rosenbrock, &rosenbrock_grad, &x0, &cfg)
                    .unwrap(),
            )
        })
    });
}

fn bench_conjugate_gradient(c: &mut Criterion) {
    let cfg = ConjugateGradientConfig::default();
    c.bench_function("conjugate_gradient/rosenbrock", |b| {
        b.iter(|| {
            let x0 = Array::from_slice(&[-1.2, 1.0]);
            black_box(
                ConjugateGradient
                    .minimize_with_gradient(&rosenbrock, &rosenbrock_grad, &x0, &cfg)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_nelder_mead,
    bench_bfgs,
    bench_conjugate_gradient
);
criterion_main!(benches);
