use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hiveforge::objectives::{BenchmarkFunction, BenchmarkObjective};
use hiveforge::optimizer::{
    Bounds, EvaluationPool, Hyperparameters, PhaseEngine, RandomSampler, SelectionSampler,
};
use std::hint::black_box;
use std::sync::Arc;

fn setup_engine(n_var: usize, n_pop: usize) -> PhaseEngine {
    let params = Hyperparameters {
        n_pop,
        n_onlooker: n_pop,
        trial_limit: Hyperparameters::default_trial_limit(n_var, n_pop),
        accel: 1.0,
        bounds: Bounds::uniform(n_var, -5.12, 5.12).expect("valid bounds"),
        max_iterations: 1_000,
    };
    let pool = EvaluationPool::new(0, None).expect("Failed to build pool");
    PhaseEngine::new(
        params,
        pool,
        Arc::new(BenchmarkObjective::new(BenchmarkFunction::Sphere)),
    )
    .expect("Failed to build engine")
}

fn criterion_benchmark(c: &mut Criterion) {
    let engine = setup_engine(10, 50);
    let mut sampler = RandomSampler::new(Some(1));
    let initial = engine.initialize(&mut sampler).expect("initial colony");

    // Each sample starts from the initial colony so history does not grow.
    c.bench_function("iterate (sphere, 10-d, 50 bees)", |b| {
        b.iter_batched(
            || initial.clone(),
            |mut state| engine.iterate(black_box(&mut state), &mut sampler),
            BatchSize::SmallInput,
        )
    });

    let costs: Vec<f64> = (0..200).map(|i| (i as f64).sqrt()).collect();
    let mean = costs.iter().sum::<f64>() / costs.len() as f64;
    c.bench_function("selection wheel (200 slots)", |b| {
        b.iter(|| {
            let wheel = SelectionSampler::new(black_box(&costs), mean).expect("wheel");
            wheel.draw(&mut sampler)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
