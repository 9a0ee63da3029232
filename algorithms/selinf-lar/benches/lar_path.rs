use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use ndarray_rand::rand::{rngs::SmallRng, SeedableRng};
use selinf::benchmarks::config;
use selinf::traits::Fit;
use selinf_datasets::generate::sparse_regression;
use selinf_lar::LarParams;

fn bench(c: &mut Criterion) {
    let mut benchmark = c.benchmark_group("lar_path");
    config::set_default_benchmark_configs(&mut benchmark);
    let mut rng = SmallRng::seed_from_u64(42);

    for (nsamples, nfeatures) in [(100, 10), (200, 50), (500, 100)] {
        let mut beta = Array1::zeros(nfeatures);
        beta.slice_mut(ndarray::s![..5]).fill(2.0);
        let dataset = sparse_regression(nsamples, &beta, 1.0, &mut rng);
        let params = LarParams::new();

        benchmark.bench_function(
            BenchmarkId::new("complete path", format!("{nfeatures}x{nsamples}")),
            |bencher| {
                bencher.iter(|| params.fit(black_box(&dataset)).unwrap());
            },
        );
    }

    benchmark.finish();
}

#[cfg(not(target_os = "windows"))]
criterion_group! {
    name = benches;
    config = config::get_default_profiling_configs();
    targets = bench
}
#[cfg(target_os = "windows")]
criterion_group!(benches, bench);

criterion_main!(benches);
