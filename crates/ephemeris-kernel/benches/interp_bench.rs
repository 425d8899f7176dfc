use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ephemeris_kernel::interp::chebyshev_with_derivative;

fn bench_record_interpolation(c: &mut Criterion) {
    // DE-series planet records carry 13-coefficient series per axis.
    let coeffs: Vec<f64> = (0..13).map(|k| 0.8_f64.powi(k) * if k % 2 == 0 { 1.0 } else { -1.0 }).collect();

    c.bench_function("chebyshev_13_with_derivative", |b| {
        b.iter(|| chebyshev_with_derivative(black_box(&coeffs), black_box(0.42)))
    });

    c.bench_function("chebyshev_three_axes", |b| {
        b.iter(|| {
            let mut out = [(0.0, 0.0); 3];
            for axis in 0..3 {
                out[axis] = chebyshev_with_derivative(black_box(&coeffs), black_box(-0.17));
            }
            out
        })
    });
}

criterion_group!(benches, bench_record_interpolation);
criterion_main!(benches);
