use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use skymatch::matcher::Matcher;

fn sphere_points(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut state = seed;
    let mut rng = || -> f64 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state as f64) / (u64::MAX as f64)
    };
    let ra: Vec<f64> = (0..n).map(|_| rng() * 360.0).collect();
    let dec: Vec<f64> = (0..n)
        .map(|_| (rng() * 2.0 - 1.0).asin().to_degrees())
        .collect();
    (ra, dec)
}

fn bench_match(c: &mut Criterion) {
    let (ra1, dec1) = sphere_points(1_000, 1);
    let radii = vec![0.5; 1_000];
    let (ra2, dec2) = sphere_points(10_000, 2);

    c.bench_function("match_1k_x_10k_unbounded", |b| {
        let mut matcher =
            Matcher::new(128, &ra1, &dec1, &radii).expect("failed to build benchmark catalog");
        b.iter(|| {
            matcher
                .match_points(0, false, &ra2, &dec2)
                .expect("match failed");
            black_box(matcher.nmatches());
        })
    });

    c.bench_function("match_1k_x_10k_maxmatch1", |b| {
        let mut matcher =
            Matcher::new(128, &ra1, &dec1, &radii).expect("failed to build benchmark catalog");
        b.iter(|| {
            matcher
                .match_points(1, false, &ra2, &dec2)
                .expect("match failed");
            black_box(matcher.nmatches());
        })
    });
}

criterion_group!(benches, bench_match);
criterion_main!(benches);
