//! Benchmarks for the similarity pipeline
//!
//! Run with: cargo bench --package similarity
//!
//! Uses a synthetic ratings set with a long-tailed movie popularity so the
//! co-rating structure looks roughly like real data.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::RatingRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use similarity::{build, SimilarityEngine};

const USERS: u32 = 2_000;
const MOVIES: u32 = 5_000;
const RATINGS_PER_USER: usize = 40;

fn synthetic_ratings() -> Vec<RatingRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ratings = Vec::with_capacity(USERS as usize * RATINGS_PER_USER);

    for user_id in 1..=USERS {
        for _ in 0..RATINGS_PER_USER {
            // squaring skews picks toward low ids (the "popular" movies)
            let u: f64 = rng.random();
            let movie_id = (u * u * MOVIES as f64) as u32;
            let rating = rng.random_range(1..=10) as f32 / 2.0;
            ratings.push(RatingRecord::new(user_id, movie_id, rating));
        }
    }
    ratings
}

fn bench_build_matrix(c: &mut Criterion) {
    let ratings = synthetic_ratings();

    c.bench_function("build_rating_matrix", |b| {
        b.iter(|| {
            let built = build(black_box(&ratings)).unwrap();
            black_box(built)
        })
    });
}

fn bench_compute_similarity(c: &mut Criterion) {
    let ratings = synthetic_ratings();
    let (matrix, _) = build(&ratings).unwrap();
    let engine = SimilarityEngine::new();

    c.bench_function("compute_similarity", |b| {
        b.iter(|| {
            let similarity = engine.compute(black_box(&matrix));
            black_box(similarity)
        })
    });
}

criterion_group!(benches, bench_build_matrix, bench_compute_similarity);
criterion_main!(benches);
