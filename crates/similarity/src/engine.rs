//! Item-item cosine similarity.
//!
//! ## Algorithm
//! Each movie's feature vector is its column of the rating matrix (one entry
//! per user). With every column scaled to unit length, similarity(i, j) is
//! the dot product of columns i and j, and only users who rated both movies
//! contribute to it.
//!
//! 1. Compute column norms and scale both the matrix (user -> movies) and
//!    its transpose (movie -> users) by them
//! 2. For each movie i, in parallel: for each user u who rated i, for each
//!    movie j rated by u, accumulate a(u,i) * a(u,j)
//! 3. Emit the touched entries of row i in ascending movieId order
//!
//! Entry (i, j) and entry (j, i) add up the same products in the same
//! (ascending user) order, so the result is exactly symmetric and identical
//! from run to run. Movies without ratings have a zero norm and an empty row.

use crate::builder::RatingMatrix;
use crate::matrix::SimilarityMatrix;
use rayon::prelude::*;
use sprs::CsMat;
use std::time::Instant;
use tracing::{info, instrument};

/// Computes the similarity matrix from a rating matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine;

impl SimilarityEngine {
    pub fn new() -> Self {
        Self
    }

    /// Cosine similarity between all movie columns of `ratings`
    pub fn compute(&self, ratings: &RatingMatrix) -> SimilarityMatrix {
        self.compute_sparse(ratings.matrix())
    }

    /// Cosine similarity between all columns of a users x items CSR matrix.
    ///
    /// The result is `cols x cols`.
    #[instrument(skip_all, fields(users = matrix.rows(), columns = matrix.cols()))]
    pub fn compute_sparse(&self, matrix: &CsMat<f32>) -> SimilarityMatrix {
        debug_assert!(matrix.is_csr());
        let start = Instant::now();
        let n = matrix.cols();

        let by_item: CsMat<f32> = matrix.transpose_view().to_csr();
        let norms = row_norms(&by_item);

        let user_rows = ScaledRows::new(matrix, |_, item| norms[item]);
        let item_rows = ScaledRows::new(&by_item, |item, _| norms[item]);

        let rows: Vec<(Vec<usize>, Vec<f32>)> = (0..n)
            .into_par_iter()
            .map_init(
                || Accumulator::new(n),
                |acc, item| {
                    if norms[item] == 0.0 {
                        return (Vec::new(), Vec::new());
                    }
                    let (users, a_users) = item_rows.row(item);
                    for (&user, &a) in users.iter().zip(a_users) {
                        let (items, b_items) = user_rows.row(user as usize);
                        for (&other, &b) in items.iter().zip(b_items) {
                            acc.add(other, a * b);
                        }
                    }
                    acc.drain()
                },
            )
            .collect();

        let nnz = rows.iter().map(|(indices, _)| indices.len()).sum();
        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);
        indptr.push(0);
        for (row_indices, row_values) in rows {
            indices.extend(row_indices);
            data.extend(row_values);
            indptr.push(indices.len());
        }

        let similarity = SimilarityMatrix::from_csr(CsMat::new((n, n), indptr, indices, data));
        info!(
            "Computed {}x{} similarity matrix ({} nonzeros) in {:?}",
            n,
            n,
            similarity.nnz(),
            start.elapsed()
        );
        similarity
    }
}

/// L2 norm of every row of `by_item` (= every column of the rating matrix)
fn row_norms(by_item: &CsMat<f32>) -> Vec<f64> {
    by_item
        .outer_iterator()
        .map(|ratings| {
            ratings
                .iter()
                .map(|(_, &v)| (v as f64) * (v as f64))
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}

/// Row-major copy of a CSR matrix with every value divided by a norm, in f64
struct ScaledRows {
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl ScaledRows {
    /// `norm(row, col)` gives the divisor for each stored entry
    fn new(matrix: &CsMat<f32>, norm: impl Fn(usize, usize) -> f64) -> Self {
        let mut indptr = Vec::with_capacity(matrix.rows() + 1);
        let mut indices = Vec::with_capacity(matrix.nnz());
        let mut values = Vec::with_capacity(matrix.nnz());
        indptr.push(0);

        for (row, vector) in matrix.outer_iterator().enumerate() {
            for (col, &value) in vector.iter() {
                let divisor = norm(row, col);
                indices.push(col as u32);
                values.push(if divisor == 0.0 {
                    0.0
                } else {
                    value as f64 / divisor
                });
            }
            indptr.push(indices.len());
        }

        Self {
            indptr,
            indices,
            values,
        }
    }

    fn row(&self, i: usize) -> (&[u32], &[f64]) {
        let span = self.indptr[i]..self.indptr[i + 1];
        (&self.indices[span.clone()], &self.values[span])
    }
}

/// Dense scratch row reused across items on one worker thread
struct Accumulator {
    sums: Vec<f64>,
    touched: Vec<u32>,
    seen: Vec<bool>,
}

impl Accumulator {
    fn new(n: usize) -> Self {
        Self {
            sums: vec![0.0; n],
            touched: Vec::new(),
            seen: vec![false; n],
        }
    }

    fn add(&mut self, j: u32, value: f64) {
        let slot = j as usize;
        if !self.seen[slot] {
            self.seen[slot] = true;
            self.touched.push(j);
        }
        self.sums[slot] += value;
    }

    /// Take the accumulated row (ascending index, zeros dropped) and reset
    fn drain(&mut self) -> (Vec<usize>, Vec<f32>) {
        self.touched.sort_unstable();
        let mut indices = Vec::with_capacity(self.touched.len());
        let mut values = Vec::with_capacity(self.touched.len());

        for &j in &self.touched {
            let slot = j as usize;
            let value = self.sums[slot] as f32;
            if value != 0.0 {
                indices.push(slot);
                values.push(value);
            }
            self.sums[slot] = 0.0;
            self.seen[slot] = false;
        }
        self.touched.clear();

        (indices, values)
    }
}
