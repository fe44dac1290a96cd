//! The movie x movie similarity matrix.
//!
//! Stored as an `sprs` CSR matrix indexed by raw movieId on both axes, so row
//! `i` holds the nonzero similarities of movie `i` in ascending movieId order
//! and the dimension is max(movieId) + 1 of the rating data.

use serde::{Deserialize, Serialize};
use sprs::{CsMat, CsVecView};

/// Square item-item similarity matrix indexed by raw movieId
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    inner: CsMat<f32>,
}

impl SimilarityMatrix {
    /// Wrap a square CSR matrix
    ///
    /// # Panics
    /// If `matrix` is not square or not in CSR storage.
    pub fn from_csr(matrix: CsMat<f32>) -> Self {
        assert_eq!(
            matrix.rows(),
            matrix.cols(),
            "similarity matrix must be square"
        );
        assert!(matrix.is_csr(), "similarity matrix must be stored as CSR");
        Self { inner: matrix }
    }

    /// Rows (= columns) of the matrix
    pub fn dimension(&self) -> usize {
        self.inner.rows()
    }

    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    /// similarity(i, j); zero for unrelated or out-of-range ids
    pub fn score(&self, i: usize, j: usize) -> f32 {
        if i >= self.dimension() || j >= self.dimension() {
            return 0.0;
        }
        self.inner.get(i, j).copied().unwrap_or(0.0)
    }

    /// Stored similarities of movie `i`, or `None` if out of range
    pub fn row(&self, i: usize) -> Option<CsVecView<'_, f32>> {
        self.inner.outer_view(i)
    }

    /// Scores of movie `i` against every movieId, or `None` if out of range
    pub fn row_scores(&self, i: usize) -> Option<Vec<f32>> {
        let row = self.row(i)?;
        let mut dense = vec![0.0; self.dimension()];
        for (j, &score) in row.iter() {
            dense[j] = score;
        }
        Some(dense)
    }

    /// Re-check the structure of a matrix that didn't come from
    /// [`from_csr`](Self::from_csr), such as one read back from disk.
    pub fn into_validated(self) -> Result<Self, String> {
        let shape = self.inner.shape();
        if shape.0 != shape.1 {
            return Err(format!(
                "similarity matrix is {}x{}, not square",
                shape.0, shape.1
            ));
        }
        if !self.inner.is_csr() {
            return Err("similarity matrix is not stored as CSR".to_string());
        }

        let (indptr, indices, data) = self.inner.into_raw_storage();
        CsMat::try_new(shape, indptr, indices, data)
            .map(|inner| Self { inner })
            .map_err(|(_, _, _, e)| e.to_string())
    }
}
