//! # Recommendation Orchestrator
//!
//! Wires the whole run together:
//! 1. Load ratings and movie metadata
//! 2. Build the rating matrix
//! 3. Fingerprint the inputs
//! 4. Load the similarity matrix from the cache, or compute and save it
//! 5. Answer queries against the result
//!
//! Steps 1-4 happen once in [`ItemRecommender::prepare`]; any failure there
//! aborts the run. Queries afterwards are cheap and their "not found"
//! outcomes are ordinary return values.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use data_loader::{Config, Dataset, MovieCatalog};
use similarity::{
    build, CacheStatus, CodedRatings, Fingerprint, SimilarityCache, SimilarityEngine,
    SimilarityMatrix,
};

use crate::error::RecommendError;
use crate::query::{recommend, Recommendation};

/// Everything needed to answer similarity queries for one dataset
#[derive(Debug)]
pub struct ItemRecommender {
    catalog: MovieCatalog,
    ratings: CodedRatings,
    similarity: SimilarityMatrix,
    cache_status: CacheStatus,
}

impl ItemRecommender {
    /// Load the dataset named by `config` and get a similarity matrix for it.
    ///
    /// With `force_recompute` the cache is ignored and overwritten.
    pub fn prepare(config: &Config, force_recompute: bool) -> Result<Self> {
        let start = Instant::now();
        info!("Loading dataset from {}", config.dataset_path.display());

        let dataset = Dataset::load(config).with_context(|| {
            format!(
                "Failed to load dataset from {}",
                config.dataset_path.display()
            )
        })?;
        info!("Loaded dataset in {:?}", start.elapsed());

        Self::from_dataset(dataset, config, force_recompute)
    }

    /// Same as [`prepare`](Self::prepare) for an already loaded dataset
    pub fn from_dataset(
        dataset: Dataset,
        config: &Config,
        force_recompute: bool,
    ) -> Result<Self> {
        let Dataset { ratings, catalog } = dataset;

        let (matrix, coded) = build(&ratings).context("Failed to build rating matrix")?;
        drop(ratings);
        info!(
            "Rating matrix: {} users x {} movieId columns",
            matrix.num_users(),
            matrix.num_columns()
        );

        let fingerprint = Fingerprint::of_inputs(&config.ratings_file, &matrix)
            .context("Failed to fingerprint ratings")?;
        let cache = SimilarityCache::new(&config.cache_file);

        let start = Instant::now();
        let (similarity, cache_status) =
            cache.load_or_compute(force_recompute, &fingerprint, || {
                SimilarityEngine::new().compute(&matrix)
            });
        info!(
            "Similarity matrix ready in {:?} ({:?})",
            start.elapsed(),
            cache_status
        );

        Ok(Self {
            catalog,
            ratings: coded,
            similarity,
            cache_status,
        })
    }

    /// The `top_n` movies most similar to `title`
    pub fn recommend(
        &self,
        title: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        recommend(title, &self.similarity, &self.ratings, &self.catalog, top_n)
    }

    /// Whether the similarity matrix came from the cache or was recomputed
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }
}
