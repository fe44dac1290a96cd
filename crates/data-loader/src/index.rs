//! Loading both tables into memory.
//!
//! The ratings table and the metadata table are independent, so they are
//! parsed in parallel with `rayon::join`. Either failing aborts the load.

use crate::config::Config;
use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, instrument};

/// Raw inputs for one recommender run
#[derive(Debug)]
pub struct Dataset {
    pub ratings: Vec<RatingRecord>,
    pub catalog: MovieCatalog,
}

impl Dataset {
    /// Load the dataset named by `config`
    pub fn load(config: &Config) -> Result<Self> {
        Self::load_from_files(&config.ratings_file, &config.movies_file)
    }

    /// Load ratings and metadata from explicit paths
    #[instrument(
        skip_all,
        fields(ratings = %ratings_path.display(), movies = %movies_path.display())
    )]
    pub fn load_from_files(ratings_path: &Path, movies_path: &Path) -> Result<Self> {
        let (ratings, movies) = rayon::join(
            || parser::parse_ratings(ratings_path),
            || parser::parse_movies(movies_path),
        );

        let ratings = ratings?;
        let movies = movies?;
        let parsed_movies = movies.len();
        let catalog = MovieCatalog::from_movies(movies);

        info!(
            "Loaded {} ratings and {} movies ({} duplicate metadata rows dropped)",
            ratings.len(),
            catalog.len(),
            parsed_movies - catalog.len()
        );

        Ok(Self { ratings, catalog })
    }

    /// (ratings, movies) counts for logging and tests
    pub fn counts(&self) -> (usize, usize) {
        (self.ratings.len(), self.catalog.len())
    }
}
