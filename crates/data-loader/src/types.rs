//! Core domain types for the movies dataset.
//!
//! Two tables feed the recommender:
//! - ratings: one row per (user, movie) rating
//! - movie metadata: title, genres and vote statistics per movie
//!
//! Identifiers are kept exactly as they appear in the source data. In
//! particular `MovieId` is NOT re-coded into a dense range; the similarity
//! matrix is indexed by it directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// External identifier of a user, as found in `ratings.csv`
pub type UserId = u32;

/// External identifier of a movie, shared by `ratings.csv` and the metadata table
pub type MovieId = u32;

// =============================================================================
// Rating Type
// =============================================================================

/// A single rating row.
///
/// `movie_id` is `None` when the raw field was not a non-negative integer.
/// Such rows are kept so the matrix builder can count and report them, but
/// they never contribute to the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub movie_id: Option<MovieId>,
    pub rating: f32,
    /// Unix timestamp when rating was made (optional column)
    pub timestamp: Option<i64>,
}

impl RatingRecord {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f32) -> Self {
        Self {
            user_id,
            movie_id: Some(movie_id),
            rating,
            timestamp: None,
        }
    }
}

// =============================================================================
// Movie Metadata
// =============================================================================

/// Metadata for one movie, joined onto recommendation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub movie_id: MovieId,
    pub title: String,
    /// Genre names, in the order they appear in the source row
    pub genres: Vec<String>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
}

impl MovieMetadata {
    /// Genre names joined with ", " (empty string when there are none)
    pub fn genres_joined(&self) -> String {
        self.genres.join(", ")
    }
}

// =============================================================================
// MovieCatalog - metadata lookups
// =============================================================================

/// All movie metadata with id and title indices.
///
/// The source table contains duplicate ids and duplicate titles. Duplicate
/// ids keep the first row inserted; duplicate titles resolve to the lowest
/// movieId so lookups don't depend on row order.
#[derive(Debug, Default)]
pub struct MovieCatalog {
    movies: HashMap<MovieId, MovieMetadata>,
    /// Exact title -> every movieId carrying it, sorted ascending
    title_index: HashMap<String, Vec<MovieId>>,
}

impl MovieCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from parsed rows
    pub fn from_movies(movies: impl IntoIterator<Item = MovieMetadata>) -> Self {
        let mut catalog = Self::new();
        for movie in movies {
            catalog.insert(movie);
        }
        catalog
    }

    /// Insert a movie. Returns `false` if the id was already present
    /// (the existing row is kept).
    pub fn insert(&mut self, movie: MovieMetadata) -> bool {
        if self.movies.contains_key(&movie.movie_id) {
            return false;
        }

        let ids = self.title_index.entry(movie.title.clone()).or_default();
        if let Err(pos) = ids.binary_search(&movie.movie_id) {
            ids.insert(pos, movie.movie_id);
        }

        self.movies.insert(movie.movie_id, movie);
        true
    }

    pub fn get(&self, movie_id: MovieId) -> Option<&MovieMetadata> {
        self.movies.get(&movie_id)
    }

    /// Resolve an exact title to a single movie (lowest movieId on ties).
    ///
    /// Matching is byte-for-byte against the title as stored: no trimming,
    /// no case folding.
    pub fn find_by_title(&self, title: &str) -> Option<&MovieMetadata> {
        self.title_index
            .get(title)
            .and_then(|ids| ids.first())
            .and_then(|id| self.movies.get(id))
    }

    /// Every movieId that carries this exact title, ascending
    pub fn ids_for_title(&self, title: &str) -> &[MovieId] {
        self.title_index
            .get(title)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
