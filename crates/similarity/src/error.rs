//! Error types for matrix building and the similarity cache.

use thiserror::Error;

/// Errors from building the rating matrix
#[derive(Error, Debug)]
pub enum BuildError {
    /// Nothing left to build a matrix from once invalid ids are dropped
    #[error("No ratings with a valid movieId")]
    NoRatings,
}

/// Errors from reading or writing the similarity cache.
///
/// A cache file that exists but can't be decoded is not an error; see
/// [`crate::cache::CacheLookup::Corrupt`].
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize similarity matrix to {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: bincode::Error,
    },
}

/// Convenience type alias for matrix building
pub type Result<T> = std::result::Result<T, BuildError>;
