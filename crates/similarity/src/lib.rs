//! # Similarity Crate
//!
//! Item-based collaborative filtering core: from raw ratings to a cached
//! movie x movie cosine similarity matrix.
//!
//! ## Components
//!
//! ### Rating Matrix Builder (`builder`)
//! Encodes userIds into dense row codes and lays ratings out as a sparse
//! users x movieIds matrix. movieIds are used verbatim as column indices.
//!
//! ### Similarity Engine (`engine`)
//! Cosine similarity between every pair of movie columns, computed row by
//! row in parallel without ever densifying the N x N result.
//!
//! ### Similarity Cache (`cache`)
//! Persists the similarity matrix with a fingerprint of its inputs and
//! reloads it when the inputs haven't changed.
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{build, Fingerprint, SimilarityCache, SimilarityEngine};
//!
//! let (matrix, coded) = build(&dataset.ratings)?;
//! let fingerprint = Fingerprint::of_inputs(&config.ratings_file, &matrix)?;
//! let cache = SimilarityCache::new(&config.cache_file);
//!
//! let (similarity, status) = cache.load_or_compute(false, &fingerprint, || {
//!     SimilarityEngine::new().compute(&matrix)
//! });
//! ```

// Public modules
pub mod builder;
pub mod cache;
pub mod engine;
pub mod error;
pub mod matrix;

// Re-export commonly used types
pub use builder::{build, CodedRating, CodedRatings, RatingMatrix, UserCodes};
pub use cache::{CacheLookup, CacheStatus, Fingerprint, RecomputeReason, SimilarityCache};
pub use engine::SimilarityEngine;
pub use error::{BuildError, CacheError};
pub use matrix::SimilarityMatrix;
