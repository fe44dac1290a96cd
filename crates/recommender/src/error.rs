//! Query outcomes that aren't recommendations.
//!
//! Both variants are ordinary results of a lookup, not failures of the
//! system; callers are expected to report them and carry on.

use data_loader::MovieId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// No metadata row has this exact title
    #[error("Movie '{title}' not found.")]
    MovieNotFound { title: String },

    /// The movie exists in the metadata but no rating mentions it
    #[error("Movie '{title}' does not have enough ratings.")]
    InsufficientRatings { title: String, movie_id: MovieId },
}
