//! Item-based recommendations for a movie title.
//!
//! This crate contains the query engine and the orchestrator that prepares
//! its inputs (dataset, rating matrix, cached similarity matrix).

pub mod error;
pub mod orchestrator;
pub mod query;

pub use error::RecommendError;
pub use orchestrator::ItemRecommender;
pub use query::{rank_similar, recommend, Recommendation, NOT_AVAILABLE};
