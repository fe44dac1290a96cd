//! # Data Loader Crate
//!
//! This crate reads "The Movies Dataset" (ratings + movie metadata) into memory.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (RatingRecord, MovieMetadata, MovieCatalog)
//! - **parser**: Parse the CSV tables into Rust structs
//! - **index**: Load both tables into a `Dataset`
//! - **config**: Resolve where the dataset lives
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Config, Dataset};
//! use std::path::Path;
//!
//! let config = Config::resolve(None, Path::new("config.json"))?;
//! let dataset = Dataset::load(&config)?;
//!
//! let toy_story = dataset.catalog.find_by_title("Toy Story").unwrap();
//! println!("{} -> {}", toy_story.title, toy_story.genres_joined());
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{DataLoadError, Result};
pub use index::Dataset;
pub use types::{MovieCatalog, MovieId, MovieMetadata, RatingRecord, UserId};
