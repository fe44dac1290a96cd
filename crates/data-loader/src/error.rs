//! Error types for the data-loader crate.
//!
//! Every variant here is fatal for a run: the recommender never operates on
//! partially loaded data. Recoverable per-row problems (an unparsable movieId,
//! a metadata row without a title) are handled in the parser and never
//! surface as errors.

use thiserror::Error;

/// Errors that can occur during data loading and parsing
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// File exists but could not be opened or read
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file (bad quoting, invalid UTF-8, ...)
    #[error("Malformed CSV in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A required field in a data row couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// The header row is missing a column we need
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// Configuration file exists but could not be used
    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
