//! Dataset location and run settings.
//!
//! The dataset root is resolved once at startup and handed to every component
//! through [`Config`]. Resolution order:
//!
//! 1. explicit override (the CLI's `--data-dir`)
//! 2. the `ITEM_RECS_DATASET_PATH` environment variable
//! 3. the `dataset_path` key of a JSON config file (`config.json` by default)
//! 4. [`DEFAULT_DATASET_PATH`]

use crate::error::{DataLoadError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where kagglehub drops "The Movies Dataset"
pub const DEFAULT_DATASET_PATH: &str =
    "~/.cache/kagglehub/datasets/rounakbanik/the-movies-dataset/versions/7";

/// Environment variable that overrides the config file
pub const DATASET_PATH_ENV: &str = "ITEM_RECS_DATASET_PATH";

/// Config file consulted when nothing else names the dataset
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

pub const RATINGS_FILE: &str = "ratings.csv";
pub const MOVIES_FILE: &str = "movies_metadata.csv";
pub const CACHE_FILE: &str = "similarity_matrix.bin";

/// Number of recommendations returned when the caller doesn't say
pub const DEFAULT_TOP_N: usize = 10;

/// Settings shared by the loader, the similarity cache and the query engine
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub ratings_file: PathBuf,
    pub movies_file: PathBuf,
    pub cache_file: PathBuf,
    pub top_n: usize,
}

/// On-disk shape of the JSON config file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    dataset_path: Option<String>,
    top_n: Option<usize>,
}

impl Config {
    /// Build a config rooted at `dataset_path` with the standard file names
    pub fn for_dataset(dataset_path: impl Into<PathBuf>) -> Self {
        let dataset_path = expand_home(&dataset_path.into());
        Self {
            ratings_file: dataset_path.join(RATINGS_FILE),
            movies_file: dataset_path.join(MOVIES_FILE),
            cache_file: dataset_path.join(CACHE_FILE),
            dataset_path,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Resolve the config from the process environment
    pub fn resolve(override_path: Option<&Path>, config_file: &Path) -> Result<Self> {
        let env_path = std::env::var(DATASET_PATH_ENV).ok().filter(|v| !v.is_empty());
        Self::resolve_with(override_path, env_path.as_deref(), config_file)
    }

    /// Resolve the config from explicit inputs.
    ///
    /// A config file that doesn't exist is fine; one that exists but isn't
    /// valid JSON is an error. `top_n` from the file applies whichever
    /// source supplied the dataset path.
    pub fn resolve_with(
        override_path: Option<&Path>,
        env_path: Option<&str>,
        config_file: &Path,
    ) -> Result<Self> {
        let file = read_config_file(config_file)?;

        let (dataset_path, source) = if let Some(path) = override_path {
            (path.to_path_buf(), "override")
        } else if let Some(path) = env_path {
            (PathBuf::from(path), DATASET_PATH_ENV)
        } else if let Some(path) = file.dataset_path {
            (PathBuf::from(path), "config file")
        } else {
            (PathBuf::from(DEFAULT_DATASET_PATH), "default")
        };

        let mut config = Self::for_dataset(dataset_path);
        if let Some(top_n) = file.top_n {
            config.top_n = top_n;
        }

        debug!("Dataset path {} (from {})", config.dataset_path.display(), source);
        Ok(config)
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
        Err(source) => {
            return Err(DataLoadError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    serde_json::from_str(&text).map_err(|e| DataLoadError::Config {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Expand a leading `~` against `$HOME`
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
