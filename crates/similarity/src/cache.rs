//! On-disk cache for the similarity matrix.
//!
//! Computing the similarity matrix dominates a run, so the result is written
//! to a single bincode file next to the dataset and reused on the next run.
//!
//! The file stores a [`Fingerprint`] of the inputs it was computed from. A
//! mismatch means the ratings changed and the entry is stale. A file that
//! can't be decoded is reported as corrupt. Neither is an error: the caller
//! recomputes and overwrites.

use crate::builder::RatingMatrix;
use crate::error::CacheError;
use crate::matrix::SimilarityMatrix;
use bincode::Options;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sprs::CsMat;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// Bumped whenever the envelope layout or the similarity definition changes
const FORMAT_VERSION: u32 = 1;

/// Identifies the inputs a similarity matrix was computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint the ratings file (size, mtime) and the matrix built from it
    pub fn of_inputs(ratings_file: &Path, ratings: &RatingMatrix) -> Result<Self, CacheError> {
        let metadata = fs::metadata(ratings_file).map_err(|source| CacheError::Io {
            path: ratings_file.display().to_string(),
            source,
        })?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = Sha256::new();
        hasher.update(metadata.len().to_le_bytes());
        hasher.update(modified.to_le_bytes());
        hash_shape(&mut hasher, ratings.matrix());
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Fingerprint a matrix alone, for inputs that don't come from a file
    pub fn of_matrix(matrix: &CsMat<f32>) -> Self {
        let mut hasher = Sha256::new();
        hash_shape(&mut hasher, matrix);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn hash_shape(hasher: &mut Sha256, matrix: &CsMat<f32>) {
    hasher.update((matrix.rows() as u64).to_le_bytes());
    hasher.update((matrix.cols() as u64).to_le_bytes());
    hasher.update((matrix.nnz() as u64).to_le_bytes());
}

/// What a cache lookup found
#[derive(Debug)]
pub enum CacheLookup {
    Hit(SimilarityMatrix),
    /// No cache file
    Missing,
    /// Cache file written for different inputs or an older format
    Stale,
    /// Cache file present but unreadable
    Corrupt(String),
}

/// Why a similarity matrix was recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    Forced,
    Missing,
    Stale,
    Corrupt,
}

/// Where the similarity matrix of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Loaded,
    Computed(RecomputeReason),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    fingerprint: &'a Fingerprint,
    similarity: &'a SimilarityMatrix,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    fingerprint: Fingerprint,
    similarity: SimilarityMatrix,
}

/// Similarity cache backed by a single file
#[derive(Debug, Clone)]
pub struct SimilarityCache {
    path: PathBuf,
}

impl SimilarityCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Look up a matrix computed from inputs matching `expected`
    pub fn load(&self, expected: &Fingerprint) -> Result<CacheLookup, CacheError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheLookup::Missing),
            Err(e) => return Err(self.io_error(e)),
        };
        let limit = file.metadata().map_err(|e| self.io_error(e))?.len();

        let envelope: Envelope = match bincode::DefaultOptions::new()
            .with_limit(limit)
            .deserialize_from(BufReader::new(file))
        {
            Ok(envelope) => envelope,
            Err(e) => return Ok(CacheLookup::Corrupt(e.to_string())),
        };

        if envelope.format_version != FORMAT_VERSION || envelope.fingerprint != *expected {
            debug!(
                "Cache fingerprint {} (v{}) does not match {} (v{})",
                envelope.fingerprint.as_str(),
                envelope.format_version,
                expected.as_str(),
                FORMAT_VERSION
            );
            return Ok(CacheLookup::Stale);
        }
        match envelope.similarity.into_validated() {
            Ok(similarity) => Ok(CacheLookup::Hit(similarity)),
            Err(reason) => Ok(CacheLookup::Corrupt(reason)),
        }
    }

    /// Persist `similarity` tagged with `fingerprint`.
    ///
    /// Writes a sibling temp file and renames it over the cache file, so a
    /// crash mid-write never leaves a truncated cache behind. The temp file
    /// is removed again if any step fails.
    pub fn save(
        &self,
        similarity: &SimilarityMatrix,
        fingerprint: &Fingerprint,
    ) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp_path = self.tmp_path();
        let written = self
            .write_envelope(&tmp_path, similarity, fingerprint)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e)));

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e);
        }

        debug!("Saved similarity matrix to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        PathBuf::from(tmp_name)
    }

    fn write_envelope(
        &self,
        tmp_path: &Path,
        similarity: &SimilarityMatrix,
        fingerprint: &Fingerprint,
    ) -> Result<(), CacheError> {
        let file = File::create(tmp_path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        bincode::DefaultOptions::new()
            .serialize_into(
                &mut writer,
                &EnvelopeRef {
                    format_version: FORMAT_VERSION,
                    fingerprint,
                    similarity,
                },
            )
            .map_err(|source| CacheError::Serialize {
                path: tmp_path.display().to_string(),
                source,
            })?;
        writer.flush().map_err(|e| self.io_error(e))
    }

    /// Return the cached matrix, or compute and cache a fresh one.
    ///
    /// `force` skips the lookup. Lookup and save failures are logged and
    /// never abort the run; the worst case is recomputing next time.
    pub fn load_or_compute<F>(
        &self,
        force: bool,
        fingerprint: &Fingerprint,
        compute: F,
    ) -> (SimilarityMatrix, CacheStatus)
    where
        F: FnOnce() -> SimilarityMatrix,
    {
        let reason = if force {
            RecomputeReason::Forced
        } else {
            match self.load(fingerprint) {
                Ok(CacheLookup::Hit(similarity)) => {
                    info!("Loaded similarity matrix from {}", self.path.display());
                    return (similarity, CacheStatus::Loaded);
                }
                Ok(CacheLookup::Missing) => RecomputeReason::Missing,
                Ok(CacheLookup::Stale) => {
                    info!("Similarity cache at {} is stale", self.path.display());
                    RecomputeReason::Stale
                }
                Ok(CacheLookup::Corrupt(reason)) => {
                    warn!(
                        "Similarity cache at {} is corrupt ({}), recomputing",
                        self.path.display(),
                        reason
                    );
                    RecomputeReason::Corrupt
                }
                Err(e) => {
                    warn!("Could not read similarity cache: {}, recomputing", e);
                    RecomputeReason::Corrupt
                }
            }
        };

        info!("Calculating movie similarity matrix ({:?})", reason);
        let similarity = compute();

        if let Err(e) = self.save(&similarity, fingerprint) {
            warn!("Could not save similarity matrix: {}", e);
        }

        (similarity, CacheStatus::Computed(reason))
    }
}
