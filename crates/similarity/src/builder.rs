//! Rating matrix construction.
//!
//! Turns rating records into a sparse users x movieIds matrix:
//! - rows are dense user codes (categorical encoding of userId)
//! - columns are raw movieIds, used verbatim, so the column count is
//!   max(movieId) + 1 and unused ids are just empty columns
//!
//! Records whose movieId didn't parse are skipped and counted. They are never
//! folded into column 0, which may be a real movie.

use crate::error::{BuildError, Result};
use data_loader::{MovieId, RatingRecord, UserId};
use sprs::{CsMat, TriMat};
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// Dense zero-based codes for user ids.
///
/// Codes follow ascending userId order, so the encoding is deterministic
/// for a given set of users regardless of record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserCodes {
    /// Distinct user ids, ascending; a user's code is its position here
    ids: Vec<UserId>,
}

impl UserCodes {
    pub fn from_user_ids(ids: impl IntoIterator<Item = UserId>) -> Self {
        let mut ids: Vec<UserId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn code(&self, user_id: UserId) -> Option<u32> {
        self.ids.binary_search(&user_id).ok().map(|pos| pos as u32)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One rating with its user already encoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodedRating {
    pub user_code: u32,
    pub movie_id: MovieId,
    pub rating: f32,
}

/// The valid ratings after encoding, plus what was dropped on the way
#[derive(Debug, Clone, Default)]
pub struct CodedRatings {
    pub records: Vec<CodedRating>,
    movie_ids: BTreeSet<MovieId>,
    /// Records skipped because their movieId didn't parse
    pub invalid_movie_ids: usize,
}

impl CodedRatings {
    /// Does any valid rating mention this movie?
    pub fn contains_movie(&self, movie_id: MovieId) -> bool {
        self.movie_ids.contains(&movie_id)
    }

    /// Distinct rated movieIds, ascending
    pub fn movie_ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.movie_ids.iter().copied()
    }

    pub fn distinct_movies(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The users x movieIds rating matrix and its user encoding
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    matrix: CsMat<f32>,
    users: UserCodes,
}

impl RatingMatrix {
    /// The ratings in CSR storage: one row per user code
    pub fn matrix(&self) -> &CsMat<f32> {
        &self.matrix
    }

    pub fn users(&self) -> &UserCodes {
        &self.users
    }

    pub fn num_users(&self) -> usize {
        self.matrix.rows()
    }

    /// Column count: max(movieId) + 1
    pub fn num_columns(&self) -> usize {
        self.matrix.cols()
    }
}

/// Build the rating matrix from raw records
///
/// Returns the matrix together with the encoded ratings, which the query
/// engine uses to decide whether a movie has any rating data at all.
#[instrument(skip_all, fields(records = ratings.len()))]
pub fn build(ratings: &[RatingRecord]) -> Result<(RatingMatrix, CodedRatings)> {
    let valid: Vec<(UserId, MovieId, f32)> = ratings
        .iter()
        .filter_map(|r| r.movie_id.map(|movie_id| (r.user_id, movie_id, r.rating)))
        .collect();

    let invalid_movie_ids = ratings.len() - valid.len();
    if invalid_movie_ids > 0 {
        warn!(
            "Skipped {} ratings with an invalid movieId",
            invalid_movie_ids
        );
    }

    let Some(max_movie_id) = valid.iter().map(|&(_, movie_id, _)| movie_id).max() else {
        return Err(BuildError::NoRatings);
    };

    let users = UserCodes::from_user_ids(valid.iter().map(|&(user_id, _, _)| user_id));

    let mut coded = CodedRatings {
        records: Vec::with_capacity(valid.len()),
        movie_ids: BTreeSet::new(),
        invalid_movie_ids,
    };
    for &(user_id, movie_id, rating) in &valid {
        // every valid user got a code above
        let Some(user_code) = users.code(user_id) else {
            continue;
        };
        coded.records.push(CodedRating {
            user_code,
            movie_id,
            rating,
        });
        coded.movie_ids.insert(movie_id);
    }

    // repeated (user, movie) pairs are summed by the CSR conversion
    let mut triplets = TriMat::with_capacity(
        (users.len(), max_movie_id as usize + 1),
        coded.records.len(),
    );
    for r in &coded.records {
        triplets.add_triplet(r.user_code as usize, r.movie_id as usize, r.rating);
    }
    let matrix: CsMat<f32> = triplets.to_csr();

    debug!(
        "Rating matrix {}x{} with {} nonzeros ({} distinct movies)",
        matrix.rows(),
        matrix.cols(),
        matrix.nnz(),
        coded.distinct_movies()
    );

    Ok((RatingMatrix { matrix, users }, coded))
}
