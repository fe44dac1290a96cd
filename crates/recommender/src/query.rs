//! # Recommendation Query Engine
//!
//! Answers "what is similar to this movie?" against a similarity matrix:
//! 1. Resolve the title to a movieId (exact match, lowest id on duplicates)
//! 2. Check the movie has rating data behind it
//! 3. Read the movie's similarity row (the row index IS the movieId)
//! 4. Rank every movieId by descending score, ascending id on ties,
//!    dropping the query movie itself
//! 5. Keep the first `top_n` and join them with metadata
//!
//! Ranking works from the stored (nonzero) entries of the row. Every other
//! movieId scores exactly zero, so those follow the positive scores in
//! ascending id order, and any negative scores come last. That is the same
//! order a full stable sort of the dense row would give.

use crate::error::RecommendError;
use data_loader::{MovieCatalog, MovieId};
use similarity::{CodedRatings, SimilarityMatrix};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, instrument};

/// Rendered in place of metadata fields that are missing
pub const NOT_AVAILABLE: &str = "N/A";

/// One recommended movie with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub score: f32,
    /// `None` when the movie has no metadata row
    pub title: Option<String>,
    /// Comma-joined genre names
    pub genres: Option<String>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
}

impl Recommendation {
    /// Attach whatever metadata the catalog has for `movie_id`
    fn enrich(movie_id: MovieId, score: f32, catalog: &MovieCatalog) -> Self {
        match catalog.get(movie_id) {
            Some(movie) => Self {
                movie_id,
                score,
                title: Some(movie.title.clone()),
                genres: Some(movie.genres_joined()),
                vote_average: movie.vote_average,
                vote_count: movie.vote_count,
            },
            None => Self {
                movie_id,
                score,
                title: None,
                genres: None,
                vote_average: None,
                vote_count: None,
            },
        }
    }
}

fn or_na<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id {}) [{}] vote average {} ({} votes), similarity {:.4}",
            or_na(&self.title),
            self.movie_id,
            or_na(&self.genres),
            or_na(&self.vote_average),
            or_na(&self.vote_count),
            self.score
        )
    }
}

/// Recommend the `top_n` movies most similar to `title`.
///
/// `ratings` decides whether the movie has rating data at all; `catalog`
/// resolves the title and supplies the metadata for each result.
#[instrument(skip(similarity, ratings, catalog))]
pub fn recommend(
    title: &str,
    similarity: &SimilarityMatrix,
    ratings: &CodedRatings,
    catalog: &MovieCatalog,
    top_n: usize,
) -> Result<Vec<Recommendation>, RecommendError> {
    let movie = catalog
        .find_by_title(title)
        .ok_or_else(|| RecommendError::MovieNotFound {
            title: title.to_string(),
        })?;
    let movie_id = movie.movie_id;

    if catalog.ids_for_title(title).len() > 1 {
        debug!(
            "Title '{}' matches movieIds {:?}, using {}",
            title,
            catalog.ids_for_title(title),
            movie_id
        );
    }

    if !ratings.contains_movie(movie_id) || movie_id as usize >= similarity.dimension() {
        return Err(RecommendError::InsufficientRatings {
            title: title.to_string(),
            movie_id,
        });
    }

    let ranked = rank_similar(similarity, movie_id, top_n);
    debug!("Ranked {} neighbours of movie {}", ranked.len(), movie_id);

    Ok(ranked
        .into_iter()
        .map(|(id, score)| Recommendation::enrich(id, score, catalog))
        .collect())
}

/// The `top_n` movieIds most similar to `movie_id`, with their scores.
///
/// Ordered by descending score, then ascending movieId; `movie_id` itself is
/// never included. Returns nothing if `movie_id` is outside the matrix.
pub fn rank_similar(
    similarity: &SimilarityMatrix,
    movie_id: MovieId,
    top_n: usize,
) -> Vec<(MovieId, f32)> {
    let Some(row) = similarity.row(movie_id as usize) else {
        return Vec::new();
    };
    if top_n == 0 {
        return Vec::new();
    }
    let stored: Vec<(MovieId, f32)> = row
        .iter()
        .map(|(id, &score)| (id as MovieId, score))
        .collect();

    let by_rank = |a: &(MovieId, f32), b: &(MovieId, f32)| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    };

    let (mut positive, mut negative): (Vec<(MovieId, f32)>, Vec<(MovieId, f32)>) = stored
        .iter()
        .copied()
        .filter(|&(id, score)| id != movie_id && score != 0.0)
        .partition(|&(_, score)| score > 0.0);
    positive.sort_by(by_rank);
    negative.sort_by(by_rank);

    let mut ranked: Vec<(MovieId, f32)> = positive.into_iter().take(top_n).collect();
    if ranked.len() == top_n {
        return ranked;
    }

    // zero scores: every id without a nonzero stored score, ascending
    let dimension = similarity.dimension() as MovieId;
    let mut nonzero = stored
        .iter()
        .filter(|&&(_, score)| score != 0.0)
        .map(|&(id, _)| id)
        .peekable();
    let mut candidate: MovieId = 0;
    while ranked.len() < top_n && candidate < dimension {
        while nonzero.next_if(|&id| id < candidate).is_some() {}
        let is_nonzero = nonzero.peek() == Some(&candidate);
        if !is_nonzero && candidate != movie_id {
            ranked.push((candidate, 0.0));
        }
        candidate += 1;
    }

    let remaining = top_n - ranked.len();
    ranked.extend(negative.into_iter().take(remaining));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{MovieMetadata, RatingRecord};
    use similarity::{SimilarityEngine, build};
    use sprs::TriMat;

    fn movie(id: MovieId, title: &str, genres: &[&str]) -> MovieMetadata {
        MovieMetadata {
            movie_id: id,
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            vote_average: Some(7.0),
            vote_count: Some(100),
        }
    }

    fn setup() -> (SimilarityMatrix, CodedRatings, MovieCatalog) {
        let ratings = vec![
            RatingRecord::new(1, 10, 5.0),
            RatingRecord::new(1, 20, 5.0),
            RatingRecord::new(2, 10, 1.0),
            RatingRecord::new(2, 20, 5.0),
        ];
        let (matrix, coded) = build(&ratings).unwrap();
        let similarity = SimilarityEngine::new().compute(&matrix);
        let catalog = MovieCatalog::from_movies(vec![
            movie(10, "Ten", &["Drama"]),
            movie(20, "Twenty", &["Action", "Comedy"]),
            movie(30, "Thirty", &[]),
        ]);
        (similarity, coded, catalog)
    }

    /// A hand-made similarity matrix with the given row for movie 2
    fn matrix_with_row(dimension: usize, row: Vec<(u32, f32)>) -> SimilarityMatrix {
        let mut triplets = TriMat::new((dimension, dimension));
        for (j, v) in row {
            triplets.add_triplet(2, j as usize, v);
        }
        SimilarityMatrix::from_csr(triplets.to_csr())
    }

    #[test]
    fn test_returns_only_other_rated_item() {
        let (similarity, coded, catalog) = setup();
        let recs = recommend("Ten", &similarity, &coded, &catalog, 1).unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].movie_id, 20);
        assert!(recs[0].score > 0.0);
        assert_eq!(recs[0].title.as_deref(), Some("Twenty"));
        assert_eq!(recs[0].genres.as_deref(), Some("Action, Comedy"));
        assert_eq!(recs[0].vote_count, Some(100));
    }

    #[test]
    fn test_movie_not_found() {
        let (similarity, coded, catalog) = setup();
        let err = recommend("Eleven", &similarity, &coded, &catalog, 5).unwrap_err();
        assert_eq!(
            err,
            RecommendError::MovieNotFound {
                title: "Eleven".to_string()
            }
        );
    }

    #[test]
    fn test_insufficient_ratings() {
        let (similarity, coded, catalog) = setup();
        let err = recommend("Thirty", &similarity, &coded, &catalog, 5).unwrap_err();
        assert_eq!(
            err,
            RecommendError::InsufficientRatings {
                title: "Thirty".to_string(),
                movie_id: 30
            }
        );
    }

    #[test]
    fn test_never_includes_query_movie() {
        let (similarity, coded, catalog) = setup();
        let recs = recommend("Twenty", &similarity, &coded, &catalog, 50).unwrap();

        assert!(recs.iter().all(|r| r.movie_id != 20));
        // every other movieId in 0..=20 shows up exactly once
        assert_eq!(recs.len(), 20);
        assert_eq!(recs[0].movie_id, 10);
    }

    #[test]
    fn test_missing_metadata_is_not_available() {
        let (similarity, coded, catalog) = setup();
        let recs = recommend("Ten", &similarity, &coded, &catalog, 2).unwrap();

        // second place is a zero-score id with no metadata
        assert_eq!(recs[1].movie_id, 0);
        assert_eq!(recs[1].title, None);
        assert!(recs[1].to_string().starts_with("N/A (id 0) [N/A]"));
    }

    #[test]
    fn test_ranking_order_and_tie_break() {
        let sim = matrix_with_row(8, vec![(2, 1.0), (6, 0.5), (3, 0.9), (1, 0.5), (5, -0.2)]);
        let ranked = rank_similar(&sim, 2, 10);

        let ids: Vec<MovieId> = ranked.iter().map(|&(id, _)| id).collect();
        // positives desc (ties ascending), then zeros ascending, then negatives
        assert_eq!(ids, vec![3, 1, 6, 0, 4, 7, 5]);
        assert_eq!(ranked[0].1, 0.9);
        assert_eq!(ranked[3].1, 0.0);
        assert_eq!(ranked[6].1, -0.2);
    }

    #[test]
    fn test_query_excluded_by_identity_not_position() {
        // another movie ties with the query's self-similarity and has a lower id
        let sim = matrix_with_row(4, vec![(1, 1.0), (2, 1.0), (3, 0.3)]);
        let ranked = rank_similar(&sim, 2, 2);
        assert_eq!(ranked, vec![(1, 1.0), (3, 0.3)]);
    }

    #[test]
    fn test_rank_respects_top_n() {
        let sim = matrix_with_row(6, vec![(2, 1.0), (4, 0.7), (5, 0.6)]);
        assert!(rank_similar(&sim, 2, 0).is_empty());
        assert_eq!(rank_similar(&sim, 2, 1), vec![(4, 0.7)]);
        assert_eq!(rank_similar(&sim, 2, 3), vec![(4, 0.7), (5, 0.6), (0, 0.0)]);
        assert!(rank_similar(&sim, 9, 3).is_empty());
    }

    #[test]
    fn test_stored_zero_ranks_with_unstored_ids() {
        let sim = matrix_with_row(5, vec![(2, 1.0), (4, 0.0), (1, 0.5)]);
        assert_eq!(
            rank_similar(&sim, 2, 4),
            vec![(1, 0.5), (0, 0.0), (3, 0.0), (4, 0.0)]
        );
    }

    #[test]
    fn test_duplicate_titles_use_lowest_id() {
        let (similarity, coded, _) = setup();
        let catalog = MovieCatalog::from_movies(vec![
            movie(20, "Twin", &[]),
            movie(10, "Twin", &[]),
        ]);

        // "Twin" resolves to movie 10, whose only neighbour is 20
        let recs = recommend("Twin", &similarity, &coded, &catalog, 1).unwrap();
        assert_eq!(recs[0].movie_id, 20);
    }
}
