//! Integration tests for the full pipeline.
//!
//! These tests write a small dataset to disk and run it through loading,
//! matrix building, the similarity cache and the query engine.

use data_loader::Config;
use recommender::{ItemRecommender, RecommendError};
use similarity::{CacheStatus, RecomputeReason};
use std::fs;
use tempfile::TempDir;

const RATINGS: &str = "userId,movieId,rating,timestamp\n\
1,10,5.0,964982703\n\
1,20,5.0,964981247\n\
2,10,1.0,964982224\n\
2,20,5.0,964983815\n\
3,20,4.0,964982931\n\
3,30,4.5,964982400\n\
3,not-a-number,3.0,964980868\n\
4,30,2.0,964982176\n\
4,40,5.0,964984041\n";

const MOVIES: &str = "adult,genres,id,title,vote_average,vote_count\n\
False,\"[{'id': 18, 'name': 'Drama'}]\",10,Star Wars,8.1,6778.0\n\
False,\"[{'id': 28, 'name': 'Action'}, {'id': 12, 'name': 'Adventure'}]\",20,Finding Nemo,7.6,6292.0\n\
False,\"[{'id': 35, 'name': 'Comedy'}]\",30,Forrest Gump,8.2,8147.0\n\
False,[],40,Metropolis,8.0\n\
False,[],50,Never Rated,6.0,12.0\n\
False,[],1997-08-20,Broken Row,,\n";

fn write_dataset() -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ratings.csv"), RATINGS).unwrap();
    fs::write(dir.path().join("movies_metadata.csv"), MOVIES).unwrap();
    let config = Config::for_dataset(dir.path());
    (dir, config)
}

#[test]
fn test_recommendations_end_to_end() {
    let (_dir, config) = write_dataset();
    let recommender = ItemRecommender::prepare(&config, false).unwrap();

    assert_eq!(
        recommender.cache_status(),
        CacheStatus::Computed(RecomputeReason::Missing)
    );
    assert_eq!(recommender.similarity().dimension(), 41);

    let recs = recommender.recommend("Star Wars", 1).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].movie_id, 20);
    assert!(recs[0].score > 0.0);
    assert_eq!(recs[0].title.as_deref(), Some("Finding Nemo"));
    assert_eq!(recs[0].genres.as_deref(), Some("Action, Adventure"));
    assert_eq!(recs[0].vote_average, Some(7.6));
    assert_eq!(recs[0].vote_count, Some(6292));
}

#[test]
fn test_results_sorted_and_exclude_query() {
    let (_dir, config) = write_dataset();
    let recommender = ItemRecommender::prepare(&config, false).unwrap();

    let recs = recommender.recommend("Finding Nemo", 5).unwrap();
    assert_eq!(recs.len(), 5);
    assert!(recs.iter().all(|r| r.movie_id != 20));
    for pair in recs.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].movie_id < pair[1].movie_id)
        );
    }
    // both co-rated movies come before any unrelated id
    assert_eq!(recs[0].movie_id, 10);
    assert_eq!(recs[1].movie_id, 30);
    assert_eq!(recs[2].score, 0.0);
}

#[test]
fn test_not_found_and_insufficient_ratings() {
    let (_dir, config) = write_dataset();
    let recommender = ItemRecommender::prepare(&config, false).unwrap();

    assert_eq!(
        recommender.recommend("The Room", 10),
        Err(RecommendError::MovieNotFound {
            title: "The Room".to_string()
        })
    );
    assert_eq!(
        recommender.recommend("Never Rated", 10),
        Err(RecommendError::InsufficientRatings {
            title: "Never Rated".to_string(),
            movie_id: 50
        })
    );
}

#[test]
fn test_second_run_uses_cache() {
    let (_dir, config) = write_dataset();

    let first = ItemRecommender::prepare(&config, false).unwrap();
    assert!(config.cache_file.exists());

    let second = ItemRecommender::prepare(&config, false).unwrap();
    assert_eq!(second.cache_status(), CacheStatus::Loaded);
    assert_eq!(second.similarity(), first.similarity());
    assert_eq!(
        second.recommend("Star Wars", 3).unwrap(),
        first.recommend("Star Wars", 3).unwrap()
    );

    let forced = ItemRecommender::prepare(&config, true).unwrap();
    assert_eq!(
        forced.cache_status(),
        CacheStatus::Computed(RecomputeReason::Forced)
    );
}

#[test]
fn test_changed_ratings_invalidate_cache() {
    let (dir, config) = write_dataset();
    ItemRecommender::prepare(&config, false).unwrap();

    let mut ratings = RATINGS.to_string();
    ratings.push_str("5,40,4.0,964984100\n5,10,3.0,964984200\n");
    fs::write(dir.path().join("ratings.csv"), ratings).unwrap();

    let recommender = ItemRecommender::prepare(&config, false).unwrap();
    assert_eq!(
        recommender.cache_status(),
        CacheStatus::Computed(RecomputeReason::Stale)
    );
    // user 5 now links Metropolis and Star Wars
    let recs = recommender.recommend("Metropolis", 1).unwrap();
    assert!(recs[0].score > 0.0);
}

#[test]
fn test_corrupt_cache_falls_back_to_recompute() {
    let (_dir, config) = write_dataset();
    fs::write(&config.cache_file, b"\x01\x02garbage").unwrap();

    let recommender = ItemRecommender::prepare(&config, false).unwrap();
    assert_eq!(
        recommender.cache_status(),
        CacheStatus::Computed(RecomputeReason::Corrupt)
    );
    assert_eq!(recommender.recommend("Star Wars", 1).unwrap()[0].movie_id, 20);
}

#[test]
fn test_missing_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dataset(dir.path().join("nowhere"));

    let err = ItemRecommender::prepare(&config, false).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("Failed to load dataset"));
    assert!(chain.contains("ratings.csv") || chain.contains("movies_metadata.csv"));
}
