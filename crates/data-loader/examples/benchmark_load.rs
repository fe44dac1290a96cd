use anyhow::{Context, Result};
use data_loader::{Config, Dataset};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let config = Config::resolve(None, Path::new("config.json"))?;

    println!("Loading dataset from {}...\n", config.dataset_path.display());

    let start = Instant::now();
    let dataset = Dataset::load(&config).context("Failed to load dataset")?;
    let elapsed = start.elapsed();

    let (ratings, movies) = dataset.counts();
    let invalid = dataset.ratings.iter().filter(|r| r.movie_id.is_none()).count();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!("Ratings with an invalid movieId: {}", invalid);
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());
    Ok(())
}
