use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use data_loader::config::{Config, DEFAULT_CONFIG_FILE};
use recommender::{ItemRecommender, Recommendation, NOT_AVAILABLE};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// item-recs - Item-Based Collaborative Filtering Recommendation
#[derive(Parser)]
#[command(name = "item-recs")]
#[command(about = "Find movies similar to a given title from user co-ratings", long_about = None)]
struct Cli {
    /// Movie title for recommendation (exact match)
    movie_title: String,

    /// Force similarity matrix recalculation
    #[arg(long)]
    update: bool,

    /// Number of recommendations to return [default: top_n from the config, or 10]
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Dataset directory (overrides ITEM_RECS_DATASET_PATH and the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// JSON config file with a "dataset_path" key
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> Result<()> {
    // A .env file is optional
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::resolve(cli.data_dir.as_deref(), &cli.config)
        .with_context(|| format!("Failed to read configuration from {}", cli.config.display()))?;
    let top_n = cli.top_n.unwrap_or(config.top_n);
    debug!("Resolved {:?}", config);

    println!("Using dataset at: {}", config.dataset_path.display());
    println!("Loading data for recommendation of '{}'...", cli.movie_title);

    let start = Instant::now();
    let recommender = ItemRecommender::prepare(&config, cli.update)?;
    println!("{} Ready in {:?}", "✓".green(), start.elapsed());

    match recommender.recommend(&cli.movie_title, top_n) {
        Ok(recommendations) => print_recommendations(&cli.movie_title, &recommendations),
        // not found / not enough ratings are answers, not failures
        Err(e) => println!("{}", e.to_string().yellow()),
    }

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(title: &str, recommendations: &[Recommendation]) {
    println!(
        "{}",
        format!("Recommendations for '{}':", title).bold().blue()
    );

    if recommendations.is_empty() {
        println!("  (none)");
        return;
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        let title = rec.title.as_deref().unwrap_or(NOT_AVAILABLE);
        let genres = match rec.genres.as_deref() {
            Some("") | None => NOT_AVAILABLE,
            Some(genres) => genres,
        };
        let vote_average = rec
            .vote_average
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let vote_count = rec
            .vote_count
            .map(|v| v.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        println!(
            "{:>3}. {} (id {}) [{}] - Votes: {} ({}) - Similarity: {:.4}",
            (rank + 1).to_string().green(),
            title.bold(),
            rec.movie_id,
            genres,
            vote_average,
            vote_count,
            rec.score
        );
    }
}
