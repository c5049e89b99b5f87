//! Batch trainer: history in, model and feature schema artifacts out.
//!
//! # Usage
//! ```sh
//! cargo run --bin train -- --source sqlite
//! cargo run --bin train -- --source csv --max-trees 100
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use stockcast::application::ml::BatchTrainer;
use stockcast::application::ml::forest_learner::ForestLearner;
use stockcast::config::Config;
use stockcast::domain::repositories::HistoryRepository;
use stockcast::domain::types::{SalesRecord, WeatherObservation};
use stockcast::infrastructure::csv_history;
use stockcast::infrastructure::persistence::{Database, SqliteHistoryRepository};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Source {
    Sqlite,
    Csv,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Where the sales and weather history is read from
    #[arg(long, value_enum, default_value_t = Source::Sqlite)]
    source: Source,

    /// Override ML_MAX_TREES
    #[arg(long)]
    max_trees: Option<usize>,

    /// Override ML_MAX_DEPTH
    #[arg(long)]
    max_depth: Option<u16>,

    /// Fit on every row, skipping validation and early stopping
    #[arg(long, default_value_t = false)]
    no_split: bool,
}

async fn load_history(source: Source, config: &Config) -> Result<(Vec<SalesRecord>, Vec<WeatherObservation>)> {
    match source {
        Source::Sqlite => {
            let db = Database::new(&config.artifacts.database_url).await?;
            let repository = SqliteHistoryRepository::new(db.pool);
            let sales = repository.fetch_sales().await?;
            let weather = repository.fetch_weather().await?;
            Ok((sales, weather))
        }
        Source::Csv => {
            let sales = csv_history::load_sales(&config.artifacts.sales_csv())?;
            let weather = csv_history::load_weather(&config.artifacts.weather_csv())?;
            Ok((sales, weather))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(max_trees) = args.max_trees {
        config.training.forest.max_trees = max_trees;
    }
    if let Some(max_depth) = args.max_depth {
        config.training.forest.max_depth = max_depth;
    }
    if args.no_split {
        config.training.split.validation_fraction = 0.0;
    }
    config.training.validate()?;

    info!("Loading history from {:?}", args.source);
    let (sales, weather) = load_history(args.source, &config).await?;
    info!("{} sales records, {} weather observations", sales.len(), weather.len());

    let trainer = BatchTrainer::new(
        ForestLearner::new(config.training.forest.clone()),
        config.training.split,
    );
    let store = config.artifact_store();
    let report = trainer
        .train_and_persist(&sales, &weather, &store)
        .context("Training failed")?;

    info!(
        "Saved model to {:?} and feature schema to {:?}",
        store.model_path(),
        store.schema_path()
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
