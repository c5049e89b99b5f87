//! History seeder: synthetic sales, weather and stock for demos and training.
//!
//! # Usage
//! ```sh
//! cargo run --bin seed -- history --days 180
//! cargo run --bin seed -- history --target csv --seed 7
//! cargo run --bin seed -- weather --date 2025-07-02
//! cargo run --bin seed -- sales --date 2025-07-02
//! cargo run --bin seed -- supply --product PROD001 --quantity 40
//! ```

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use stockcast::application::simulation::history_generator::supply_batch;
use stockcast::application::simulation::{HistoryGenerator, default_catalog};
use stockcast::config::Config;
use stockcast::domain::repositories::HistoryRepository;
use stockcast::infrastructure::csv_history;
use stockcast::infrastructure::persistence::{Database, SqliteHistoryRepository};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Sqlite,
    Csv,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// RNG seed; the same seed reproduces the same history
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a full history ending the day before --anchor
    History {
        #[arg(long, default_value_t = 180)]
        days: u32,

        /// Defaults to today
        #[arg(long)]
        anchor: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = Target::Sqlite)]
        target: Target,

        /// Skip the catalog and opening stock (SQLite only)
        #[arg(long, default_value_t = false)]
        no_inventory: bool,
    },
    /// Record one day's weather in the history store
    Weather {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Sell one day against current stock and record the sales
    Sales {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Receive a fresh batch for one product
    Supply {
        #[arg(long)]
        product: String,

        #[arg(long)]
        quantity: u32,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

async fn open_store(config: &Config) -> Result<SqliteHistoryRepository> {
    let db = Database::new(&config.artifacts.database_url).await?;
    Ok(SqliteHistoryRepository::new(db.pool))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let catalog = default_catalog();
    let mut generator = HistoryGenerator::new(cli.seed);

    match cli.command {
        Command::History {
            days,
            anchor,
            target,
            no_inventory,
        } => {
            let anchor = today_or(anchor);
            let history = generator.generate(&catalog, anchor, days);

            match target {
                Target::Csv => {
                    let dir = &config.artifacts.history_dir;
                    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
                    csv_history::write_sales(&config.artifacts.sales_csv(), &history.sales)?;
                    csv_history::write_weather(&config.artifacts.weather_csv(), &history.weather)?;
                    info!("Wrote history CSVs to {:?}", dir);
                }
                Target::Sqlite => {
                    let store = open_store(&config).await?;
                    store.save_weather(&history.weather).await?;
                    store.save_sales(&history.sales).await?;
                    if !no_inventory {
                        let products: Vec<_> = catalog.iter().map(|i| i.product.clone()).collect();
                        store.save_products(&products).await?;
                        let stock = generator.demo_inventory(&catalog, anchor);
                        store.save_inventory(&stock).await?;
                        info!("Seeded {} products and {} batches", products.len(), stock.len());
                    }
                }
            }
        }
        Command::Weather { date } => {
            let store = open_store(&config).await?;
            let observation = generator.daily_weather(today_or(date));
            store.save_weather(std::slice::from_ref(&observation)).await?;
            println!("{}", serde_json::to_string_pretty(&observation)?);
        }
        Command::Sales { date } => {
            let date = today_or(date);
            let store = open_store(&config).await?;
            let weather = store.fetch_weather_on(date).await?;
            let mut inventory = store.fetch_inventory().await?;

            let sales = generator.simulate_day(&catalog, date, weather.as_ref(), &mut inventory);
            store.save_sales(&sales).await?;
            store.save_inventory(&inventory).await?;
            info!("Recorded {} sales for {}", sales.len(), date);
        }
        Command::Supply {
            product,
            quantity,
            date,
        } => {
            let Some(item) = catalog.iter().find(|i| i.product.product_id == product) else {
                bail!("Unknown product '{}'", product);
            };
            let store = open_store(&config).await?;
            let batch = supply_batch(&item.product, quantity, today_or(date));
            store.save_inventory(std::slice::from_ref(&batch)).await?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
    }

    Ok(())
}
