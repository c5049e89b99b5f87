//! Stockcast forecaster - next-day demand and replenishment alerts
//!
//! `serve` answers JSON request lines from a file or stdin, one JSON response
//! per line on stdout. `daily` runs one planning cycle against the history
//! store and prints the report. `alerts` and `kpis` read back what daily
//! runs stored.
//!
//! # Usage
//! ```sh
//! cargo run --bin forecast -- serve --input requests.jsonl
//! cargo run --bin forecast -- daily --date 2025-07-02
//! cargo run --bin forecast -- alerts --date 2025-07-03
//! cargo run --bin forecast -- kpis
//! ```
//!
//! # Environment Variables
//! - `MODEL_PATH`, `FEATURE_SCHEMA_PATH` - artifact locations
//! - `DATABASE_URL` - history store used by `daily`, `alerts` and `kpis`

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use stockcast::application::decision::{DailyPlanner, ReplenishmentAdvisor};
use stockcast::application::ml::request::ForecastRequest;
use stockcast::application::ml::{FeatureDeriver, ForecastEndpoint};
use stockcast::config::Config;
use stockcast::domain::errors::ForecastError;
use stockcast::infrastructure::persistence::{Database, SqliteHistoryRepository};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer forecast requests, one JSON object per line
    Serve {
        /// Request file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Forecast tomorrow for the whole catalog from the history store
    Daily {
        /// Day the forecast is made on (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Stored alerts for a day; all pending alerts when no date is given
    Alerts {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Markdown and reorder figures across the stored history
    Kpis,
}

async fn planner(config: &Config) -> Result<DailyPlanner> {
    let db = Database::new(&config.artifacts.database_url).await?;
    let repository = Arc::new(SqliteHistoryRepository::new(db.pool));
    Ok(DailyPlanner::new(repository, config.serving.history_days))
}

fn load_endpoint(config: &Config) -> ForecastEndpoint {
    let deriver = FeatureDeriver::new(config.serving.weather_defaults);
    let advisor = ReplenishmentAdvisor::new(config.decision.decision.clone());
    ForecastEndpoint::load(&config.artifact_store(), deriver, advisor)
}

fn error_line(error: &ForecastError) -> String {
    json!({ "error": { "kind": error.kind(), "message": error.to_string() } }).to_string()
}

fn serve(endpoint: &ForecastEndpoint, input: Box<dyn BufRead>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut answered = 0usize;

    for line in input.lines() {
        let line = line.context("Failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = serde_json::from_str::<ForecastRequest>(&line)
            .map_err(|e| ForecastError::malformed(format!("invalid request JSON: {}", e)))
            .and_then(|request| endpoint.handle(&request));

        let rendered = match response {
            Ok(response) => serde_json::to_string(&response)?,
            Err(e) => {
                warn!("Request rejected: {}", e);
                error_line(&e)
            }
        };
        writeln!(out, "{}", rendered)?;
        answered += 1;
    }

    out.flush()?;
    info!("Answered {} requests", answered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Responses own stdout; logs go to stderr
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { input } => {
            let reader: Box<dyn BufRead> = match input {
                Some(path) => Box::new(BufReader::new(
                    File::open(&path).with_context(|| format!("Failed to open {:?}", path))?,
                )),
                None => Box::new(BufReader::new(io::stdin())),
            };
            serve(&load_endpoint(&config), reader)
        }
        Command::Daily { date } => {
            let endpoint = load_endpoint(&config);
            let service = endpoint.service()?;
            let today = date.unwrap_or_else(|| Local::now().date_naive());

            let report = planner(&config).await?.run(service, today).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Alerts { date } => {
            let alerts = planner(&config).await?.alerts(date).await?;
            println!("{}", serde_json::to_string_pretty(&alerts)?);
            Ok(())
        }
        Command::Kpis => {
            let kpis = planner(&config).await?.kpis().await?;
            println!("{}", serde_json::to_string_pretty(&kpis)?);
            Ok(())
        }
    }
}
