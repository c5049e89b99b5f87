//! Artifact and storage locations.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "data/ml/demand_forecast.json";
pub const DEFAULT_FEATURE_SCHEMA_PATH: &str = "data/ml/model_features.json";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/history.db";
pub const DEFAULT_HISTORY_DIR: &str = "data/history";

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEnvConfig {
    pub model_path: PathBuf,
    pub feature_schema_path: PathBuf,
    pub database_url: String,
    /// Directory holding `sales.csv` and `weather.csv`.
    pub history_dir: PathBuf,
}

impl Default for ArtifactEnvConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            feature_schema_path: PathBuf::from(DEFAULT_FEATURE_SCHEMA_PATH),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            history_dir: PathBuf::from(DEFAULT_HISTORY_DIR),
        }
    }
}

impl ArtifactEnvConfig {
    pub fn from_env() -> Self {
        Self {
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            feature_schema_path: env::var("FEATURE_SCHEMA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_FEATURE_SCHEMA_PATH)),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            history_dir: env::var("HISTORY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_HISTORY_DIR)),
        }
    }

    pub fn sales_csv(&self) -> PathBuf {
        self.history_dir.join("sales.csv")
    }

    pub fn weather_csv(&self) -> PathBuf {
        self.history_dir.join("weather.csv")
    }
}
