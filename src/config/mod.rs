//! Configuration module for stockcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Artifacts, Training, Serving, and Decision.

mod artifact_config;
mod decision_config;
mod serving_config;
mod training_config;

pub use artifact_config::ArtifactEnvConfig;
pub use decision_config::DecisionEnvConfig;
pub use serving_config::ServingEnvConfig;
pub use training_config::TrainingEnvConfig;

use crate::infrastructure::artifact_store::ArtifactStore;
use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Reads `key`, falling back to `default` when unset.
fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .context(format!("Failed to parse {}", key))
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub artifacts: ArtifactEnvConfig,
    pub training: TrainingEnvConfig,
    pub serving: ServingEnvConfig,
    pub decision: DecisionEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            artifacts: ArtifactEnvConfig::from_env(),
            training: TrainingEnvConfig::from_env().context("Failed to load training config")?,
            serving: ServingEnvConfig::from_env().context("Failed to load serving config")?,
            decision: DecisionEnvConfig::from_env().context("Failed to load decision config")?,
        })
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(
            self.artifacts.model_path.clone(),
            self.artifacts.feature_schema_path.clone(),
        )
    }
}
