//! Online predictor settings.

use super::parse_var;
use crate::application::ml::feature_deriver::WeatherDefaults;
use crate::domain::ml::feature_registry::{DEFAULT_PRECIPITATION_MM, DEFAULT_TEMPERATURE_C};
use anyhow::{Result, ensure};

#[derive(Debug, Clone, PartialEq)]
pub struct ServingEnvConfig {
    pub weather_defaults: WeatherDefaults,
    /// Days of sales history the daily run loads before the forecast day.
    pub history_days: u32,
}

impl ServingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let history_days = parse_var("SERVING_HISTORY_DAYS", 14u32)?;
        ensure!(history_days >= 1, "SERVING_HISTORY_DAYS must be at least 1");

        Ok(Self {
            weather_defaults: WeatherDefaults {
                temperature_c: parse_var("DEFAULT_TEMPERATURE_C", DEFAULT_TEMPERATURE_C)?,
                precipitation_mm: parse_var("DEFAULT_PRECIPITATION_MM", DEFAULT_PRECIPITATION_MM)?,
            },
            history_days,
        })
    }
}
