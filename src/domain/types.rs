use crate::domain::errors::ForecastError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One day of sales for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_id: String,
    pub date: NaiveDate,
    pub units_sold: u32,
    pub price_at_sale: f64,
}

impl SalesRecord {
    pub fn new(product_id: impl Into<String>, date: NaiveDate, units_sold: u32) -> Self {
        Self {
            product_id: product_id.into(),
            date,
            units_sold,
            price_at_sale: 0.0,
        }
    }

    pub fn with_price(mut self, price_at_sale: f64) -> Self {
        self.price_at_sale = price_at_sale;
        self
    }
}

/// Weather category as reported by the upstream weather feed.
///
/// The four known labels are first-class; anything else is kept verbatim so
/// training can still one-hot it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WeatherCondition {
    Sunny,
    Rainy,
    Cloudy,
    Storm,
    Other(String),
}

impl WeatherCondition {
    pub fn label(&self) -> &str {
        match self {
            WeatherCondition::Sunny => "Sunny",
            WeatherCondition::Rainy => "Rainy",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Storm => "Storm",
            WeatherCondition::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Sunny" => WeatherCondition::Sunny,
            "Rainy" => WeatherCondition::Rainy,
            "Cloudy" => WeatherCondition::Cloudy,
            "Storm" => WeatherCondition::Storm,
            other => WeatherCondition::Other(other.to_string()),
        }
    }
}

impl From<String> for WeatherCondition {
    fn from(label: String) -> Self {
        WeatherCondition::from_label(&label)
    }
}

impl From<WeatherCondition> for String {
    fn from(condition: WeatherCondition) -> Self {
        condition.label().to_string()
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Daily weather observation. Measurements are optional because the upstream
/// store may have gaps; training drops such rows, serving substitutes defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub temperature_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub weather_condition: Option<WeatherCondition>,
}

impl WeatherObservation {
    pub fn new(
        date: NaiveDate,
        temperature_c: f64,
        precipitation_mm: f64,
        condition: WeatherCondition,
    ) -> Self {
        Self {
            date,
            temperature_c: Some(temperature_c),
            precipitation_mm: Some(precipitation_mm),
            weather_condition: Some(condition),
        }
    }
}

/// Next-day demand for one product. `predicted_units` is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub product_id: String,
    pub predicted_units: f64,
}

impl Prediction {
    /// Clamps raw model output at zero. NaN output also maps to zero.
    pub fn from_raw(product_id: impl Into<String>, raw_output: f64) -> Self {
        Self {
            product_id: product_id.into(),
            predicted_units: raw_output.max(0.0),
        }
    }
}

/// A forecast as stored by the daily run, keyed on (product_id, date).
/// `date` is the day the forecast is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub product_id: String,
    pub date: NaiveDate,
    pub predicted_units: f64,
    pub model_version: String,
}

/// Per-product result of a batch forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Forecast(Prediction),
    Failed {
        product_id: String,
        kind: String,
        error: String,
    },
}

impl ForecastOutcome {
    pub fn failed(product_id: impl Into<String>, error: &ForecastError) -> Self {
        ForecastOutcome::Failed {
            product_id: product_id.into(),
            kind: error.kind().to_string(),
            error: error.to_string(),
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            ForecastOutcome::Forecast(prediction) => &prediction.product_id,
            ForecastOutcome::Failed { product_id, .. } => product_id,
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            ForecastOutcome::Forecast(prediction) => Some(prediction),
            ForecastOutcome::Failed { .. } => None,
        }
    }
}

/// Parses the date formats the upstream feeds emit: plain `YYYY-MM-DD`,
/// RFC 3339 timestamps (`2025-07-02T00:00:00.000Z`) and naive timestamps.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, ForecastError> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.naive_utc().date());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(timestamp.date());
        }
    }

    Err(ForecastError::malformed(format!(
        "could not parse '{}' as a calendar date",
        raw
    )))
}

/// A unit count read as a float: whole, non-negative and within `u32`.
pub fn whole_units(units: f64) -> Option<u32> {
    let valid = units.is_finite() && units >= 0.0 && units.fract() == 0.0 && units <= f64::from(u32::MAX);
    valid.then_some(units as u32)
}

/// The calendar day after `date`. Fails at the end of the representable range.
pub fn next_day(date: NaiveDate) -> Result<NaiveDate, ForecastError> {
    date.succ_opt()
        .ok_or_else(|| ForecastError::malformed(format!("no calendar day follows {}", date)))
}
