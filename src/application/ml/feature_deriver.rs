//! Feature derivation shared by training and serving.
//!
//! Training and serving must produce identical features for the same product
//! and date. Both go through [`SalesWindow::from_prior`] and [`assemble`]; they
//! differ only in fill policy: serving zero-fills incomplete windows and
//! defaults missing weather, training drops such rows.

use crate::domain::errors::ForecastError;
use crate::domain::ml::ProductHistory;
use crate::domain::ml::feature_registry::{
    DAY_OF_MONTH, DAY_OF_WEEK, DEFAULT_PRECIPITATION_MM, DEFAULT_TEMPERATURE_C, IS_WEEKEND, MONTH,
    PRECIPITATION_MM, ROLLING_WINDOW, SALES_LAGS, SALES_ROLLING_MEAN, TEMPERATURE_C,
    lag_feature_name, weather_feature_name,
};
use crate::domain::ml::FeatureVector;
use crate::domain::types::{SalesRecord, WeatherCondition, WeatherObservation, next_day};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub is_weekend: bool,
}

impl CalendarFeatures {
    pub fn for_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            day_of_week,
            day_of_month: date.day(),
            month: date.month(),
            is_weekend: day_of_week >= 5,
        }
    }
}

/// Lag and rolling-mean inputs taken from records strictly before the target date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesWindow {
    lags: [Option<f64>; SALES_LAGS.len()],
    rolling_mean: Option<f64>,
}

impl SalesWindow {
    /// `prior` must be date-sorted and must not contain the target date.
    pub fn from_prior(prior: &[SalesRecord]) -> Self {
        let n = prior.len();
        let lags = SALES_LAGS.map(|lag| {
            if n >= lag {
                Some(f64::from(prior[n - lag].units_sold))
            } else {
                None
            }
        });

        let window = &prior[n.saturating_sub(ROLLING_WINDOW)..];
        let rolling_mean = if window.is_empty() {
            None
        } else {
            let total: f64 = window.iter().map(|r| f64::from(r.units_sold)).sum();
            Some(total / window.len() as f64)
        };

        Self { lags, rolling_mean }
    }

    pub fn lag(&self, lag: usize) -> Option<f64> {
        SALES_LAGS
            .iter()
            .position(|&l| l == lag)
            .and_then(|idx| self.lags[idx])
    }

    pub fn rolling_mean(&self) -> Option<f64> {
        self.rolling_mean
    }

    /// True when every lag and the rolling mean are backed by real records.
    pub fn is_complete(&self) -> bool {
        self.lags.iter().all(Option::is_some) && self.rolling_mean.is_some()
    }

    /// Sparse-data policy: a missing lag or mean is a real zero, not a gap.
    pub fn zero_filled(&self) -> ([f64; SALES_LAGS.len()], f64) {
        (
            self.lags.map(|v| v.unwrap_or(0.0)),
            self.rolling_mean.unwrap_or(0.0),
        )
    }
}

/// Weather values after fill rules have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherInputs {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub condition: Option<WeatherCondition>,
}

/// Builds the feature vector in registry order. Only the observed weather
/// condition gets a column; the schema supplies the rest as zeros.
pub fn assemble(
    calendar: &CalendarFeatures,
    lags: &[f64; SALES_LAGS.len()],
    rolling_mean: f64,
    weather: &WeatherInputs,
) -> FeatureVector {
    let mut features = FeatureVector::new();
    features.insert(TEMPERATURE_C, weather.temperature_c);
    features.insert(PRECIPITATION_MM, weather.precipitation_mm);
    features.insert(DAY_OF_WEEK, f64::from(calendar.day_of_week));
    features.insert(DAY_OF_MONTH, f64::from(calendar.day_of_month));
    features.insert(MONTH, f64::from(calendar.month));
    features.insert(IS_WEEKEND, if calendar.is_weekend { 1.0 } else { 0.0 });
    for (lag, value) in SALES_LAGS.iter().zip(lags.iter()) {
        features.insert(lag_feature_name(*lag), *value);
    }
    features.insert(SALES_ROLLING_MEAN, rolling_mean);
    if let Some(condition) = &weather.condition {
        features.insert(weather_feature_name(condition), 1.0);
    }
    features
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherDefaults {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
}

impl Default for WeatherDefaults {
    fn default() -> Self {
        Self {
            temperature_c: DEFAULT_TEMPERATURE_C,
            precipitation_mm: DEFAULT_PRECIPITATION_MM,
        }
    }
}

/// Serving-side deriver: one product, one weather observation anchored at the
/// day before the forecast target.
#[derive(Debug, Clone, Default)]
pub struct FeatureDeriver {
    defaults: WeatherDefaults,
}

impl FeatureDeriver {
    pub fn new(defaults: WeatherDefaults) -> Self {
        Self { defaults }
    }

    /// The forecast target: the day after the weather observation.
    pub fn target_date(weather: &WeatherObservation) -> Result<NaiveDate, ForecastError> {
        next_day(weather.date)
    }

    /// Derives the feature vector for `weather.date + 1`.
    ///
    /// A product with no history is not an error; its lags and rolling mean are 0.
    pub fn derive(
        &self,
        product_id: &str,
        history: Option<&ProductHistory>,
        weather: &WeatherObservation,
    ) -> Result<FeatureVector, ForecastError> {
        let target = Self::target_date(weather)?;

        let prior: &[SalesRecord] = match history {
            Some(history) => history.prior_to(target),
            None => {
                debug!("No sales history for {}; lag features zero-filled", product_id);
                &[]
            }
        };

        let (lags, rolling_mean) = SalesWindow::from_prior(prior).zero_filled();
        let inputs = WeatherInputs {
            temperature_c: weather.temperature_c.unwrap_or(self.defaults.temperature_c),
            precipitation_mm: weather
                .precipitation_mm
                .unwrap_or(self.defaults.precipitation_mm),
            condition: weather.weather_condition.clone(),
        };

        Ok(assemble(
            &CalendarFeatures::for_date(target),
            &lags,
            rolling_mean,
            &inputs,
        ))
    }

    /// Convenience over raw records in arbitrary order, possibly mixing products.
    pub fn derive_from_records(
        &self,
        product_id: &str,
        records: &[SalesRecord],
        weather: &WeatherObservation,
    ) -> Result<FeatureVector, ForecastError> {
        let history = ProductHistory::from_records(product_id, records.iter().cloned());
        let history = (!history.is_empty()).then_some(&history);
        self.derive(product_id, history, weather)
    }
}
