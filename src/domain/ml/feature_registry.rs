use crate::domain::types::WeatherCondition;

/// Lag offsets, in records, used for `sales_lag_{n}` features.
pub const SALES_LAGS: [usize; 4] = [1, 2, 3, 7];

/// Number of prior records averaged into `sales_rolling_mean_7`.
pub const ROLLING_WINDOW: usize = 7;

pub const TEMPERATURE_C: &str = "temperature_c";
pub const PRECIPITATION_MM: &str = "precipitation_mm";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const DAY_OF_MONTH: &str = "day_of_month";
pub const MONTH: &str = "month";
pub const IS_WEEKEND: &str = "is_weekend";
pub const SALES_ROLLING_MEAN: &str = "sales_rolling_mean_7";

pub const WEATHER_PREFIX: &str = "weather_";

/// Fallbacks applied at serving time when the forecast feed omits a measurement.
pub const DEFAULT_TEMPERATURE_C: f64 = 28.0;
pub const DEFAULT_PRECIPITATION_MM: f64 = 0.0;

/// Ordered list of the non-categorical feature columns.
/// Weather one-hot columns follow these, sorted by label.
/// Any change here is a breaking change for persisted models.
pub const BASE_FEATURE_NAMES: &[&str] = &[
    TEMPERATURE_C,
    PRECIPITATION_MM,
    DAY_OF_WEEK,
    DAY_OF_MONTH,
    MONTH,
    IS_WEEKEND,
    "sales_lag_1",
    "sales_lag_2",
    "sales_lag_3",
    "sales_lag_7",
    SALES_ROLLING_MEAN,
];

pub fn lag_feature_name(lag: usize) -> String {
    format!("sales_lag_{}", lag)
}

pub fn weather_feature_name(condition: &WeatherCondition) -> String {
    format!("{}{}", WEATHER_PREFIX, condition.label())
}

pub fn is_weather_feature(name: &str) -> bool {
    name.starts_with(WEATHER_PREFIX)
}
