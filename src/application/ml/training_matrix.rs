//! Builds the supervised training matrix from the full history.
//!
//! Each row describes one (product, date) with that date's own sales as the
//! target. Lags and the rolling mean come from the product's earlier records
//! only, so the target never leaks into its own features.

use crate::application::ml::feature_deriver::{CalendarFeatures, SalesWindow, WeatherInputs, assemble};
use crate::domain::ml::feature_registry::{BASE_FEATURE_NAMES, weather_feature_name};
use crate::domain::ml::product_history::group_by_product;
use crate::domain::ml::{Dataset, FeatureSchema, FeatureVector, ProductHistory};
use crate::domain::errors::ForecastError;
use crate::domain::types::{SalesRecord, WeatherCondition, WeatherObservation};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub product_id: String,
    pub date: NaiveDate,
    pub features: FeatureVector,
    pub target: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatrixStats {
    /// Sales rows after the weather left join (one per product and date).
    pub joined_rows: usize,
    /// Leading rows without a full lag window.
    pub dropped_incomplete_window: usize,
    /// Rows whose date has no weather, or weather missing a measurement.
    pub dropped_weather_gap: usize,
    pub duplicates_resolved: usize,
}

impl MatrixStats {
    pub fn usable_rows(&self) -> usize {
        self.joined_rows - self.dropped_incomplete_window - self.dropped_weather_gap
    }
}

#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    pub schema: FeatureSchema,
    pub rows: Vec<TrainingRow>,
    pub stats: MatrixStats,
}

impl TrainingMatrix {
    /// Rows reconciled to the schema, paired with their targets.
    pub fn dataset(&self) -> Dataset {
        Dataset::new(
            self.rows
                .iter()
                .map(|row| self.schema.to_row(&row.features))
                .collect(),
            self.rows.iter().map(|row| row.target).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

enum RowOutcome {
    Kept(TrainingRow),
    IncompleteWindow,
    WeatherGap,
}

pub fn build_training_matrix(
    sales: &[SalesRecord],
    weather: &[WeatherObservation],
) -> Result<TrainingMatrix, ForecastError> {
    let weather_by_date: HashMap<NaiveDate, &WeatherObservation> =
        weather.iter().map(|w| (w.date, w)).collect();

    let histories = group_by_product(sales);
    let histories: Vec<&ProductHistory> = histories.values().collect();

    // One-hot columns come from every category present after the join,
    // including rows that are dropped later.
    let categories: BTreeSet<&WeatherCondition> = histories
        .iter()
        .flat_map(|h| h.records().iter())
        .filter_map(|r| weather_by_date.get(&r.date))
        .filter_map(|w| w.weather_condition.as_ref())
        .collect();

    let mut names: Vec<String> = BASE_FEATURE_NAMES.iter().map(|n| n.to_string()).collect();
    let mut weather_columns: Vec<String> = categories.iter().map(|c| weather_feature_name(c)).collect();
    weather_columns.sort();
    weather_columns.dedup();
    names.extend(weather_columns);
    let schema = FeatureSchema::new(names)?;

    let per_product: Vec<Vec<RowOutcome>> = histories
        .par_iter()
        .map(|history| product_rows(history, &weather_by_date))
        .collect();

    let mut stats = MatrixStats {
        duplicates_resolved: histories.iter().map(|h| h.duplicates_resolved()).sum(),
        ..MatrixStats::default()
    };
    let mut rows = Vec::new();
    for outcome in per_product.into_iter().flatten() {
        stats.joined_rows += 1;
        match outcome {
            RowOutcome::Kept(row) => rows.push(row),
            RowOutcome::IncompleteWindow => stats.dropped_incomplete_window += 1,
            RowOutcome::WeatherGap => stats.dropped_weather_gap += 1,
        }
    }

    Ok(TrainingMatrix {
        schema,
        rows,
        stats,
    })
}

fn product_rows(
    history: &ProductHistory,
    weather_by_date: &HashMap<NaiveDate, &WeatherObservation>,
) -> Vec<RowOutcome> {
    let records = history.records();
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let observation = weather_by_date.get(&record.date);
            let inputs = match observation {
                Some(w) => match (w.temperature_c, w.precipitation_mm) {
                    (Some(temperature_c), Some(precipitation_mm)) => WeatherInputs {
                        temperature_c,
                        precipitation_mm,
                        condition: w.weather_condition.clone(),
                    },
                    _ => return RowOutcome::WeatherGap,
                },
                None => return RowOutcome::WeatherGap,
            };

            let window = SalesWindow::from_prior(&records[..i]);
            if !window.is_complete() {
                return RowOutcome::IncompleteWindow;
            }
            let (lags, rolling_mean) = window.zero_filled();

            RowOutcome::Kept(TrainingRow {
                product_id: record.product_id.clone(),
                date: record.date,
                features: assemble(
                    &CalendarFeatures::for_date(record.date),
                    &lags,
                    rolling_mean,
                    &inputs,
                ),
                target: f64::from(record.units_sold),
            })
        })
        .collect()
}
