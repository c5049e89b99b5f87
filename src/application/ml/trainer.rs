//! Batch training: history in, fitted model and feature schema out.

use crate::application::ml::training_matrix::{MatrixStats, build_training_matrix};
use crate::domain::errors::ForecastError;
use crate::domain::ml::FeatureSchema;
use crate::domain::ml::metrics::RegressionMetrics;
use crate::domain::ports::{DemandLearner, DemandModel};
use crate::domain::types::{SalesRecord, WeatherObservation};
use crate::infrastructure::artifact_store::ArtifactStore;
use serde::Serialize;
use tracing::{info, warn};

/// Below this many usable rows nothing is fitted or written.
pub const MIN_TRAINING_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub validation_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows_joined: usize,
    pub rows_used: usize,
    pub rows_dropped_incomplete_window: usize,
    pub rows_dropped_weather_gap: usize,
    pub duplicates_resolved: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub feature_count: usize,
    pub n_estimators: usize,
    pub validation_rmse: Option<f64>,
    pub validation_mae: Option<f64>,
    pub validation_r2: Option<f64>,
}

pub struct TrainedArtifacts<M> {
    pub model: M,
    pub schema: FeatureSchema,
    pub report: TrainingReport,
}

pub struct BatchTrainer<L> {
    learner: L,
    split: SplitConfig,
}

impl<L: DemandLearner> BatchTrainer<L> {
    pub fn new(learner: L, split: SplitConfig) -> Self {
        Self { learner, split }
    }

    pub fn train(
        &self,
        sales: &[SalesRecord],
        weather: &[WeatherObservation],
    ) -> Result<TrainedArtifacts<L::Model>, ForecastError> {
        let matrix = build_training_matrix(sales, weather)?;
        let stats: MatrixStats = matrix.stats;

        if stats.duplicates_resolved > 0 {
            warn!(
                "{} duplicate (product, date) records resolved last-wins",
                stats.duplicates_resolved
            );
        }
        info!(
            "Training matrix: {} usable of {} joined rows ({} without full lag window, {} weather gaps)",
            matrix.len(),
            stats.joined_rows,
            stats.dropped_incomplete_window,
            stats.dropped_weather_gap
        );

        if matrix.len() < MIN_TRAINING_ROWS {
            return Err(ForecastError::InsufficientData {
                rows: matrix.len(),
                required: MIN_TRAINING_ROWS,
            });
        }

        let (train, validation) = matrix
            .dataset()
            .split(self.split.validation_fraction, self.split.seed);
        info!(
            "Fitting on {} rows, validating on {} rows ({} features)",
            train.len(),
            validation.len(),
            matrix.schema.len()
        );

        let (model, summary) = self.learner.fit(&train, &validation)?;

        let metrics = if validation.is_empty() {
            None
        } else {
            let predictions = model.predict_rows(&validation.rows)?;
            Some(RegressionMetrics::evaluate(&predictions, &validation.targets))
        };
        if let Some(m) = &metrics {
            info!(
                "Validation (n={}): RMSE={:.4}, MAE={:.4}, R²={:.4}",
                validation.len(),
                m.rmse,
                m.mae,
                m.r2
            );
        }

        let report = TrainingReport {
            rows_joined: stats.joined_rows,
            rows_used: matrix.len(),
            rows_dropped_incomplete_window: stats.dropped_incomplete_window,
            rows_dropped_weather_gap: stats.dropped_weather_gap,
            duplicates_resolved: stats.duplicates_resolved,
            train_rows: train.len(),
            validation_rows: validation.len(),
            feature_count: matrix.schema.len(),
            n_estimators: summary.n_estimators,
            validation_rmse: metrics.map(|m| m.rmse),
            validation_mae: metrics.map(|m| m.mae),
            validation_r2: metrics.map(|m| m.r2),
        };

        Ok(TrainedArtifacts {
            model,
            schema: matrix.schema,
            report,
        })
    }
}

impl<L> BatchTrainer<L>
where
    L: DemandLearner,
    L::Model: Serialize,
{
    /// Trains, then writes model and schema. A failed run leaves any
    /// previously persisted artifacts untouched.
    pub fn train_and_persist(
        &self,
        sales: &[SalesRecord],
        weather: &[WeatherObservation],
        store: &ArtifactStore,
    ) -> Result<TrainingReport, ForecastError> {
        let artifacts = self.train(sales, weather)?;
        store
            .save(&artifacts.model, &artifacts.schema)
            .map_err(|e| ForecastError::artifact(format!("{:#}", e)))?;
        Ok(artifacts.report)
    }
}
