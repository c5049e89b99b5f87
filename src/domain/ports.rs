use crate::domain::errors::ForecastError;
use crate::domain::ml::Dataset;

/// A fitted regression model. Rows must already be reconciled to the
/// feature schema the model was trained with.
pub trait DemandModel: Send + Sync {
    fn predict_row(&self, row: &[f64]) -> Result<f64, ForecastError>;

    /// Batch inference, used for validation metrics.
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Number of columns the model was fitted on, when it records one.
    fn input_width(&self) -> Option<usize> {
        None
    }

    /// Get model name/type
    fn name(&self) -> &str;
}

impl<M: DemandModel + ?Sized> DemandModel for Box<M> {
    fn predict_row(&self, row: &[f64]) -> Result<f64, ForecastError> {
        (**self).predict_row(row)
    }

    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        (**self).predict_rows(rows)
    }

    fn input_width(&self) -> Option<usize> {
        (**self).input_width()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// What the learner reports about a fit, beyond the model itself.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    /// Ensemble size kept after early stopping.
    pub n_estimators: usize,
    /// Validation RMSE of the kept model, if a validation set was provided.
    pub validation_rmse: Option<f64>,
}

/// The external learner: fits on a training partition and early-stops
/// against a validation partition.
pub trait DemandLearner {
    type Model: DemandModel;

    fn fit(
        &self,
        train: &Dataset,
        validation: &Dataset,
    ) -> Result<(Self::Model, FitSummary), ForecastError>;
}
