use crate::domain::errors::ForecastError;
use crate::domain::ml::Dataset;
use crate::domain::ml::metrics::RegressionMetrics;
use crate::domain::ports::{DemandLearner, DemandModel, FitSummary};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use tracing::{debug, info};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Hyperparameters for the random-forest learner.
///
/// The ensemble grows in stages of `tree_step` trees up to `max_trees`.
/// Growth stops once `patience` consecutive stages fail to improve the
/// validation RMSE, and the best stage is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub max_trees: usize,
    pub tree_step: usize,
    pub patience: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            max_trees: 200,
            tree_step: 20,
            patience: 2,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn stages(&self) -> Vec<usize> {
        let step = self.tree_step.max(1);
        let max = self.max_trees.max(1);
        let mut stages: Vec<usize> = (1..).map(|i| i * step).take_while(|n| *n < max).collect();
        stages.push(max);
        stages
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForestLearner {
    params: ForestParams,
}

impl ForestLearner {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    fn fit_forest(&self, x: &DenseMatrix<f64>, y: &Vec<f64>, n_trees: usize) -> Result<Forest, ForecastError> {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(n_trees)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_seed(self.params.seed);

        RandomForestRegressor::fit(x, y, params)
            .map_err(|e| ForecastError::learner(format!("Training error: {}", e)))
    }
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ForecastError> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| ForecastError::learner(format!("Matrix error: {}", e)))
}

impl DemandLearner for ForestLearner {
    type Model = ForestModel;

    fn fit(&self, train: &Dataset, validation: &Dataset) -> Result<(ForestModel, FitSummary), ForecastError> {
        if train.is_empty() {
            return Err(ForecastError::learner("empty training partition"));
        }
        let x_train = to_matrix(&train.rows)?;
        let n_features = train.rows[0].len();

        if validation.is_empty() {
            let n_trees = self.params.max_trees.max(1);
            let forest = self.fit_forest(&x_train, &train.targets, n_trees)?;
            info!("Fitted {} trees without a validation partition", n_trees);
            return Ok((
                ForestModel {
                    forest,
                    n_trees,
                    n_features,
                },
                FitSummary {
                    n_estimators: n_trees,
                    validation_rmse: None,
                },
            ));
        }

        let x_val = to_matrix(&validation.rows)?;
        let mut best: Option<(ForestModel, f64)> = None;
        let mut stale = 0;

        for n_trees in self.params.stages() {
            let forest = self.fit_forest(&x_train, &train.targets, n_trees)?;
            let predictions = forest
                .predict(&x_val)
                .map_err(|e| ForecastError::learner(format!("Predict error: {}", e)))?;
            let rmse = RegressionMetrics::evaluate(&predictions, &validation.targets).rmse;
            debug!("Stage {} trees: validation RMSE {:.4}", n_trees, rmse);

            match &best {
                Some((_, best_rmse)) if rmse >= *best_rmse => {
                    stale += 1;
                    if stale >= self.params.patience.max(1) {
                        debug!("Early stopping after {} stale stages", stale);
                        break;
                    }
                }
                _ => {
                    stale = 0;
                    best = Some((
                        ForestModel {
                            forest,
                            n_trees,
                            n_features,
                        },
                        rmse,
                    ));
                }
            }
        }

        let (model, rmse) =
            best.ok_or_else(|| ForecastError::learner("no forest stage was fitted"))?;
        info!(
            "Kept {} trees (validation RMSE {:.4})",
            model.n_trees, rmse
        );
        let summary = FitSummary {
            n_estimators: model.n_trees,
            validation_rmse: Some(rmse),
        };
        Ok((model, summary))
    }
}

/// A fitted forest, persisted as JSON together with its input width.
#[derive(Serialize, Deserialize)]
pub struct ForestModel {
    forest: Forest,
    n_trees: usize,
    n_features: usize,
}

impl ForestModel {
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    fn check_width(&self, row: &[f64]) -> Result<(), ForecastError> {
        if row.len() != self.n_features {
            return Err(ForecastError::learner(format!(
                "row has {} features, model expects {}",
                row.len(),
                self.n_features
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ForestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForestModel")
            .field("n_trees", &self.n_trees)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

impl DemandModel for ForestModel {
    fn predict_row(&self, row: &[f64]) -> Result<f64, ForecastError> {
        self.check_width(row)?;
        let input = to_matrix(&[row.to_vec()])?;
        let predictions = self
            .forest
            .predict(&input)
            .map_err(|e| ForecastError::learner(format!("Prediction failed: {}", e)))?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::learner("No prediction returned"))
    }

    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for row in rows {
            self.check_width(row)?;
        }
        self.forest
            .predict(&to_matrix(rows)?)
            .map_err(|e| ForecastError::learner(format!("Prediction failed: {}", e)))
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}
