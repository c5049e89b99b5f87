pub mod feature_deriver;
pub mod forecast_service;
pub mod forest_learner;
pub mod request;
pub mod trainer;
pub mod training_matrix;

pub use feature_deriver::FeatureDeriver;
pub use forecast_service::{ForecastEndpoint, ForecastService};
pub use trainer::{BatchTrainer, SplitConfig, TrainingReport};
