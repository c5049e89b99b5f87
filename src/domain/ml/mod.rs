pub mod dataset;
pub mod feature_registry;
pub mod feature_schema;
pub mod metrics;
pub mod product_history;

pub use dataset::Dataset;
pub use feature_schema::{FeatureSchema, FeatureVector};
pub use product_history::ProductHistory;
