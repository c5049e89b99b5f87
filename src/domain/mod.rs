// Error taxonomy
pub mod errors;

// Catalog, stock and alert types
pub mod inventory;

// Feature contract, histories and datasets
pub mod ml;

// Learner interfaces
pub mod ports;

// Upstream history store abstraction
pub mod repositories;

// Sales, weather and prediction types
pub mod types;
