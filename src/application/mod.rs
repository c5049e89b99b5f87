// Feature derivation, training and online forecasting
pub mod ml;

// Replenishment alerts and the daily planning cycle
pub mod decision;

// Synthetic history for demos and tests
pub mod simulation;
