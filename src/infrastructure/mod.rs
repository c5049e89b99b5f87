pub mod artifact_store;
pub mod csv_history;
pub mod persistence;
pub mod repositories;

pub use artifact_store::ArtifactStore;
