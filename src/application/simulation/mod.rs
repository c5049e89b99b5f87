pub mod history_generator;

pub use history_generator::{HistoryGenerator, default_catalog};
