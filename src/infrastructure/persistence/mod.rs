pub mod database;
pub mod history_repository;

pub use database::Database;
pub use history_repository::SqliteHistoryRepository;
