//! Repository Pattern Abstractions
//!
//! The history store is the upstream source of sales and weather projections
//! for training, plus the catalog and stock used for replenishment planning.
//! It also keeps what each daily run produced: forecasts and alerts.
//!
//! # Current Implementation
//!
//! - `SqliteHistoryRepository`: durable storage via sqlx
//! - `InMemoryHistoryRepository`: `Arc<RwLock>` storage for tests and demos

use crate::domain::inventory::{AlertAction, InventoryBatch, Product, ReplenishmentAlert};
use crate::domain::types::{DailyForecast, SalesRecord, WeatherObservation};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// All sales records, in storage order.
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>>;

    /// Sales with `start <= date < end`.
    async fn fetch_sales_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SalesRecord>>;

    async fn fetch_weather(&self) -> Result<Vec<WeatherObservation>>;

    async fn fetch_weather_on(&self, date: NaiveDate) -> Result<Option<WeatherObservation>>;

    /// Upserts on (product_id, date).
    async fn save_sales(&self, records: &[SalesRecord]) -> Result<()>;

    /// Upserts on date.
    async fn save_weather(&self, observations: &[WeatherObservation]) -> Result<()>;

    async fn fetch_products(&self) -> Result<Vec<Product>>;

    async fn save_products(&self, products: &[Product]) -> Result<()>;

    /// Batches with a positive quantity.
    async fn fetch_inventory(&self) -> Result<Vec<InventoryBatch>>;

    async fn save_inventory(&self, batches: &[InventoryBatch]) -> Result<()>;

    /// Replaces every forecast stored for `date`.
    async fn save_forecasts(&self, date: NaiveDate, forecasts: &[DailyForecast]) -> Result<()>;

    async fn fetch_forecasts(&self, date: NaiveDate) -> Result<Vec<DailyForecast>>;

    /// Replaces every alert stored for `date`.
    async fn save_alerts(&self, date: NaiveDate, alerts: &[ReplenishmentAlert]) -> Result<()>;

    /// Alerts for `date`, or every pending alert when no date is given.
    /// Newest date first, then by product.
    async fn fetch_alerts(&self, date: Option<NaiveDate>) -> Result<Vec<ReplenishmentAlert>>;

    /// Stored alerts of any status that recommend `action`.
    async fn count_alerts(&self, action: AlertAction) -> Result<u64>;
}
