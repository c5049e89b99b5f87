//! In-Memory History Store
//!
//! Thread-safe implementation of `HistoryRepository` backed by
//! `Arc<RwLock>` collections. Used by tests and by the seeder's dry runs.
//!
//! # Limitations
//!
//! - Data is lost on application restart
//! - Limited by available RAM

use crate::domain::inventory::{AlertAction, AlertStatus, InventoryBatch, Product, ReplenishmentAlert};
use crate::domain::repositories::HistoryRepository;
use crate::domain::types::{DailyForecast, SalesRecord, WeatherObservation};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryHistoryRepository {
    sales: Arc<RwLock<BTreeMap<(String, NaiveDate), SalesRecord>>>,
    weather: Arc<RwLock<BTreeMap<NaiveDate, WeatherObservation>>>,
    products: Arc<RwLock<BTreeMap<String, Product>>>,
    inventory: Arc<RwLock<BTreeMap<String, InventoryBatch>>>,
    forecasts: Arc<RwLock<BTreeMap<NaiveDate, Vec<DailyForecast>>>>,
    alerts: Arc<RwLock<BTreeMap<NaiveDate, Vec<ReplenishmentAlert>>>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>> {
        Ok(self.sales.read().await.values().cloned().collect())
    }

    async fn fetch_sales_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SalesRecord>> {
        let sales = self.sales.read().await;
        Ok(sales
            .values()
            .filter(|r| r.date >= start && r.date < end)
            .cloned()
            .collect())
    }

    async fn fetch_weather(&self) -> Result<Vec<WeatherObservation>> {
        Ok(self.weather.read().await.values().cloned().collect())
    }

    async fn fetch_weather_on(&self, date: NaiveDate) -> Result<Option<WeatherObservation>> {
        Ok(self.weather.read().await.get(&date).cloned())
    }

    async fn save_sales(&self, records: &[SalesRecord]) -> Result<()> {
        let mut sales = self.sales.write().await;
        for record in records {
            sales.insert((record.product_id.clone(), record.date), record.clone());
        }
        Ok(())
    }

    async fn save_weather(&self, observations: &[WeatherObservation]) -> Result<()> {
        let mut weather = self.weather.write().await;
        for observation in observations {
            weather.insert(observation.date, observation.clone());
        }
        Ok(())
    }

    async fn fetch_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn save_products(&self, products: &[Product]) -> Result<()> {
        let mut stored = self.products.write().await;
        for product in products {
            stored.insert(product.product_id.clone(), product.clone());
        }
        Ok(())
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryBatch>> {
        let inventory = self.inventory.read().await;
        Ok(inventory
            .values()
            .filter(|b| b.quantity > 0)
            .cloned()
            .collect())
    }

    async fn save_inventory(&self, batches: &[InventoryBatch]) -> Result<()> {
        let mut inventory = self.inventory.write().await;
        for batch in batches {
            inventory.insert(batch.batch_id.clone(), batch.clone());
        }
        Ok(())
    }

    async fn save_forecasts(&self, date: NaiveDate, forecasts: &[DailyForecast]) -> Result<()> {
        let mut stored: Vec<DailyForecast> = forecasts
            .iter()
            .map(|f| DailyForecast { date, ..f.clone() })
            .collect();
        stored.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        self.forecasts.write().await.insert(date, stored);
        Ok(())
    }

    async fn fetch_forecasts(&self, date: NaiveDate) -> Result<Vec<DailyForecast>> {
        Ok(self
            .forecasts
            .read()
            .await
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_alerts(&self, date: NaiveDate, alerts: &[ReplenishmentAlert]) -> Result<()> {
        let mut stored: Vec<ReplenishmentAlert> = alerts
            .iter()
            .map(|a| ReplenishmentAlert { date, ..a.clone() })
            .collect();
        stored.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        self.alerts.write().await.insert(date, stored);
        Ok(())
    }

    async fn fetch_alerts(&self, date: Option<NaiveDate>) -> Result<Vec<ReplenishmentAlert>> {
        let alerts = self.alerts.read().await;
        Ok(match date {
            Some(date) => alerts.get(&date).cloned().unwrap_or_default(),
            None => alerts
                .values()
                .rev()
                .flatten()
                .filter(|a| a.status == AlertStatus::Pending)
                .cloned()
                .collect(),
        })
    }

    async fn count_alerts(&self, action: AlertAction) -> Result<u64> {
        let alerts = self.alerts.read().await;
        Ok(alerts.values().flatten().filter(|a| a.action() == action).count() as u64)
    }
}
