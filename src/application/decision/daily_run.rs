//! One planning cycle against the history store.
//!
//! Reads today's weather and the recent sales window, forecasts tomorrow for
//! every catalog product and turns the forecasts into alerts. Tomorrow's
//! forecasts and alerts replace whatever an earlier run stored for that day;
//! marked-down batches are written back.

use crate::application::decision::kpis::{KpiSummary, summarize_kpis};
use crate::application::ml::feature_deriver::FeatureDeriver;
use crate::application::ml::forecast_service::ForecastService;
use crate::domain::inventory::{AlertAction, ReplenishmentAlert};
use crate::domain::repositories::HistoryRepository;
use crate::domain::types::{DailyForecast, ForecastOutcome, Prediction};
use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub forecasts: Vec<ForecastOutcome>,
    pub alerts: Vec<ReplenishmentAlert>,
    pub repriced_batches: usize,
}

pub struct DailyPlanner {
    repository: Arc<dyn HistoryRepository>,
    history_days: u32,
}

impl DailyPlanner {
    pub fn new(repository: Arc<dyn HistoryRepository>, history_days: u32) -> Self {
        Self {
            repository,
            history_days,
        }
    }

    pub async fn run(&self, service: &ForecastService, today: NaiveDate) -> Result<DailyReport> {
        let weather = self
            .repository
            .fetch_weather_on(today)
            .await?
            .ok_or_else(|| anyhow!("No weather observation stored for {}", today))?;

        let start = today - Duration::days(i64::from(self.history_days));
        let end = today + Duration::days(1);
        let sales = self.repository.fetch_sales_between(start, end).await?;

        let products = self.repository.fetch_products().await?;
        let product_ids: Vec<String> = products.iter().map(|p| p.product_id.clone()).collect();

        let target = FeatureDeriver::target_date(&weather)?;
        let forecasts = service
            .forecast_records(&product_ids, &sales, &weather)
            .context("Daily forecast failed")?;
        let predictions: Vec<Prediction> =
            forecasts.iter().filter_map(|o| o.prediction().cloned()).collect();

        let stored: Vec<DailyForecast> = predictions
            .iter()
            .map(|p| DailyForecast {
                product_id: p.product_id.clone(),
                date: target,
                predicted_units: p.predicted_units,
                model_version: service.model_name().to_string(),
            })
            .collect();
        self.repository.save_forecasts(target, &stored).await?;

        let inventory = self.repository.fetch_inventory().await?;
        let advice = service
            .advisor()
            .advise(today, &predictions, &products, &inventory)
            .context("Replenishment advice failed")?;

        self.repository.save_alerts(target, &advice.alerts).await?;
        if !advice.repriced.is_empty() {
            self.repository.save_inventory(&advice.repriced).await?;
        }

        info!(
            "Daily run for {}: {} forecasts, {} alerts, {} batches repriced",
            today,
            forecasts.len(),
            advice.alerts.len(),
            advice.repriced.len()
        );

        Ok(DailyReport {
            date: today,
            forecasts,
            alerts: advice.alerts,
            repriced_batches: advice.repriced.len(),
        })
    }

    /// Alerts for one day, or all pending alerts.
    pub async fn alerts(&self, date: Option<NaiveDate>) -> Result<Vec<ReplenishmentAlert>> {
        self.repository.fetch_alerts(date).await
    }

    pub async fn kpis(&self) -> Result<KpiSummary> {
        let sales = self.repository.fetch_sales().await?;
        let products = self.repository.fetch_products().await?;
        let reorders = self.repository.count_alerts(AlertAction::Reorder).await?;
        Ok(summarize_kpis(&sales, &products, reorders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::feature_deriver::FeatureDeriver;
    use crate::domain::errors::ForecastError;
    use crate::domain::inventory::{AlertDetails, InventoryBatch, Product};
    use crate::domain::ml::FeatureSchema;
    use crate::domain::ports::DemandModel;
    use crate::domain::types::{SalesRecord, WeatherCondition, WeatherObservation};
    use crate::infrastructure::repositories::in_memory::InMemoryHistoryRepository;
    use rust_decimal_macros::dec;

    struct LagModel;

    impl DemandModel for LagModel {
        fn predict_row(&self, row: &[f64]) -> Result<f64, ForecastError> {
            Ok(row[0])
        }

        fn name(&self) -> &str {
            "lag"
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn service() -> ForecastService {
        let schema = FeatureSchema::new(vec!["sales_lag_1".into()]).unwrap();
        ForecastService::new(Box::new(LagModel), schema, FeatureDeriver::default())
    }

    fn milk() -> Product {
        Product {
            product_id: "P1".into(),
            name: "Milk".into(),
            category: "Dairy".into(),
            selling_price: dec!(3.50),
            cost_price: dec!(2.00),
            is_perishable: true,
            shelf_life_days: 7,
        }
    }

    #[tokio::test]
    async fn test_daily_run_reorders_understocked_product() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        repo.save_products(&[milk()]).await.unwrap();
        repo.save_weather(&[WeatherObservation::new(day(10), 30.0, 0.0, WeatherCondition::Sunny)])
            .await
            .unwrap();
        repo.save_sales(&[SalesRecord::new("P1", day(9), 4), SalesRecord::new("P1", day(10), 20)])
            .await
            .unwrap();
        repo.save_inventory(&[InventoryBatch {
            batch_id: "B1".into(),
            product_id: "P1".into(),
            quantity: 5,
            expiry_date: Some(day(15)),
            current_price: dec!(3.50),
        }])
        .await
        .unwrap();

        let planner = DailyPlanner::new(repo.clone(), 14);
        let report = planner.run(&service(), day(10)).await.unwrap();

        assert_eq!(report.forecasts.len(), 1);
        assert_eq!(report.forecasts[0].prediction().unwrap().predicted_units, 20.0);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].date, day(11));
        assert!(matches!(
            report.alerts[0].details,
            AlertDetails::Reorder { recommended_qty: 17, .. }
        ));
        assert_eq!(report.repriced_batches, 0);

        let stored = repo.fetch_forecasts(day(11)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].predicted_units, 20.0);
        assert_eq!(stored[0].model_version, "lag");
        assert_eq!(planner.alerts(Some(day(11))).await.unwrap(), report.alerts);
        assert_eq!(planner.kpis().await.unwrap().reorders_triggered, 1);
    }

    #[tokio::test]
    async fn test_rerun_replaces_stored_day() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        repo.save_products(&[milk()]).await.unwrap();
        repo.save_weather(&[WeatherObservation::new(day(10), 30.0, 0.0, WeatherCondition::Sunny)])
            .await
            .unwrap();
        repo.save_sales(&[SalesRecord::new("P1", day(10), 8)]).await.unwrap();

        let planner = DailyPlanner::new(repo.clone(), 14);
        planner.run(&service(), day(10)).await.unwrap();
        repo.save_sales(&[SalesRecord::new("P1", day(10), 12)]).await.unwrap();
        let second = planner.run(&service(), day(10)).await.unwrap();

        let stored = repo.fetch_forecasts(day(11)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].predicted_units, 12.0);
        let alerts = planner.alerts(Some(day(11))).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, second.alerts[0].id);
        assert_eq!(planner.alerts(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_daily_run_requires_weather_for_today() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        repo.save_products(&[milk()]).await.unwrap();

        let planner = DailyPlanner::new(repo, 14);
        assert!(planner.run(&service(), day(10)).await.is_err());
    }
}
