//! Online predictor.
//!
//! A [`ForecastService`] is built once from loaded artifacts and is then
//! read-only. [`ForecastEndpoint`] wraps it so a process whose artifacts
//! failed to load still answers every request, with `Unavailable`.

use crate::application::decision::replenishment::ReplenishmentAdvisor;
use crate::application::ml::feature_deriver::FeatureDeriver;
use crate::application::ml::forest_learner::ForestModel;
use crate::application::ml::request::{ForecastRequest, ForecastResponse, SalesPayload};
use crate::domain::errors::ForecastError;
use crate::domain::inventory::Product;
use crate::domain::ml::product_history::group_by_product;
use crate::domain::ml::{FeatureSchema, ProductHistory};
use crate::domain::ports::DemandModel;
use crate::domain::types::{ForecastOutcome, Prediction, SalesRecord, WeatherObservation};
use crate::infrastructure::artifact_store::ArtifactStore;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub struct ForecastService {
    model: Box<dyn DemandModel>,
    schema: FeatureSchema,
    deriver: FeatureDeriver,
    advisor: ReplenishmentAdvisor,
}

impl ForecastService {
    pub fn new(model: Box<dyn DemandModel>, schema: FeatureSchema, deriver: FeatureDeriver) -> Self {
        Self {
            model,
            schema,
            deriver,
            advisor: ReplenishmentAdvisor::default(),
        }
    }

    pub fn with_advisor(mut self, advisor: ReplenishmentAdvisor) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Derive, reconcile against the schema, predict, clamp.
    pub fn predict_product(
        &self,
        product_id: &str,
        history: Option<&ProductHistory>,
        weather: &WeatherObservation,
    ) -> Result<Prediction, ForecastError> {
        if product_id.trim().is_empty() {
            return Err(ForecastError::malformed("product_id is blank"));
        }
        let features = self.deriver.derive(product_id, history, weather)?;
        let row = self.schema.to_row(&features);
        let raw = self.model.predict_row(&row)?;
        debug!("{}: raw prediction {:.3}", product_id, raw);
        Ok(Prediction::from_raw(product_id, raw))
    }

    /// Forecasts every requested product, in request order.
    ///
    /// Only a bad weather observation fails the call; anything specific to one
    /// product becomes a `Failed` outcome for that product.
    pub fn forecast(&self, request: &ForecastRequest) -> Result<Vec<ForecastOutcome>, ForecastError> {
        let weather = request.weather_forecast.to_observation()?;
        FeatureDeriver::target_date(&weather)?;

        let mut sales_by_product: HashMap<&str, Vec<&SalesPayload>> = HashMap::new();
        for sale in &request.sales_history {
            sales_by_product
                .entry(sale.product_id.as_str())
                .or_default()
                .push(sale);
        }

        let outcomes: Vec<ForecastOutcome> = request
            .products
            .iter()
            .map(|product| {
                let product_id = product.product_id.as_str();
                let result = product_records(sales_by_product.get(product_id))
                    .and_then(|records| {
                        let history = ProductHistory::from_records(product_id, records);
                        let history = (!history.is_empty()).then_some(&history);
                        self.predict_product(product_id, history, &weather)
                    });
                match result {
                    Ok(prediction) => ForecastOutcome::Forecast(prediction),
                    Err(e) => {
                        warn!("Forecast failed for '{}': {}", product_id, e);
                        ForecastOutcome::failed(product_id, &e)
                    }
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.prediction().is_none()).count();
        info!(
            "Forecast {} products for {} ({} failed)",
            outcomes.len(),
            weather.date,
            failed
        );
        Ok(outcomes)
    }

    /// Forecasts from already-validated records, e.g. read from the history store.
    pub fn forecast_records(
        &self,
        product_ids: &[String],
        sales: &[SalesRecord],
        weather: &WeatherObservation,
    ) -> Result<Vec<ForecastOutcome>, ForecastError> {
        FeatureDeriver::target_date(weather)?;
        let histories = group_by_product(sales);

        Ok(product_ids
            .iter()
            .map(|product_id| {
                match self.predict_product(product_id, histories.get(product_id), weather) {
                    Ok(prediction) => ForecastOutcome::Forecast(prediction),
                    Err(e) => {
                        warn!("Forecast failed for '{}': {}", product_id, e);
                        ForecastOutcome::failed(product_id.as_str(), &e)
                    }
                }
            })
            .collect())
    }

    pub fn advisor(&self) -> &ReplenishmentAdvisor {
        &self.advisor
    }

    /// Forecasts plus, when the request carries inventory, replenishment alerts.
    pub fn handle(&self, request: &ForecastRequest) -> Result<ForecastResponse, ForecastError> {
        let forecasts = self.forecast(request)?;

        let alerts = match &request.inventory {
            Some(inventory) => {
                let today = request.weather_forecast.to_observation()?.date;
                let predictions: Vec<Prediction> =
                    forecasts.iter().filter_map(|o| o.prediction().cloned()).collect();
                let catalog: Vec<Product> =
                    request.products.iter().filter_map(|p| p.to_product()).collect();
                self.advisor
                    .advise(today, &predictions, &catalog, inventory)?
                    .alerts
            }
            None => Vec::new(),
        };

        Ok(ForecastResponse { forecasts, alerts })
    }
}

fn product_records(payloads: Option<&Vec<&SalesPayload>>) -> Result<Vec<SalesRecord>, ForecastError> {
    payloads
        .map(|payloads| payloads.iter().map(|p| p.to_record()).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}

/// Serving entry point. Holds either a ready service or the reason it is not.
pub enum ForecastEndpoint {
    Ready(ForecastService),
    Unavailable { reason: String },
}

impl ForecastEndpoint {
    /// Loads artifacts once. A load failure is logged and remembered, never retried.
    pub fn load(store: &ArtifactStore, deriver: FeatureDeriver, advisor: ReplenishmentAdvisor) -> Self {
        match store.load::<ForestModel>() {
            Ok((model, schema)) => {
                info!(
                    "Loaded {} trees over {} features",
                    model.n_trees(),
                    schema.len()
                );
                Self::from_parts(Box::new(model), schema, deriver, advisor)
            }
            Err(e) => {
                warn!("Model artifacts failed to load: {:#}", e);
                Self::Unavailable {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    /// A model whose input width disagrees with the schema is never served.
    pub fn from_parts(
        model: Box<dyn DemandModel>,
        schema: FeatureSchema,
        deriver: FeatureDeriver,
        advisor: ReplenishmentAdvisor,
    ) -> Self {
        if let Some(width) = model.input_width().filter(|w| *w != schema.len()) {
            let reason = format!(
                "model expects {} features but the schema lists {}",
                width,
                schema.len()
            );
            warn!("Model artifacts rejected: {}", reason);
            return Self::Unavailable { reason };
        }
        info!("Forecast service ready with {} ({} features)", model.name(), schema.len());
        Self::Ready(ForecastService::new(model, schema, deriver).with_advisor(advisor))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn service(&self) -> Result<&ForecastService, ForecastError> {
        match self {
            Self::Ready(service) => Ok(service),
            Self::Unavailable { reason } => Err(ForecastError::unavailable(reason.clone())),
        }
    }

    pub fn handle(&self, request: &ForecastRequest) -> Result<ForecastResponse, ForecastError> {
        self.service()?.handle(request)
    }
}
