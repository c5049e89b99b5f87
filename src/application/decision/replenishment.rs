//! Turns next-day forecasts and current stock into replenishment alerts.
//!
//! Understocked products get a reorder quantity. Overstocked perishables are
//! either marked down, when their oldest batch is past half its shelf life,
//! or held.

use crate::domain::inventory::{
    AlertDetails, AlertKind, InventoryBatch, Product, ReplenishmentAlert,
};
use crate::domain::errors::ForecastError;
use crate::domain::types::{Prediction, next_day};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionConfig {
    /// Extra stock ordered on top of the forecast, as a fraction of it.
    pub safety_buffer: f64,
    /// Stock above `forecast * overstock_ratio` counts as overstock.
    pub overstock_ratio: f64,
    pub base_discount: f64,
    pub urgency_weight: f64,
    pub overstock_weight: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            safety_buffer: 0.10,
            overstock_ratio: 1.2,
            base_discount: 0.15,
            urgency_weight: 0.50,
            overstock_weight: 0.25,
        }
    }
}

/// Alerts for the target day, plus batches whose shelf price was marked down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advice {
    pub alerts: Vec<ReplenishmentAlert>,
    pub repriced: Vec<InventoryBatch>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplenishmentAdvisor {
    config: DecisionConfig,
}

impl ReplenishmentAdvisor {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// `today` is the day the forecast was made from; alerts are dated the day after.
    pub fn advise(
        &self,
        today: NaiveDate,
        forecasts: &[Prediction],
        products: &[Product],
        inventory: &[InventoryBatch],
    ) -> Result<Advice, ForecastError> {
        let alert_date = next_day(today)?;
        let catalog: HashMap<&str, &Product> =
            products.iter().map(|p| (p.product_id.as_str(), p)).collect();

        let mut advice = Advice::default();
        for forecast in forecasts {
            let batches: Vec<&InventoryBatch> = inventory
                .iter()
                .filter(|b| b.product_id == forecast.product_id && b.quantity > 0)
                .collect();
            let stock: u64 = batches.iter().map(|b| u64::from(b.quantity)).sum();
            let predicted = forecast.predicted_units;
            let forecasted_demand = predicted.round() as u64;

            if (stock as f64) < predicted {
                let buffer = (predicted * self.config.safety_buffer).ceil().max(0.0) as u64;
                let qty = forecasted_demand.saturating_add(buffer).saturating_sub(stock);
                advice.alerts.push(ReplenishmentAlert::new(
                    forecast.product_id.clone(),
                    alert_date,
                    AlertKind::Understock,
                    AlertDetails::Reorder {
                        current_stock: stock,
                        forecasted_demand,
                        recommended_qty: qty,
                    },
                ));
                continue;
            }

            if stock as f64 <= predicted * self.config.overstock_ratio {
                continue;
            }

            let Some(product) = catalog.get(forecast.product_id.as_str()) else {
                warn!("No catalog entry for overstocked {}", forecast.product_id);
                continue;
            };
            if !product.is_perishable {
                continue;
            }
            let Some(oldest_expiry) = batches.iter().filter_map(|b| b.expiry_date).min() else {
                debug!("{} is overstocked but no batch carries an expiry", product.product_id);
                continue;
            };

            let days_to_expiry = (oldest_expiry - today).num_days();
            let trigger = i64::from(product.shelf_life_days / 2);

            if days_to_expiry <= trigger {
                let new_price = self.markdown_price(product, stock, predicted, days_to_expiry, trigger);
                advice.repriced.extend(
                    batches
                        .iter()
                        .filter(|b| b.expiry_date.is_some_and(|e| e <= oldest_expiry))
                        .map(|b| InventoryBatch {
                            current_price: new_price,
                            ..(*b).clone()
                        }),
                );
                advice.alerts.push(ReplenishmentAlert::new(
                    product.product_id.clone(),
                    alert_date,
                    AlertKind::Overstock,
                    AlertDetails::ReducePrice {
                        current_stock: stock,
                        forecasted_demand,
                        days_to_expiry,
                        new_price,
                        original_price: product.selling_price,
                    },
                ));
            } else {
                advice.alerts.push(ReplenishmentAlert::new(
                    product.product_id.clone(),
                    alert_date,
                    AlertKind::Overstock,
                    AlertDetails::Hold {
                        current_stock: stock,
                        forecasted_demand,
                        days_to_expiry,
                    },
                ));
            }
        }

        info!(
            "{} alerts generated for {} ({} batches repriced)",
            advice.alerts.len(),
            alert_date,
            advice.repriced.len()
        );
        Ok(advice)
    }

    /// Discount grows with expiry urgency and with the size of the overstock.
    /// Never below cost unless the batch expires within a day.
    fn markdown_price(
        &self,
        product: &Product,
        stock: u64,
        predicted: f64,
        days_to_expiry: i64,
        trigger: i64,
    ) -> Decimal {
        let urgency = if trigger == 0 {
            1.0
        } else {
            1.0 - (days_to_expiry - 1) as f64 / trigger as f64
        };
        let ratio = stock as f64 / (predicted + 1.0);
        let discount = self.config.base_discount
            + self.config.urgency_weight * urgency
            + self.config.overstock_weight * (ratio - 1.0).ln_1p();

        let base = product.selling_price.to_f64().unwrap_or(0.0);
        let mut price = Decimal::from_f64(base * (1.0 - discount)).unwrap_or(Decimal::ZERO);

        if days_to_expiry <= 1 {
            price = product.cost_price * Decimal::new(90, 2);
        } else if price < product.cost_price {
            price = product.cost_price * Decimal::new(105, 2);
        }
        price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
