//! Wire types for the online predictor.
//!
//! Payloads arrive loosely typed (dates as strings, units as JSON numbers)
//! and are validated here into domain records. Validation of the shared
//! weather observation fails the whole request; validation of a sales
//! record only fails the product it belongs to.

use crate::domain::errors::ForecastError;
use crate::domain::inventory::{InventoryBatch, Product, ReplenishmentAlert};
use crate::domain::types::{
    ForecastOutcome, SalesRecord, WeatherCondition, WeatherObservation, parse_calendar_date,
    whole_units,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPayload {
    pub product_id: String,
    pub date: String,
    pub units_sold: f64,
    #[serde(default)]
    pub price_at_sale: Option<f64>,
}

impl SalesPayload {
    pub fn to_record(&self) -> Result<SalesRecord, ForecastError> {
        let date = parse_calendar_date(&self.date)?;
        let units = whole_units(self.units_sold).ok_or_else(|| {
            ForecastError::malformed(format!(
                "units_sold for {} on {} must be a non-negative whole number, got {}",
                self.product_id, self.date, self.units_sold
            ))
        })?;
        let price = self.price_at_sale.unwrap_or(0.0);
        if !price.is_finite() || price < 0.0 {
            return Err(ForecastError::malformed(format!(
                "price_at_sale for {} on {} must be non-negative, got {}",
                self.product_id, self.date, price
            )));
        }
        Ok(SalesRecord::new(self.product_id.clone(), date, units).with_price(price))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub date: String,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
    #[serde(default)]
    pub weather_condition: Option<String>,
}

impl WeatherPayload {
    pub fn to_observation(&self) -> Result<WeatherObservation, ForecastError> {
        Ok(WeatherObservation {
            date: parse_calendar_date(&self.date)?,
            temperature_c: self.temperature_c.filter(|t| t.is_finite()),
            precipitation_mm: self.precipitation_mm.filter(|p| p.is_finite()),
            weather_condition: self
                .weather_condition
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(WeatherCondition::from_label),
        })
    }
}

/// A requested product. Catalog fields are optional; when all of them are
/// present the product can also take part in replenishment planning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_perishable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life_days: Option<u32>,
}

impl ProductRef {
    pub fn id(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            ..Self::default()
        }
    }

    pub fn to_product(&self) -> Option<Product> {
        Some(Product {
            product_id: self.product_id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.product_id.clone()),
            category: self.category.clone().unwrap_or_default(),
            selling_price: self.selling_price?,
            cost_price: self.cost_price?,
            is_perishable: self.is_perishable?,
            shelf_life_days: self.shelf_life_days.unwrap_or(0),
        })
    }
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.product_id.clone(),
            name: Some(product.name.clone()),
            category: Some(product.category.clone()),
            selling_price: Some(product.selling_price),
            cost_price: Some(product.cost_price),
            is_perishable: Some(product.is_perishable),
            shelf_life_days: Some(product.shelf_life_days),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub sales_history: Vec<SalesPayload>,
    pub weather_forecast: WeatherPayload,
    pub products: Vec<ProductRef>,
    /// Current stock. When present, the response also carries replenishment alerts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<InventoryBatch>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecasts: Vec<ForecastOutcome>,
    #[serde(default)]
    pub alerts: Vec<ReplenishmentAlert>,
}
