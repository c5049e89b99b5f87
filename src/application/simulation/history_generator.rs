//! Synthetic store history for demos and local training runs.
//!
//! Demand follows a fixed recipe: a per-product base rate, a weekend uplift,
//! a heat uplift for beverages, a bad-weather dampener and ±20% noise. All
//! randomness comes from one seeded generator, so a seed reproduces a history.

use crate::domain::inventory::{InventoryBatch, Product};
use crate::domain::types::{SalesRecord, WeatherCondition, WeatherObservation};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::info;

/// A catalog product plus the demand rate the generator draws around.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub product: Product,
    pub base_daily_sales: f64,
}

#[allow(clippy::too_many_arguments)]
fn item(
    product_id: &str,
    name: &str,
    category: &str,
    selling_price: i64,
    cost_price: i64,
    is_perishable: bool,
    shelf_life_days: u32,
    base_daily_sales: f64,
) -> CatalogItem {
    CatalogItem {
        product: Product {
            product_id: product_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            selling_price: Decimal::from(selling_price),
            cost_price: Decimal::from(cost_price),
            is_perishable,
            shelf_life_days,
        },
        base_daily_sales,
    }
}

/// Seven grocery lines covering every alert path.
pub fn default_catalog() -> Vec<CatalogItem> {
    vec![
        item("PROD001", "Fresh Milk 1L", "Dairy", 50, 30, true, 7, 30.0),
        item("PROD002", "Whole Wheat Bread", "Bakery", 40, 25, true, 4, 25.0),
        item("PROD003", "Cheddar Cheese 200g", "Dairy", 150, 100, true, 30, 10.0),
        item("PROD004", "Cola 2L", "Beverages", 90, 60, false, 365, 40.0),
        item("PROD005", "Lays Chips Classic", "Snacks", 20, 12, false, 180, 50.0),
        item("PROD006", "Fresh Apples 1kg", "Produce", 120, 80, true, 10, 15.0),
        item("PROD007", "Detergent 1kg", "Household", 250, 180, false, 730, 8.0),
    ]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeededHistory {
    pub weather: Vec<WeatherObservation>,
    pub sales: Vec<SalesRecord>,
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct HistoryGenerator {
    rng: StdRng,
}

impl HistoryGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Temperature U(22, 35); 30% chance of rain U(0, 25) mm.
    pub fn daily_weather(&mut self, date: NaiveDate) -> WeatherObservation {
        let temperature_c = round2(self.rng.random_range(22.0..35.0));
        let precipitation_mm = if self.rng.random::<f64>() > 0.7 {
            round2(self.rng.random_range(0.0..25.0))
        } else {
            0.0
        };
        let condition = if precipitation_mm > 10.0 {
            WeatherCondition::Storm
        } else if precipitation_mm > 0.0 {
            WeatherCondition::Rainy
        } else {
            WeatherCondition::Sunny
        };
        WeatherObservation::new(date, temperature_c, precipitation_mm, condition)
    }

    pub fn daily_sales(
        &mut self,
        item: &CatalogItem,
        date: NaiveDate,
        weather: &WeatherObservation,
    ) -> SalesRecord {
        let category = item.product.category.as_str();
        let mut units = item.base_daily_sales;
        if is_weekend(date) {
            units *= if matches!(category, "Snacks" | "Beverages") { 1.8 } else { 1.3 };
        }
        if category == "Beverages" && weather.temperature_c.is_some_and(|t| t > 30.0) {
            units *= 1.5;
        }
        if weather.weather_condition.as_ref() != Some(&WeatherCondition::Sunny) {
            units *= 0.75;
        }
        units *= self.rng.random_range(0.8..1.2);

        SalesRecord::new(item.product.product_id.clone(), date, units.floor().max(0.0) as u32)
            .with_price(item.product.selling_price.to_f64().unwrap_or(0.0))
    }

    /// `days` days of weather and sales, ending the day before `anchor`.
    pub fn generate(&mut self, catalog: &[CatalogItem], anchor: NaiveDate, days: u32) -> SeededHistory {
        let mut history = SeededHistory::default();
        for offset in (1..=i64::from(days)).rev() {
            let date = anchor - Duration::days(offset);
            let weather = self.daily_weather(date);
            for item in catalog {
                history.sales.push(self.daily_sales(item, date, &weather));
            }
            history.weather.push(weather);
        }
        info!(
            "Generated {} weather records and {} sales records",
            history.weather.len(),
            history.sales.len()
        );
        history
    }

    /// Opening stock arranged so the first daily run shows a markdown
    /// (PROD002), a hold (PROD003) and a reorder (PROD006).
    pub fn demo_inventory(&mut self, catalog: &[CatalogItem], today: NaiveDate) -> Vec<InventoryBatch> {
        catalog
            .iter()
            .filter_map(|item| {
                let product = &item.product;
                let shelf_life = Duration::days(i64::from(product.shelf_life_days));
                let (quantity, expiry_date) = match product.product_id.as_str() {
                    "PROD002" => (item.base_daily_sales * 10.0, Some(today + Duration::days(2))),
                    "PROD003" => (item.base_daily_sales * 15.0, Some(today + Duration::days(20))),
                    "PROD006" => (item.base_daily_sales * 0.5, Some(today + shelf_life)),
                    _ => (
                        item.base_daily_sales * self.rng.random_range(2.0..4.0),
                        product.is_perishable.then(|| today + shelf_life),
                    ),
                };
                let quantity = quantity.floor() as u32;
                (quantity > 0).then(|| InventoryBatch {
                    batch_id: format!(
                        "BATCH-{}-INITIAL-{:08x}",
                        product.product_id,
                        self.rng.random::<u32>()
                    ),
                    product_id: product.product_id.clone(),
                    quantity,
                    expiry_date,
                    current_price: product.selling_price,
                })
            })
            .collect()
    }

    /// Sells one day against live stock, oldest expiry first. Products whose
    /// stock runs out sell less than demanded; zero-sale products get no record.
    pub fn simulate_day(
        &mut self,
        catalog: &[CatalogItem],
        date: NaiveDate,
        weather: Option<&WeatherObservation>,
        inventory: &mut [InventoryBatch],
    ) -> Vec<SalesRecord> {
        let mut sales = Vec::new();
        for item in catalog {
            let product = &item.product;
            let mut demand: f64 = if product.category == "Dairy" { 20.0 } else { 15.0 };
            if is_weekend(date) {
                demand *= 1.5;
            }
            if weather.and_then(|w| w.precipitation_mm).is_some_and(|p| p > 5.0) {
                demand *= 0.7;
            }
            let wanted = (demand * self.rng.random_range(0.8..1.2)).floor() as u32;

            let mut batches: Vec<&mut InventoryBatch> = inventory
                .iter_mut()
                .filter(|b| b.product_id == product.product_id && b.quantity > 0)
                .collect();
            batches.sort_by_key(|b| (b.expiry_date.is_none(), b.expiry_date));

            let mut remaining = wanted;
            let mut price = product.selling_price;
            for batch in batches {
                if remaining == 0 {
                    break;
                }
                price = batch.current_price;
                let taken = remaining.min(batch.quantity);
                batch.quantity -= taken;
                remaining -= taken;
            }

            let sold = wanted - remaining;
            if sold > 0 {
                sales.push(
                    SalesRecord::new(product.product_id.clone(), date, sold)
                        .with_price(price.to_f64().unwrap_or(0.0)),
                );
            }
        }
        sales
    }
}

/// A fresh delivery. Perishables expire `shelf_life_days` after receipt.
pub fn supply_batch(product: &Product, quantity: u32, received: NaiveDate) -> InventoryBatch {
    InventoryBatch {
        batch_id: format!("BATCH-{}-{}", product.product_id, uuid::Uuid::new_v4().simple()),
        product_id: product.product_id.clone(),
        quantity,
        expiry_date: product
            .is_perishable
            .then(|| received + Duration::days(i64::from(product.shelf_life_days))),
        current_price: product.selling_price,
    }
}
