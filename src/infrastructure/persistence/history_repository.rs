use crate::domain::inventory::{
    AlertAction, AlertDetails, AlertKind, AlertStatus, InventoryBatch, Product, ReplenishmentAlert,
};
use crate::domain::repositories::HistoryRepository;
use crate::domain::types::{DailyForecast, SalesRecord, WeatherCondition, WeatherObservation};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date '{}'", raw))
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("Invalid stored amount '{}'", raw))
}

pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_sales(rows: Vec<SqliteRow>) -> Result<Vec<SalesRecord>> {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.try_get("date")?;
            let units: i64 = row.try_get("units_sold")?;
            records.push(SalesRecord {
                product_id: row.try_get("product_id")?,
                date: parse_date(&date)?,
                units_sold: u32::try_from(units)
                    .with_context(|| format!("Stored units_sold out of range: {}", units))?,
                price_at_sale: row.try_get("price_at_sale")?,
            });
        }
        Ok(records)
    }

    fn map_alert(row: &SqliteRow) -> Result<ReplenishmentAlert> {
        let id: String = row.try_get("id")?;
        let date: String = row.try_get("date")?;
        let kind: String = row.try_get("kind")?;
        let status: String = row.try_get("status")?;
        let details: String = row.try_get("details")?;
        Ok(ReplenishmentAlert {
            id: Uuid::parse_str(&id).with_context(|| format!("Invalid stored alert id '{}'", id))?,
            product_id: row.try_get("product_id")?,
            date: parse_date(&date)?,
            kind: AlertKind::parse(&kind).ok_or_else(|| anyhow!("Invalid stored alert kind '{}'", kind))?,
            details: serde_json::from_str::<AlertDetails>(&details)
                .context("Invalid stored alert details")?,
            status: AlertStatus::parse(&status)
                .ok_or_else(|| anyhow!("Invalid stored alert status '{}'", status))?,
        })
    }

    fn map_weather(row: &SqliteRow) -> Result<WeatherObservation> {
        let date: String = row.try_get("date")?;
        let condition: Option<String> = row.try_get("weather_condition")?;
        Ok(WeatherObservation {
            date: parse_date(&date)?,
            temperature_c: row.try_get("temperature_c")?,
            precipitation_mm: row.try_get("precipitation_mm")?,
            weather_condition: condition.as_deref().map(WeatherCondition::from_label),
        })
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>> {
        let rows = sqlx::query("SELECT * FROM sales ORDER BY product_id ASC, date ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch sales")?;
        Self::map_sales(rows)
    }

    async fn fetch_sales_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SalesRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM sales WHERE date >= ? AND date < ? ORDER BY product_id ASC, date ASC",
        )
        .bind(format_date(start))
        .bind(format_date(end))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch sales range")?;
        Self::map_sales(rows)
    }

    async fn fetch_weather(&self) -> Result<Vec<WeatherObservation>> {
        let rows = sqlx::query("SELECT * FROM weather ORDER BY date ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch weather")?;
        rows.iter().map(Self::map_weather).collect()
    }

    async fn fetch_weather_on(&self, date: NaiveDate) -> Result<Option<WeatherObservation>> {
        let row = sqlx::query("SELECT * FROM weather WHERE date = ?")
            .bind(format_date(date))
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch weather")?;
        row.as_ref().map(Self::map_weather).transpose()
    }

    async fn save_sales(&self, records: &[SalesRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO sales (product_id, date, units_sold, price_at_sale)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(product_id, date) DO UPDATE SET
                    units_sold = excluded.units_sold,
                    price_at_sale = excluded.price_at_sale
                "#,
            )
            .bind(&record.product_id)
            .bind(format_date(record.date))
            .bind(i64::from(record.units_sold))
            .bind(record.price_at_sale)
            .execute(&mut *tx)
            .await
            .context("Failed to save sales record")?;
        }
        tx.commit().await?;

        info!("Persisted {} sales records", records.len());
        Ok(())
    }

    async fn save_weather(&self, observations: &[WeatherObservation]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for observation in observations {
            sqlx::query(
                r#"
                INSERT INTO weather (date, temperature_c, precipitation_mm, weather_condition)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(date) DO UPDATE SET
                    temperature_c = excluded.temperature_c,
                    precipitation_mm = excluded.precipitation_mm,
                    weather_condition = excluded.weather_condition
                "#,
            )
            .bind(format_date(observation.date))
            .bind(observation.temperature_c)
            .bind(observation.precipitation_mm)
            .bind(observation.weather_condition.as_ref().map(|c| c.label().to_string()))
            .execute(&mut *tx)
            .await
            .context("Failed to save weather observation")?;
        }
        tx.commit().await?;

        info!("Persisted {} weather observations", observations.len());
        Ok(())
    }

    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY product_id ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch products")?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let shelf_life: i64 = row.try_get("shelf_life_days")?;
            products.push(Product {
                product_id: row.try_get("product_id")?,
                name: row.try_get("name")?,
                category: row.try_get("category")?,
                selling_price: parse_decimal(row.try_get("selling_price")?)?,
                cost_price: parse_decimal(row.try_get("cost_price")?)?,
                is_perishable: row.try_get("is_perishable")?,
                shelf_life_days: u32::try_from(shelf_life)
                    .with_context(|| format!("Stored shelf_life_days out of range: {}", shelf_life))?,
            });
        }
        Ok(products)
    }

    async fn save_products(&self, products: &[Product]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for product in products {
            sqlx::query(
                r#"
                INSERT INTO products (product_id, name, category, selling_price, cost_price, is_perishable, shelf_life_days)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(product_id) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    selling_price = excluded.selling_price,
                    cost_price = excluded.cost_price,
                    is_perishable = excluded.is_perishable,
                    shelf_life_days = excluded.shelf_life_days
                "#,
            )
            .bind(&product.product_id)
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.selling_price.to_string())
            .bind(product.cost_price.to_string())
            .bind(product.is_perishable)
            .bind(i64::from(product.shelf_life_days))
            .execute(&mut *tx)
            .await
            .context("Failed to save product")?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryBatch>> {
        let rows = sqlx::query(
            "SELECT * FROM inventory WHERE quantity > 0 ORDER BY product_id ASC, expiry_date ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch inventory")?;

        let mut batches = Vec::with_capacity(rows.len());
        for row in rows {
            let quantity: i64 = row.try_get("quantity")?;
            let expiry: Option<String> = row.try_get("expiry_date")?;
            batches.push(InventoryBatch {
                batch_id: row.try_get("batch_id")?,
                product_id: row.try_get("product_id")?,
                quantity: u32::try_from(quantity)
                    .with_context(|| format!("Stored quantity out of range: {}", quantity))?,
                expiry_date: expiry.as_deref().map(parse_date).transpose()?,
                current_price: parse_decimal(row.try_get("current_price")?)?,
            });
        }
        Ok(batches)
    }

    async fn save_inventory(&self, batches: &[InventoryBatch]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for batch in batches {
            sqlx::query(
                r#"
                INSERT INTO inventory (batch_id, product_id, quantity, expiry_date, current_price)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(batch_id) DO UPDATE SET
                    quantity = excluded.quantity,
                    expiry_date = excluded.expiry_date,
                    current_price = excluded.current_price
                "#,
            )
            .bind(&batch.batch_id)
            .bind(&batch.product_id)
            .bind(i64::from(batch.quantity))
            .bind(batch.expiry_date.map(format_date))
            .bind(batch.current_price.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to save inventory batch")?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_forecasts(&self, date: NaiveDate, forecasts: &[DailyForecast]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM forecasts WHERE date = ?")
            .bind(format_date(date))
            .execute(&mut *tx)
            .await
            .context("Failed to clear forecasts")?;
        for forecast in forecasts {
            sqlx::query(
                r#"
                INSERT INTO forecasts (product_id, date, predicted_units, model_version)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(product_id, date) DO UPDATE SET
                    predicted_units = excluded.predicted_units,
                    model_version = excluded.model_version
                "#,
            )
            .bind(&forecast.product_id)
            .bind(format_date(date))
            .bind(forecast.predicted_units)
            .bind(&forecast.model_version)
            .execute(&mut *tx)
            .await
            .context("Failed to save forecast")?;
        }
        tx.commit().await?;

        info!("Persisted {} forecasts for {}", forecasts.len(), date);
        Ok(())
    }

    async fn fetch_forecasts(&self, date: NaiveDate) -> Result<Vec<DailyForecast>> {
        let rows = sqlx::query("SELECT * FROM forecasts WHERE date = ? ORDER BY product_id ASC")
            .bind(format_date(date))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch forecasts")?;

        let mut forecasts = Vec::with_capacity(rows.len());
        for row in rows {
            let stored: String = row.try_get("date")?;
            forecasts.push(DailyForecast {
                product_id: row.try_get("product_id")?,
                date: parse_date(&stored)?,
                predicted_units: row.try_get("predicted_units")?,
                model_version: row.try_get("model_version")?,
            });
        }
        Ok(forecasts)
    }

    async fn save_alerts(&self, date: NaiveDate, alerts: &[ReplenishmentAlert]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM alerts WHERE date = ?")
            .bind(format_date(date))
            .execute(&mut *tx)
            .await
            .context("Failed to clear alerts")?;
        for alert in alerts {
            let details =
                serde_json::to_string(&alert.details).context("Failed to serialize alert details")?;
            sqlx::query(
                r#"
                INSERT INTO alerts (id, product_id, date, kind, action, status, details)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(alert.id.to_string())
            .bind(&alert.product_id)
            .bind(format_date(date))
            .bind(alert.kind.as_str())
            .bind(alert.action().as_str())
            .bind(alert.status.as_str())
            .bind(details)
            .execute(&mut *tx)
            .await
            .context("Failed to save alert")?;
        }
        tx.commit().await?;

        info!("Persisted {} alerts for {}", alerts.len(), date);
        Ok(())
    }

    async fn fetch_alerts(&self, date: Option<NaiveDate>) -> Result<Vec<ReplenishmentAlert>> {
        let rows = match date {
            Some(date) => {
                sqlx::query("SELECT * FROM alerts WHERE date = ? ORDER BY product_id ASC")
                    .bind(format_date(date))
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM alerts WHERE status = 'pending' ORDER BY date DESC, product_id ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to fetch alerts")?;
        rows.iter().map(Self::map_alert).collect()
    }

    async fn count_alerts(&self, action: AlertAction) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE action = ?")
            .bind(action.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count alerts")?;
        u64::try_from(count).with_context(|| format!("Alert count out of range: {}", count))
    }
}
