//! CSV import/export for sales and weather history.
//!
//! `sales.csv`: `product_id,date,units_sold,price_at_sale`
//! `weather.csv`: `date,temperature_c,precipitation_mm,weather_condition`
//!
//! Dates may be plain days or ISO timestamps; empty weather cells are gaps.

use crate::domain::types::{
    SalesRecord, WeatherCondition, WeatherObservation, parse_calendar_date, whole_units,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
struct SalesRow {
    product_id: String,
    date: String,
    units_sold: f64,
    #[serde(default)]
    price_at_sale: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WeatherRow {
    date: String,
    temperature_c: Option<f64>,
    precipitation_mm: Option<f64>,
    weather_condition: Option<String>,
}

pub fn load_sales(path: &Path) -> Result<Vec<SalesRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));

    let mut records = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: SalesRow = result.with_context(|| format!("{:?}: bad row {}", path, line + 2))?;
        let Some(units) = whole_units(row.units_sold) else {
            bail!(
                "{:?}: row {} has invalid units_sold {}",
                path,
                line + 2,
                row.units_sold
            );
        };
        let date = parse_calendar_date(&row.date)?;
        records.push(
            SalesRecord::new(row.product_id, date, units)
                .with_price(row.price_at_sale.unwrap_or(0.0)),
        );
    }

    info!("Loaded {} sales records from {:?}", records.len(), path);
    Ok(records)
}

pub fn load_weather(path: &Path) -> Result<Vec<WeatherObservation>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));

    let mut observations = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: WeatherRow = result.with_context(|| format!("{:?}: bad row {}", path, line + 2))?;
        observations.push(WeatherObservation {
            date: parse_calendar_date(&row.date)?,
            temperature_c: row.temperature_c,
            precipitation_mm: row.precipitation_mm,
            weather_condition: row
                .weather_condition
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(WeatherCondition::from_label),
        });
    }

    info!("Loaded {} weather observations from {:?}", observations.len(), path);
    Ok(observations)
}

pub fn write_sales(path: &Path, records: &[SalesRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    for record in records {
        wtr.serialize(SalesRow {
            product_id: record.product_id.clone(),
            date: record.date.to_string(),
            units_sold: f64::from(record.units_sold),
            price_at_sale: Some(record.price_at_sale),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_weather(path: &Path, observations: &[WeatherObservation]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    for observation in observations {
        wtr.serialize(WeatherRow {
            date: observation.date.to_string(),
            temperature_c: observation.temperature_c,
            precipitation_mm: observation.precipitation_mm,
            weather_condition: observation
                .weather_condition
                .as_ref()
                .map(|c| c.label().to_string()),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
