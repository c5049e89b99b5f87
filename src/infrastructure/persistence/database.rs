use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared SQLite pool for the history store.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Daily unit sales, one row per product and day
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sales (
                product_id TEXT NOT NULL,
                date TEXT NOT NULL,
                units_sold INTEGER NOT NULL,
                price_at_sale REAL NOT NULL DEFAULT 0,
                PRIMARY KEY (product_id, date)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create sales table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sales_date
            ON sales (date);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create sales index")?;

        // 2. Daily weather; measurements may be missing
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weather (
                date TEXT PRIMARY KEY,
                temperature_c REAL,
                precipitation_mm REAL,
                weather_condition TEXT
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create weather table")?;

        // 3. Product catalog
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                product_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                selling_price TEXT NOT NULL,
                cost_price TEXT NOT NULL,
                is_perishable BOOLEAN NOT NULL DEFAULT 0,
                shelf_life_days INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create products table")?;

        // 4. Stock batches
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inventory (
                batch_id TEXT PRIMARY KEY,
                product_id TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                expiry_date TEXT,
                current_price TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_inventory_product
            ON inventory (product_id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create inventory table")?;

        // 5. Daily-run forecasts, one row per product and target day
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS forecasts (
                product_id TEXT NOT NULL,
                date TEXT NOT NULL,
                predicted_units REAL NOT NULL,
                model_version TEXT NOT NULL,
                PRIMARY KEY (product_id, date)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create forecasts table")?;

        // 6. Replenishment alerts; details keep the action-tagged JSON
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                product_id TEXT NOT NULL,
                date TEXT NOT NULL,
                kind TEXT NOT NULL,
                action TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                details TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_date
            ON alerts (date);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create alerts table")?;

        info!("Database schema initialized");
        Ok(())
    }
}
