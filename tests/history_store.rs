use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU64, Ordering};
use stockcast::application::decision::summarize_kpis;
use stockcast::application::simulation::{HistoryGenerator, default_catalog};
use stockcast::domain::inventory::{AlertAction, AlertDetails, AlertKind, ReplenishmentAlert};
use stockcast::domain::repositories::HistoryRepository;
use stockcast::domain::types::{DailyForecast, SalesRecord};
use stockcast::infrastructure::persistence::{Database, SqliteHistoryRepository};
use stockcast::infrastructure::repositories::InMemoryHistoryRepository;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

async fn sqlite_store() -> SqliteHistoryRepository {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "stockcast_store_{}_{}.db",
        std::process::id(),
        unique_id
    ));
    let _ = std::fs::remove_file(&path);
    let db = Database::new(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    SqliteHistoryRepository::new(db.pool)
}

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

#[test]
fn test_seeder_is_deterministic() {
    let catalog = default_catalog();
    let first = HistoryGenerator::new(11).generate(&catalog, anchor(), 21);
    let second = HistoryGenerator::new(11).generate(&catalog, anchor(), 21);
    let other = HistoryGenerator::new(12).generate(&catalog, anchor(), 21);

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(first.weather.len(), 21);
    assert_eq!(first.sales.len(), 21 * catalog.len());
    assert_eq!(first.weather.last().unwrap().date, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
}

#[tokio::test]
async fn test_sqlite_roundtrip_of_seeded_history() {
    let catalog = default_catalog();
    let mut generator = HistoryGenerator::new(3);
    let history = generator.generate(&catalog, anchor(), 10);
    let products: Vec<_> = catalog.iter().map(|i| i.product.clone()).collect();
    let stock = generator.demo_inventory(&catalog, anchor());

    let store = sqlite_store().await;
    store.save_weather(&history.weather).await.unwrap();
    store.save_sales(&history.sales).await.unwrap();
    store.save_products(&products).await.unwrap();
    store.save_inventory(&stock).await.unwrap();

    assert_eq!(store.fetch_weather().await.unwrap(), history.weather);

    let mut expected_sales = history.sales.clone();
    expected_sales.sort_by(|a, b| (&a.product_id, a.date).cmp(&(&b.product_id, b.date)));
    assert_eq!(store.fetch_sales().await.unwrap(), expected_sales);

    assert_eq!(store.fetch_products().await.unwrap(), products);

    let mut fetched_stock = store.fetch_inventory().await.unwrap();
    fetched_stock.sort_by(|a, b| a.batch_id.cmp(&b.batch_id));
    let mut expected_stock = stock.clone();
    expected_stock.sort_by(|a, b| a.batch_id.cmp(&b.batch_id));
    assert_eq!(fetched_stock, expected_stock);
}

#[tokio::test]
async fn test_backends_agree_on_sales_window() {
    let catalog = default_catalog();
    let history = HistoryGenerator::new(5).generate(&catalog, anchor(), 14);

    let sqlite = sqlite_store().await;
    let memory = InMemoryHistoryRepository::new();
    for store in [&sqlite as &dyn HistoryRepository, &memory] {
        store.save_sales(&history.sales).await.unwrap();
    }

    let start = NaiveDate::from_ymd_opt(2025, 7, 25).unwrap();
    let end = anchor();
    let mut from_sqlite = sqlite.fetch_sales_between(start, end).await.unwrap();
    let mut from_memory = memory.fetch_sales_between(start, end).await.unwrap();
    from_sqlite.sort_by(|a, b| (&a.product_id, a.date).cmp(&(&b.product_id, b.date)));
    from_memory.sort_by(|a, b| (&a.product_id, a.date).cmp(&(&b.product_id, b.date)));

    assert_eq!(from_sqlite.len(), 7 * catalog.len());
    assert_eq!(from_sqlite, from_memory);
}

fn forecast(product_id: &str, date: NaiveDate, units: f64) -> DailyForecast {
    DailyForecast {
        product_id: product_id.into(),
        date,
        predicted_units: units,
        model_version: "SmartCore Random Forest".into(),
    }
}

fn reorder(product_id: &str, date: NaiveDate) -> ReplenishmentAlert {
    ReplenishmentAlert::new(
        product_id,
        date,
        AlertKind::Understock,
        AlertDetails::Reorder {
            current_stock: 2,
            forecasted_demand: 14,
            recommended_qty: 14,
        },
    )
}

fn markdown(product_id: &str, date: NaiveDate) -> ReplenishmentAlert {
    ReplenishmentAlert::new(
        product_id,
        date,
        AlertKind::Overstock,
        AlertDetails::ReducePrice {
            current_stock: 90,
            forecasted_demand: 20,
            days_to_expiry: 2,
            new_price: dec!(2.63),
            original_price: dec!(4.00),
        },
    )
}

#[tokio::test]
async fn test_sqlite_forecasts_replace_their_day() {
    let store = sqlite_store().await;
    let day = anchor();
    let next = day.succ_opt().unwrap();

    store
        .save_forecasts(day, &[forecast("PROD002", day, 3.5), forecast("PROD001", day, 12.0)])
        .await
        .unwrap();
    store.save_forecasts(next, &[forecast("PROD001", next, 9.0)]).await.unwrap();
    store.save_forecasts(day, &[forecast("PROD003", day, 1.0)]).await.unwrap();

    assert_eq!(store.fetch_forecasts(day).await.unwrap(), vec![forecast("PROD003", day, 1.0)]);
    assert_eq!(store.fetch_forecasts(next).await.unwrap(), vec![forecast("PROD001", next, 9.0)]);
}

#[tokio::test]
async fn test_sqlite_alerts_roundtrip_and_replace() {
    let store = sqlite_store().await;
    let day = anchor();
    let next = day.succ_opt().unwrap();

    let first = vec![markdown("PROD001", day), reorder("PROD002", day)];
    store.save_alerts(day, &first).await.unwrap();
    assert_eq!(store.fetch_alerts(Some(day)).await.unwrap(), first);

    store.save_alerts(next, &[reorder("PROD004", next)]).await.unwrap();
    store.save_alerts(day, &[reorder("PROD005", day)]).await.unwrap();

    let pending: Vec<(NaiveDate, String)> = store
        .fetch_alerts(None)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.date, a.product_id))
        .collect();
    assert_eq!(
        pending,
        vec![(next, "PROD004".to_string()), (day, "PROD005".to_string())]
    );
    assert_eq!(store.count_alerts(AlertAction::Reorder).await.unwrap(), 2);
    assert_eq!(store.count_alerts(AlertAction::ReducePrice).await.unwrap(), 0);
}

#[tokio::test]
async fn test_backends_agree_on_alerts_and_kpis() {
    let catalog = default_catalog();
    let products: Vec<_> = catalog.iter().map(|i| i.product.clone()).collect();
    let milk = &products[0];
    let day = anchor();
    let sales = vec![
        SalesRecord::new(milk.product_id.clone(), day, 10).with_price(1.0),
        SalesRecord::new(milk.product_id.clone(), day.pred_opt().unwrap(), 5),
    ];
    let alerts = vec![markdown("PROD001", day), reorder("PROD002", day), reorder("PROD003", day)];

    let sqlite = sqlite_store().await;
    let memory = InMemoryHistoryRepository::new();
    let mut summaries = Vec::new();
    for store in [&sqlite as &dyn HistoryRepository, &memory] {
        store.save_products(&products).await.unwrap();
        store.save_sales(&sales).await.unwrap();
        store.save_alerts(day, &alerts).await.unwrap();
        assert_eq!(store.fetch_alerts(Some(day)).await.unwrap(), alerts);

        let reorders = store.count_alerts(AlertAction::Reorder).await.unwrap();
        summaries.push(summarize_kpis(
            &store.fetch_sales().await.unwrap(),
            &store.fetch_products().await.unwrap(),
            reorders,
        ));
    }

    assert_eq!(summaries[0], summaries[1]);
    assert_eq!(summaries[0].reorders_triggered, 2);
    assert_eq!(summaries[0].loss_avoided, Decimal::from(10) * milk.cost_price);
}
