use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use stockcast::application::decision::ReplenishmentAdvisor;
use stockcast::application::ml::forest_learner::{ForestLearner, ForestModel, ForestParams};
use stockcast::application::ml::request::{ForecastRequest, ProductRef, SalesPayload, WeatherPayload};
use stockcast::application::ml::trainer::MIN_TRAINING_ROWS;
use stockcast::application::ml::{BatchTrainer, FeatureDeriver, ForecastEndpoint, SplitConfig};
use stockcast::application::simulation::{HistoryGenerator, default_catalog};
use stockcast::domain::errors::ForecastError;
use stockcast::domain::ml::feature_registry::BASE_FEATURE_NAMES;
use stockcast::domain::types::{SalesRecord, WeatherCondition, WeatherObservation};
use stockcast::domain::ml::FeatureSchema;
use stockcast::infrastructure::ArtifactStore;
use stockcast::infrastructure::artifact_store::temp_path;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "stockcast_pipeline_{}_{}",
        std::process::id(),
        unique_id
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn store_in(dir: &PathBuf) -> ArtifactStore {
    ArtifactStore::new(dir.join("model.json"), dir.join("features.json"))
}

fn small_forest() -> ForestLearner {
    ForestLearner::new(ForestParams {
        max_trees: 10,
        tree_step: 5,
        patience: 1,
        max_depth: 4,
        min_samples_split: 2,
        seed: 1,
    })
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

/// One product, `days` consecutive days from July 1st, all with weather.
fn single_product_history(days: u32) -> (Vec<SalesRecord>, Vec<WeatherObservation>) {
    let dates: Vec<NaiveDate> = (1..=days).map(day).collect();
    let sales = dates
        .iter()
        .map(|d| SalesRecord::new("P1", *d, 10))
        .collect();
    let weather = dates
        .iter()
        .map(|d| WeatherObservation::new(*d, 28.0, 0.0, WeatherCondition::Sunny))
        .collect();
    (sales, weather)
}

#[test]
fn test_insufficient_rows_write_nothing() {
    // 12 days leave 5 rows with a full 7-day lag window
    let (sales, weather) = single_product_history(12);
    let dir = temp_dir();
    let store = store_in(&dir);

    let trainer = BatchTrainer::new(small_forest(), SplitConfig::default());
    let err = trainer.train_and_persist(&sales, &weather, &store).unwrap_err();

    assert_eq!(
        err,
        ForecastError::InsufficientData {
            rows: 5,
            required: MIN_TRAINING_ROWS
        }
    );
    assert!(!store.model_path().exists());
    assert!(!store.schema_path().exists());
}

#[test]
fn test_insufficient_rows_keep_previous_artifacts() {
    let (sales, weather) = single_product_history(12);
    let dir = temp_dir();
    let store = store_in(&dir);
    fs::write(store.model_path(), "previous model").unwrap();
    fs::write(store.schema_path(), "[\"previous\"]").unwrap();

    let trainer = BatchTrainer::new(small_forest(), SplitConfig::default());
    assert!(trainer.train_and_persist(&sales, &weather, &store).is_err());

    assert_eq!(fs::read_to_string(store.model_path()).unwrap(), "previous model");
    assert_eq!(fs::read_to_string(store.schema_path()).unwrap(), "[\"previous\"]");
}

#[test]
fn test_train_persist_and_serve() {
    let catalog = default_catalog();
    let anchor = day(31);
    let history = HistoryGenerator::new(7).generate(&catalog, anchor, 30);

    let dir = temp_dir();
    let store = store_in(&dir);
    let trainer = BatchTrainer::new(small_forest(), SplitConfig::default());
    let report = trainer
        .train_and_persist(&history.sales, &history.weather, &store)
        .unwrap();

    // 7 products x (30 - 7) days with a full window
    assert_eq!(report.rows_used, 7 * 23);
    assert_eq!(report.train_rows + report.validation_rows, report.rows_used);
    assert!(report.validation_rmse.is_some());
    assert!(report.n_estimators >= 1 && report.n_estimators <= 10);

    let (model, schema) = store.load::<ForestModel>().unwrap();
    assert_eq!(model.n_trees(), report.n_estimators);
    let base: Vec<&str> = schema.names()[..BASE_FEATURE_NAMES.len()]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(base, BASE_FEATURE_NAMES);
    let weather_columns = &schema.names()[BASE_FEATURE_NAMES.len()..];
    let mut sorted = weather_columns.to_vec();
    sorted.sort();
    assert_eq!(weather_columns, sorted.as_slice());
    assert!(weather_columns.iter().all(|c| c.starts_with("weather_")));

    let endpoint = ForecastEndpoint::load(&store, FeatureDeriver::default(), ReplenishmentAdvisor::default());
    assert!(endpoint.is_ready());

    let request = ForecastRequest {
        sales_history: history
            .sales
            .iter()
            .filter(|s| s.product_id == "PROD001")
            .map(|s| SalesPayload {
                product_id: s.product_id.clone(),
                date: s.date.to_string(),
                units_sold: f64::from(s.units_sold),
                price_at_sale: Some(s.price_at_sale),
            })
            .collect(),
        weather_forecast: WeatherPayload {
            date: "2025-07-30".into(),
            temperature_c: Some(31.0),
            precipitation_mm: Some(0.0),
            weather_condition: Some("Sunny".into()),
        },
        products: vec![ProductRef::id("PROD001"), ProductRef::id("NEW-ITEM")],
        inventory: None,
    };
    let response = endpoint.handle(&request).unwrap();

    assert_eq!(response.forecasts.len(), 2);
    for outcome in &response.forecasts {
        let prediction = outcome.prediction().unwrap();
        assert!(prediction.predicted_units >= 0.0);
        assert!(prediction.predicted_units.is_finite());
    }
}

#[test]
fn test_missing_artifacts_leave_endpoint_unavailable() {
    let dir = temp_dir();
    let endpoint = ForecastEndpoint::load(
        &store_in(&dir),
        FeatureDeriver::default(),
        ReplenishmentAdvisor::default(),
    );

    assert!(!endpoint.is_ready());
    assert!(matches!(
        endpoint.service(),
        Err(ForecastError::Unavailable { .. })
    ));
}

#[test]
fn test_failed_persist_keeps_serving_previous_pair() {
    let (sales, weather) = single_product_history(25);
    let dir = temp_dir();
    let store = store_in(&dir);
    let trainer = BatchTrainer::new(small_forest(), SplitConfig::default());
    trainer.train_and_persist(&sales, &weather, &store).unwrap();
    let model_before = fs::read(store.model_path()).unwrap();
    let schema_before = fs::read(store.schema_path()).unwrap();

    // Rainy days add a weather column, so a split pair would disagree on width
    let rainy: Vec<WeatherObservation> = weather
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let mut w = w.clone();
            if i % 2 == 0 {
                w.weather_condition = Some(WeatherCondition::Rainy);
            }
            w
        })
        .collect();
    fs::create_dir_all(temp_path(store.schema_path())).unwrap();

    let err = trainer.train_and_persist(&sales, &rainy, &store).unwrap_err();

    assert!(matches!(err, ForecastError::Artifact { .. }));
    assert_eq!(fs::read(store.model_path()).unwrap(), model_before);
    assert_eq!(fs::read(store.schema_path()).unwrap(), schema_before);
    let endpoint = ForecastEndpoint::load(&store, FeatureDeriver::default(), ReplenishmentAdvisor::default());
    assert!(endpoint.is_ready());
}

#[test]
fn test_schema_narrower_than_model_is_not_served() {
    let (sales, weather) = single_product_history(25);
    let dir = temp_dir();
    let store = store_in(&dir);
    let trainer = BatchTrainer::new(small_forest(), SplitConfig::default());
    let artifacts = trainer.train(&sales, &weather).unwrap();

    let narrower = FeatureSchema::new(artifacts.schema.names()[1..].to_vec()).unwrap();
    store.save(&artifacts.model, &narrower).unwrap();

    let endpoint = ForecastEndpoint::load(&store, FeatureDeriver::default(), ReplenishmentAdvisor::default());
    assert!(!endpoint.is_ready());

    let request = ForecastRequest {
        sales_history: Vec::new(),
        weather_forecast: WeatherPayload {
            date: "2025-07-25".into(),
            temperature_c: Some(28.0),
            precipitation_mm: Some(0.0),
            weather_condition: Some("Sunny".into()),
        },
        products: vec![ProductRef::id("P1")],
        inventory: None,
    };
    let err = endpoint.handle(&request).unwrap_err();
    assert_eq!(err.kind(), "unavailable");
}
