use crate::config::Config;
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: &[&str] = &[
    "MODEL_PATH",
    "FEATURE_SCHEMA_PATH",
    "DATABASE_URL",
    "HISTORY_DIR",
    "ML_MAX_TREES",
    "ML_TREE_STEP",
    "ML_EARLY_STOPPING_PATIENCE",
    "ML_MAX_DEPTH",
    "ML_MIN_SAMPLES_SPLIT",
    "ML_SEED",
    "ML_VALIDATION_FRACTION",
    "SERVING_HISTORY_DAYS",
    "DEFAULT_TEMPERATURE_C",
    "DEFAULT_PRECIPITATION_MM",
    "REORDER_SAFETY_BUFFER",
    "OVERSTOCK_RATIO",
    "MARKDOWN_BASE_DISCOUNT",
    "MARKDOWN_URGENCY_WEIGHT",
    "MARKDOWN_OVERSTOCK_WEIGHT",
];

fn clear_env() {
    for key in KEYS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(
        config.artifacts.model_path,
        PathBuf::from("data/ml/demand_forecast.json")
    );
    assert_eq!(
        config.artifacts.feature_schema_path,
        PathBuf::from("data/ml/model_features.json")
    );
    assert_eq!(config.artifacts.database_url, "sqlite://data/history.db");
    assert_eq!(config.training.forest.max_trees, 200);
    assert_eq!(config.training.split.seed, 42);
    assert!((config.training.split.validation_fraction - 0.2).abs() < 1e-12);
    assert_eq!(config.serving.weather_defaults.temperature_c, 28.0);
    assert_eq!(config.serving.weather_defaults.precipitation_mm, 0.0);
    assert_eq!(config.serving.history_days, 14);
    assert!((config.decision.decision.safety_buffer - 0.10).abs() < 1e-12);
    assert!((config.decision.decision.overstock_ratio - 1.2).abs() < 1e-12);
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    unsafe {
        env::set_var("MODEL_PATH", "/tmp/model.json");
        env::set_var("ML_MAX_TREES", "60");
        env::set_var("ML_SEED", "7");
        env::set_var("DEFAULT_TEMPERATURE_C", "21.5");
        env::set_var("OVERSTOCK_RATIO", "1.5");
    }

    let config = Config::from_env().unwrap();

    assert_eq!(config.artifacts.model_path, PathBuf::from("/tmp/model.json"));
    assert_eq!(config.artifact_store().model_path(), PathBuf::from("/tmp/model.json"));
    assert_eq!(config.training.forest.max_trees, 60);
    assert_eq!(config.training.forest.seed, 7);
    assert_eq!(config.training.split.seed, 7);
    assert_eq!(config.serving.weather_defaults.temperature_c, 21.5);
    assert!((config.decision.decision.overstock_ratio - 1.5).abs() < 1e-12);

    clear_env();
}

#[test]
fn test_config_rejects_unparseable_values() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    unsafe { env::set_var("ML_MAX_DEPTH", "deep") };

    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_config_rejects_out_of_range_values() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    unsafe { env::set_var("OVERSTOCK_RATIO", "0.8") };

    assert!(Config::from_env().is_err());

    clear_env();
}
