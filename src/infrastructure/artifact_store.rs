//! Persistence for the trained model and its feature schema.
//!
//! Both files are JSON. The schema is a flat array of feature names in
//! column order, readable by any consumer.

use crate::domain::ml::FeatureSchema;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_path: PathBuf,
    schema_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(model_path: impl Into<PathBuf>, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            schema_path: schema_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Stages both files next to their targets and renames them only once
    /// both writes succeeded, so a failed write replaces neither file.
    pub fn save<M: Serialize>(&self, model: &M, schema: &FeatureSchema) -> Result<()> {
        let model_json = serde_json::to_vec(model).context("Failed to serialize model")?;
        let schema_json =
            serde_json::to_vec_pretty(schema).context("Failed to serialize feature schema")?;

        let model_temp = stage(&self.model_path, &model_json)?;
        let schema_temp = match stage(&self.schema_path, &schema_json) {
            Ok(path) => path,
            Err(e) => {
                let _ = fs::remove_file(&model_temp);
                return Err(e);
            }
        };

        fs::rename(&schema_temp, &self.schema_path).context("Failed to rename schema temp file")?;
        fs::rename(&model_temp, &self.model_path).context("Failed to rename model temp file")?;

        info!(
            "Saved model to {:?} and {} feature names to {:?}",
            self.model_path,
            schema.len(),
            self.schema_path
        );
        Ok(())
    }

    pub fn load<M: DeserializeOwned>(&self) -> Result<(M, FeatureSchema)> {
        let model_json = fs::read(&self.model_path)
            .with_context(|| format!("Failed to read model file {:?}", self.model_path))?;
        let model: M =
            serde_json::from_slice(&model_json).context("Failed to deserialize model")?;

        let schema_json = fs::read(&self.schema_path)
            .with_context(|| format!("Failed to read feature schema {:?}", self.schema_path))?;
        let schema: FeatureSchema =
            serde_json::from_slice(&schema_json).context("Failed to parse feature schema JSON")?;

        info!(
            "Loaded model from {:?} with {} features",
            self.model_path,
            schema.len()
        );
        Ok((model, schema))
    }
}

/// `<file name>.tmp` beside the target.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// Write to the temp path only; the caller renames
fn stage(path: &Path, content: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let temp = temp_path(path);
    fs::write(&temp, content).with_context(|| format!("Failed to write temp file {:?}", temp))?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "stockcast_test_{}_{}_artifacts",
            std::process::id(),
            unique_id
        ));
        fs::create_dir_all(&dir).expect("Failed to create test temp dir");
        dir
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct ConstantModel {
        value: f64,
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["temperature_c".into(), "weather_Sunny".into()]).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_dir();
        let store = ArtifactStore::new(dir.join("ml/model.json"), dir.join("ml/features.json"));

        store.save(&ConstantModel { value: 3.5 }, &schema()).unwrap();
        let (model, loaded): (ConstantModel, FeatureSchema) = store.load().unwrap();

        assert_eq!(model, ConstantModel { value: 3.5 });
        assert_eq!(loaded, schema());
        assert!(!dir.join("ml/model.json.tmp").exists());
        assert!(!dir.join("ml/features.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_schema_file_is_flat_name_list() {
        let dir = temp_dir();
        let store = ArtifactStore::new(dir.join("model.json"), dir.join("features.json"));
        store.save(&ConstantModel { value: 1.0 }, &schema()).unwrap();

        let raw = fs::read_to_string(store.schema_path()).unwrap();
        let names: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(names, vec!["temperature_c", "weather_Sunny"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_files_fails() {
        let dir = temp_dir();
        let store = ArtifactStore::new(dir.join("absent.json"), dir.join("absent_features.json"));
        assert!(store.load::<ConstantModel>().is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_schema_write_keeps_previous_pair() {
        let dir = temp_dir();
        let store = ArtifactStore::new(dir.join("model.json"), dir.join("features.json"));
        store.save(&ConstantModel { value: 1.0 }, &schema()).unwrap();

        fs::create_dir_all(temp_path(store.schema_path())).unwrap();
        let wider = FeatureSchema::new(vec![
            "temperature_c".into(),
            "weather_Rainy".into(),
            "weather_Sunny".into(),
        ])
        .unwrap();
        assert!(store.save(&ConstantModel { value: 2.0 }, &wider).is_err());

        let (model, loaded): (ConstantModel, FeatureSchema) = store.load().unwrap();
        assert_eq!(model, ConstantModel { value: 1.0 });
        assert_eq!(loaded, schema());
        assert!(!temp_path(store.model_path()).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_temp_path_keeps_extension() {
        assert_eq!(
            temp_path(Path::new("ml/model.json")),
            PathBuf::from("ml/model.json.tmp")
        );
    }
}
