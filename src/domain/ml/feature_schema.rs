//! Feature vectors and the schema that pins their layout.
//!
//! The schema is written once per training run and is the only authority on
//! which columns a model sees, and in which order. Anything the deriver emits
//! is forced through [`FeatureSchema::reconcile`] before reaching a model.

use crate::domain::errors::ForecastError;
use crate::domain::ml::feature_registry::is_weather_feature;
use crate::domain::ml::feature_registry::WEATHER_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Insertion-ordered mapping from feature name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a feature, replacing the value in place if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl FromIterator<(String, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut vector = FeatureVector::new();
        for (name, value) in iter {
            vector.insert(name, value);
        }
        vector
    }
}

/// Ordered, immutable list of feature names fixed at training time.
///
/// Serializes as a flat JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, ForecastError> {
        if names.is_empty() {
            return Err(ForecastError::artifact("feature schema is empty"));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(ForecastError::artifact("feature schema contains a blank name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::artifact(format!(
                    "feature schema lists '{}' more than once",
                    name
                )));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Weather labels this schema one-hot encodes, in column order.
    pub fn weather_labels(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|name| is_weather_feature(name))
            .map(|name| &name[WEATHER_PREFIX.len()..])
            .collect()
    }

    /// Projects a vector onto the schema: missing names become 0, names the
    /// schema does not know are dropped, and the output follows schema order.
    pub fn reconcile(&self, vector: &FeatureVector) -> FeatureVector {
        self.names
            .iter()
            .map(|name| (name.clone(), vector.get(name).unwrap_or(0.0)))
            .collect()
    }

    /// Reconciled values only, ready to hand to a model as a single row.
    pub fn to_row(&self, vector: &FeatureVector) -> Vec<f64> {
        self.names
            .iter()
            .map(|name| vector.get(name).unwrap_or(0.0))
            .collect()
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = ForecastError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        FeatureSchema::new(names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::new(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    fn vector(entries: &[(&str, f64)]) -> FeatureVector {
        entries.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut v = vector(&[("a", 1.0), ("b", 2.0)]);
        v.insert("a", 5.0);
        assert_eq!(v.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(v.get("a"), Some(5.0));
    }

    #[test]
    fn test_reconcile_fills_drops_and_reorders() {
        let s = schema(&["month", "sales_lag_1", "weather_Rainy", "weather_Sunny"]);
        let raw = vector(&[
            ("sales_lag_1", 10.0),
            ("weather_Hail", 1.0),
            ("month", 7.0),
        ]);

        let reconciled = s.reconcile(&raw);

        assert_eq!(
            reconciled.names().collect::<Vec<_>>(),
            vec!["month", "sales_lag_1", "weather_Rainy", "weather_Sunny"]
        );
        assert_eq!(reconciled.get("weather_Rainy"), Some(0.0));
        assert_eq!(reconciled.get("weather_Sunny"), Some(0.0));
        assert!(!reconciled.contains("weather_Hail"));
        assert_eq!(s.to_row(&raw), vec![7.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let s = schema(&["b", "a", "c"]);
        let raw = vector(&[("a", 1.5), ("z", 9.0), ("b", -2.0)]);

        let once = s.reconcile(&raw);
        let twice = s.reconcile(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_schema_rejects_duplicates_and_blanks() {
        assert!(FeatureSchema::new(vec!["a".into(), "a".into()]).is_err());
        assert!(FeatureSchema::new(vec![" ".into()]).is_err());
        assert!(FeatureSchema::new(Vec::new()).is_err());
    }

    #[test]
    fn test_schema_json_is_flat_string_list() {
        let s = schema(&["temperature_c", "weather_Cloudy"]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"["temperature_c","weather_Cloudy"]"#);

        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
        assert!(serde_json::from_str::<FeatureSchema>(r#"["a","a"]"#).is_err());
    }

    #[test]
    fn test_weather_labels() {
        let s = schema(&["temperature_c", "weather_Cloudy", "weather_Sunny"]);
        assert_eq!(s.weather_labels(), vec!["Cloudy", "Sunny"]);
    }
}
