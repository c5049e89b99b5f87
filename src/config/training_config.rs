//! Learner hyperparameters and the train/validation split.

use super::parse_var;
use crate::application::ml::forest_learner::ForestParams;
use crate::application::ml::trainer::SplitConfig;
use anyhow::{Result, ensure};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEnvConfig {
    pub forest: ForestParams,
    pub split: SplitConfig,
}

impl TrainingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = ForestParams::default();
        let seed = parse_var("ML_SEED", defaults.seed)?;

        let config = Self {
            forest: ForestParams {
                max_trees: parse_var("ML_MAX_TREES", defaults.max_trees)?,
                tree_step: parse_var("ML_TREE_STEP", defaults.tree_step)?,
                patience: parse_var("ML_EARLY_STOPPING_PATIENCE", defaults.patience)?,
                max_depth: parse_var("ML_MAX_DEPTH", defaults.max_depth)?,
                min_samples_split: parse_var("ML_MIN_SAMPLES_SPLIT", defaults.min_samples_split)?,
                seed,
            },
            split: SplitConfig {
                validation_fraction: parse_var(
                    "ML_VALIDATION_FRACTION",
                    SplitConfig::default().validation_fraction,
                )?,
                seed,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.forest.max_trees >= 1, "ML_MAX_TREES must be at least 1");
        ensure!(self.forest.tree_step >= 1, "ML_TREE_STEP must be at least 1");
        ensure!(
            (0.0..1.0).contains(&self.split.validation_fraction),
            "ML_VALIDATION_FRACTION must be in [0, 1), got {}",
            self.split.validation_fraction
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_full_validation_split() {
        let config = TrainingEnvConfig {
            forest: ForestParams::default(),
            split: SplitConfig {
                validation_fraction: 1.0,
                seed: 1,
            },
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_trees() {
        let config = TrainingEnvConfig {
            forest: ForestParams {
                max_trees: 0,
                ..ForestParams::default()
            },
            split: SplitConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
