//! Replenishment thresholds.

use super::parse_var;
use crate::application::decision::replenishment::DecisionConfig;
use anyhow::{Result, ensure};

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionEnvConfig {
    pub decision: DecisionConfig,
}

impl DecisionEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = DecisionConfig::default();
        let decision = DecisionConfig {
            safety_buffer: parse_var("REORDER_SAFETY_BUFFER", defaults.safety_buffer)?,
            overstock_ratio: parse_var("OVERSTOCK_RATIO", defaults.overstock_ratio)?,
            base_discount: parse_var("MARKDOWN_BASE_DISCOUNT", defaults.base_discount)?,
            urgency_weight: parse_var("MARKDOWN_URGENCY_WEIGHT", defaults.urgency_weight)?,
            overstock_weight: parse_var("MARKDOWN_OVERSTOCK_WEIGHT", defaults.overstock_weight)?,
        };
        ensure!(
            decision.safety_buffer >= 0.0,
            "REORDER_SAFETY_BUFFER must be non-negative"
        );
        ensure!(
            decision.overstock_ratio >= 1.0,
            "OVERSTOCK_RATIO must be at least 1.0"
        );
        Ok(Self { decision })
    }
}
