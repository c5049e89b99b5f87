use thiserror::Error;

/// Errors raised by the forecasting core.
///
/// Sparse history (a product with no records, or fewer records than a lag window)
/// has no variant here; it is zero-filled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Forecast service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("Insufficient training data: {rows} usable rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    #[error("Learner failure: {reason}")]
    Learner { reason: String },

    #[error("Artifact error: {reason}")]
    Artifact { reason: String },

    #[error("History store error: {reason}")]
    Storage { reason: String },
}

impl ForecastError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn learner(reason: impl Into<String>) -> Self {
        Self::Learner {
            reason: reason.into(),
        }
    }

    pub fn artifact(reason: impl Into<String>) -> Self {
        Self::Artifact {
            reason: reason.into(),
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage {
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used in per-product failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::MalformedInput { .. } => "malformed_input",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::Learner { .. } => "learner",
            Self::Artifact { .. } => "artifact",
            Self::Storage { .. } => "storage",
        }
    }
}
