use thiserror::Error;

use stockcast_core::DomainError;

/// Errors surfaced by the forecasting engine.
///
/// Insufficient history is never an error: it degrades to low-confidence output.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A backing store (item/event reader, prediction store, usage counter) failed.
    #[error("store error: {0}")]
    Store(String),

    #[error("invalid recommendation id: {0}")]
    InvalidRecommendationId(String),

    /// A per-item worker panicked while scoring.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

impl ForecastError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(what))
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound(_)))
    }
}
