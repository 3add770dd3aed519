//! `stockcast-forecast`
//!
//! Turns an item's change log into usage patterns, typed predictions,
//! confidence scores, ranked recommendations and supplier quotes.
//!
//! The crate performs no I/O of its own: items, events and prediction records
//! come in through the traits in [`ports`]. Pure functions take an explicit
//! `as_of` instant so results are reproducible.

mod batch;
mod stats;

pub mod confidence;
pub mod engine;
pub mod error;
pub mod ordering;
pub mod pattern;
pub mod ports;
pub mod prediction;
pub mod recommendation;
pub mod tuning;

pub use batch::run_batched;
pub use confidence::{
    ConfidenceCalculator, ConfidenceFactors, ConfidenceInput, ConfidenceMetrics, Reliability,
    calculate_confidence,
};
pub use engine::{ForecastEngine, RECOMMENDATIONS_FEATURE, RecommendationAction};
pub use error::ForecastError;
pub use ordering::{
    OptionTag, OrderingOption, Supplier, SupplierDirectory, SupplierKind, SupplierPreferences,
    rank_ordering_options,
};
pub use pattern::{UsagePattern, analyze_events};
pub use ports::{
    Feedback, FeatureUsageRecorder, InventoryReader, PredictionHistoryProvider, PredictionRecord,
    PredictionStore, SupplierPreferenceProvider,
};
pub use prediction::{
    DemandForecast, Prediction, PredictionKind, PredictionValue, ReorderForecast, ReorderPriority,
    RiskLevel, ThresholdForecast, WasteRiskForecast, generate_demand_forecast,
    generate_reorder_prediction, generate_threshold_optimization, generate_waste_risk_prediction,
};
pub use recommendation::{
    FeatureFlags, Priority, Recommendation, RecommendationKind, RecommendationReport,
    RecommendationSummary,
};
pub use stats::round2;
pub use tuning::{ConfidenceWeights, PredictionTuningConfig, TUNING_ENV_VAR};
