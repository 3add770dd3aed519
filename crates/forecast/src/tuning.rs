//! Heuristic constants for every forecasting component.
//!
//! Defaults reproduce the production heuristics exactly. Tests and callers
//! override individual values through the `with_*` setters or a JSON document.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use stockcast_core::DomainError;

use crate::error::ForecastError;

/// Environment variable holding a JSON override document.
pub const TUNING_ENV_VAR: &str = "STOCKCAST_TUNING";

/// Upper bound for every look-back window and TTL.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Weights of the five confidence factors. They sum to 1.0 by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub data_quality: f64,
    pub pattern_consistency: f64,
    pub recent_activity: f64,
    pub item_maturity: f64,
    pub seasonal_reliability: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            data_quality: 0.30,
            pattern_consistency: 0.25,
            recent_activity: 0.20,
            item_maturity: 0.15,
            seasonal_reliability: 0.10,
        }
    }
}

/// Base score, bonuses and cap of one prediction kind's heuristic confidence.
///
/// Bonuses apply in field order: usage, recent restock, low variance, stock cover.
/// An override must give every field except `no_usage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicConfidence {
    /// Reported as-is when the pattern has no usage; `None` scores the bonuses anyway.
    pub no_usage: Option<f64>,
    pub base: f64,
    pub usage_bonus: f64,
    /// Restocked fewer than this many days ago earns `restock_bonus`.
    pub restock_within_days: u32,
    pub restock_bonus: f64,
    /// Usage variance below this earns `variance_bonus`.
    pub variance_below: f64,
    pub variance_bonus: f64,
    /// On-hand stock above this many days of average usage earns `stock_cover_bonus`.
    pub stock_cover_days: f64,
    pub stock_cover_bonus: f64,
    pub cap: f64,
}

impl HeuristicConfidence {
    pub fn reorder() -> Self {
        Self {
            no_usage: Some(0.1),
            base: 0.3,
            usage_bonus: 0.3,
            restock_within_days: 30,
            restock_bonus: 0.2,
            variance_below: 2.0,
            variance_bonus: 0.2,
            stock_cover_days: 5.0,
            stock_cover_bonus: 0.1,
            cap: 0.95,
        }
    }

    pub fn waste_risk() -> Self {
        Self {
            no_usage: Some(0.2),
            base: 0.3,
            usage_bonus: 0.0,
            restock_within_days: 30,
            restock_bonus: 0.4,
            variance_below: 2.0,
            variance_bonus: 0.3,
            stock_cover_days: 0.0,
            stock_cover_bonus: 0.0,
            cap: 0.95,
        }
    }

    pub fn threshold() -> Self {
        Self {
            no_usage: Some(0.1),
            base: 0.4,
            usage_bonus: 0.0,
            restock_within_days: 60,
            restock_bonus: 0.3,
            variance_below: 3.0,
            variance_bonus: 0.2,
            stock_cover_days: 0.0,
            stock_cover_bonus: 0.0,
            cap: 0.9,
        }
    }

    pub fn demand() -> Self {
        Self {
            no_usage: None,
            base: 0.3,
            usage_bonus: 0.3,
            restock_within_days: 30,
            restock_bonus: 0.1,
            variance_below: 2.0,
            variance_bonus: 0.2,
            stock_cover_days: 0.0,
            stock_cover_bonus: 0.0,
            cap: 0.9,
        }
    }

    fn is_valid(&self) -> bool {
        let unit = |x: f64| (0.0..=1.0).contains(&x);
        self.no_usage.is_none_or(unit)
            && unit(self.base)
            && unit(self.cap)
            && [self.usage_bonus, self.restock_bonus, self.variance_bonus, self.stock_cover_bonus]
                .iter()
                .all(|b| b.is_finite() && *b >= 0.0)
            && self.variance_below.is_finite()
            && self.stock_cover_days.is_finite()
    }
}

/// Per-kind heuristic confidence rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfidence {
    pub reorder: HeuristicConfidence,
    pub waste_risk: HeuristicConfidence,
    pub threshold: HeuristicConfidence,
    pub demand: HeuristicConfidence,
}

impl Default for PredictionConfidence {
    fn default() -> Self {
        Self {
            reorder: HeuristicConfidence::reorder(),
            waste_risk: HeuristicConfidence::waste_risk(),
            threshold: HeuristicConfidence::threshold(),
            demand: HeuristicConfidence::demand(),
        }
    }
}

/// Day cutoffs of the reorder urgency tiers (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderTiers {
    pub urgent_days: u32,
    pub soon_days: u32,
    /// Only the recommendation priority has a third tier.
    pub upcoming_days: u32,
}

impl Default for ReorderTiers {
    fn default() -> Self {
        Self {
            urgent_days: 3,
            soon_days: 7,
            upcoming_days: 10,
        }
    }
}

/// Waste-risk tiers and the windows that escalate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasteRiskTuning {
    /// Waste share above which the risk is high.
    pub high_share: f64,
    /// Waste share above which the risk is medium.
    pub medium_share: f64,
    /// Without usage, stock expiring within this many days is all at risk.
    pub no_usage_window_days: u32,
    /// High risk expiring within this many days is a critical recommendation.
    pub critical_days: u32,
    /// Expiring within this many days gets the urgent wording.
    pub urgent_days: u32,
}

impl Default for WasteRiskTuning {
    fn default() -> Self {
        Self {
            high_share: 0.5,
            medium_share: 0.2,
            no_usage_window_days: 7,
            critical_days: 7,
            urgent_days: 3,
        }
    }
}

/// Expiration-risk curve over average daily usage.
///
/// No usage scores `no_usage`; the score then falls linearly by `slope` up to
/// `fast_mover_usage`, never below `floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationRiskCurve {
    pub no_usage: f64,
    pub slope: f64,
    pub fast_mover_usage: f64,
    pub floor: f64,
}

impl Default for ExpirationRiskCurve {
    fn default() -> Self {
        Self {
            no_usage: 0.8,
            slope: 0.7,
            fast_mover_usage: 5.0,
            floor: 0.1,
        }
    }
}

/// How past feedback moves a confidence score, and the final clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackAdjustment {
    /// Helpful share at or above which `bonus` applies.
    pub high_accuracy: f64,
    pub bonus: f64,
    /// Helpful share at or below which `penalty` applies.
    pub low_accuracy: f64,
    pub penalty: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for FeedbackAdjustment {
    fn default() -> Self {
        Self {
            high_accuracy: 0.8,
            bonus: 0.05,
            low_accuracy: 0.3,
            penalty: 0.10,
            min_score: 0.05,
            max_score: 0.95,
        }
    }
}

/// All tunable constants of the pattern analyzer, predictors, confidence
/// calculator, recommendation rules and ordering ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionTuningConfig {
    /// Trailing window for usage-pattern analysis.
    pub pattern_window_days: i64,
    /// Trailing window for confidence scoring.
    pub confidence_window_days: i64,
    /// How far back actioned predictions count as feedback.
    pub feedback_window_days: i64,
    /// Events with a larger absolute delta are treated as data-entry errors.
    pub max_plausible_delta: u32,

    pub lead_time_days: f64,
    /// Days of demand a reorder covers beyond the lead time.
    pub reorder_coverage_days: f64,
    pub min_safety_buffer: f64,
    /// Days of average usage held back as threshold safety stock.
    pub safety_stock_days: f64,
    /// Threshold changes within this many units are reported as optimal.
    pub threshold_change_band: i64,
    pub demand_horizon_days: u32,

    pub reorder_ttl_hours: i64,
    pub waste_risk_ttl_hours: i64,
    pub threshold_ttl_days: i64,
    pub demand_forecast_ttl_hours: i64,

    /// Reorder predictions further out than this are not surfaced.
    pub reorder_horizon_days: u32,
    pub threshold_min_delta: u32,
    pub threshold_min_confidence: f64,
    /// Share of order cost avoided by not placing an emergency order.
    pub emergency_markup_rate: f64,
    pub bulk_discount_rate: f64,
    pub bulk_min_turnover: f64,
    pub bulk_min_cost_impact: f64,
    pub bulk_max_candidates: usize,
    pub max_recommendations: usize,
    pub max_personalized_recommendations: usize,
    /// Actions above this monetary impact require confirmation.
    pub confirmation_cost_threshold: f64,
    /// Threshold changes of at least this many units require confirmation.
    pub confirmation_threshold_delta: u32,

    pub batch_size: usize,

    pub distributor_price_factor: f64,
    pub specialty_price_factor: f64,

    pub confidence: ConfidenceWeights,
    pub feedback: FeedbackAdjustment,
    pub prediction_confidence: PredictionConfidence,
    pub reorder_tiers: ReorderTiers,
    pub waste_risk: WasteRiskTuning,
    pub expiration_risk: ExpirationRiskCurve,
}

impl Default for PredictionTuningConfig {
    fn default() -> Self {
        Self {
            pattern_window_days: 30,
            confidence_window_days: 90,
            feedback_window_days: 30,
            max_plausible_delta: 1000,

            lead_time_days: 7.0,
            reorder_coverage_days: 14.0,
            min_safety_buffer: 3.0,
            safety_stock_days: 3.0,
            threshold_change_band: 5,
            demand_horizon_days: 14,

            reorder_ttl_hours: 24,
            waste_risk_ttl_hours: 12,
            threshold_ttl_days: 7,
            demand_forecast_ttl_hours: 24,

            reorder_horizon_days: 14,
            threshold_min_delta: 3,
            threshold_min_confidence: 0.6,
            emergency_markup_rate: 0.15,
            bulk_discount_rate: 0.05,
            bulk_min_turnover: 2.0,
            bulk_min_cost_impact: 100.0,
            bulk_max_candidates: 5,
            max_recommendations: 20,
            max_personalized_recommendations: 10,
            confirmation_cost_threshold: 500.0,
            confirmation_threshold_delta: 10,

            batch_size: 10,

            distributor_price_factor: 0.95,
            specialty_price_factor: 1.10,

            confidence: ConfidenceWeights::default(),
            feedback: FeedbackAdjustment::default(),
            prediction_confidence: PredictionConfidence::default(),
            reorder_tiers: ReorderTiers::default(),
            waste_risk: WasteRiskTuning::default(),
            expiration_risk: ExpirationRiskCurve::default(),
        }
    }
}

impl PredictionTuningConfig {
    /// Parse a (partial) JSON override document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ForecastError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| DomainError::validation(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load overrides from `STOCKCAST_TUNING`, falling back to defaults.
    pub fn from_env() -> Self {
        match std::env::var(TUNING_ENV_VAR) {
            Ok(raw) => Self::from_json_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "invalid {TUNING_ENV_VAR}; using default tuning");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        let invalid = |msg: &str| -> Result<(), ForecastError> {
            Err(DomainError::validation(msg).into())
        };
        let in_window = |days: i64| (1..=MAX_WINDOW_DAYS).contains(&days);
        if !(in_window(self.pattern_window_days)
            && in_window(self.confidence_window_days)
            && in_window(self.feedback_window_days))
        {
            return invalid("analysis windows must be between 1 and 3650 days");
        }
        let max_hours = MAX_WINDOW_DAYS * 24;
        if ![self.reorder_ttl_hours, self.waste_risk_ttl_hours, self.demand_forecast_ttl_hours]
            .iter()
            .all(|h| (1..=max_hours).contains(h))
            || !in_window(self.threshold_ttl_days)
        {
            return invalid("prediction TTLs must be positive and at most 3650 days");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be >= 1");
        }
        if !(self.lead_time_days.is_finite() && self.lead_time_days >= 0.0) {
            return invalid("lead_time_days must be a finite non-negative number");
        }
        let c = &self.prediction_confidence;
        if ![&c.reorder, &c.waste_risk, &c.threshold, &c.demand]
            .iter()
            .all(|rule| rule.is_valid())
        {
            return invalid("prediction confidence base, cap and bonuses must lie in [0, 1]");
        }
        let f = &self.feedback;
        if !(0.0 <= f.min_score && f.min_score <= f.max_score && f.max_score <= 1.0) {
            return invalid("feedback score clamp must satisfy 0 <= min <= max <= 1");
        }
        let w = &self.waste_risk;
        if !(0.0 <= w.medium_share && w.medium_share <= w.high_share && w.high_share <= 1.0) {
            return invalid("waste risk shares must satisfy 0 <= medium <= high <= 1");
        }
        let t = &self.reorder_tiers;
        if !(t.urgent_days <= t.soon_days && t.soon_days <= t.upcoming_days) {
            return invalid("reorder tiers must be ascending");
        }
        Ok(())
    }

    pub fn with_lead_time_days(mut self, days: f64) -> Self {
        self.lead_time_days = days;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_pattern_window_days(mut self, days: i64) -> Self {
        self.pattern_window_days = days;
        self
    }

    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackAdjustment) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_prediction_confidence(mut self, confidence: PredictionConfidence) -> Self {
        self.prediction_confidence = confidence;
        self
    }

    pub fn with_waste_risk(mut self, waste_risk: WasteRiskTuning) -> Self {
        self.waste_risk = waste_risk;
        self
    }

    pub fn pattern_window(&self) -> Duration {
        bounded_days(self.pattern_window_days)
    }

    pub fn confidence_window(&self) -> Duration {
        bounded_days(self.confidence_window_days)
    }

    pub fn feedback_window(&self) -> Duration {
        bounded_days(self.feedback_window_days)
    }

    pub fn reorder_ttl(&self) -> Duration {
        bounded_hours(self.reorder_ttl_hours)
    }

    pub fn waste_risk_ttl(&self) -> Duration {
        bounded_hours(self.waste_risk_ttl_hours)
    }

    pub fn threshold_ttl(&self) -> Duration {
        bounded_days(self.threshold_ttl_days)
    }

    pub fn demand_forecast_ttl(&self) -> Duration {
        bounded_hours(self.demand_forecast_ttl_hours)
    }
}

// Fields are public, so configs built without `validate` still stay in range here.
fn bounded_days(days: i64) -> Duration {
    Duration::days(days.clamp(0, MAX_WINDOW_DAYS))
}

fn bounded_hours(hours: i64) -> Duration {
    Duration::hours(hours.clamp(0, MAX_WINDOW_DAYS * 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_confidence_weights_sum_to_one() {
        let w = ConfidenceWeights::default();
        let sum = w.data_quality
            + w.pattern_consistency
            + w.recent_activity
            + w.item_maturity
            + w.seasonal_reliability;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = PredictionTuningConfig::from_json_str(r#"{"lead_time_days": 5.0}"#).unwrap();
        assert_eq!(cfg.lead_time_days, 5.0);
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.confidence, ConfidenceWeights::default());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = PredictionTuningConfig::from_json_str(r#"{"batch_size": 0}"#).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn ttls_match_prediction_horizons() {
        let cfg = PredictionTuningConfig::default();
        assert_eq!(cfg.waste_risk_ttl(), Duration::hours(12));
        assert_eq!(cfg.reorder_ttl(), Duration::hours(24));
        assert_eq!(cfg.threshold_ttl(), Duration::days(7));
    }

    #[test]
    fn oversized_windows_and_ttls_are_rejected() {
        for json in [
            r#"{"confidence_window_days": 1000000000000000}"#,
            r#"{"pattern_window_days": 3651}"#,
            r#"{"feedback_window_days": 0}"#,
            r#"{"reorder_ttl_hours": 9223372036854775807}"#,
            r#"{"threshold_ttl_days": -1}"#,
        ] {
            let err = PredictionTuningConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ForecastError::Domain(DomainError::Validation(_))), "{json}");
        }
    }

    #[test]
    fn unvalidated_windows_are_clamped() {
        let mut cfg = PredictionTuningConfig::default();
        cfg.confidence_window_days = i64::MAX;
        cfg.waste_risk_ttl_hours = i64::MAX;
        assert_eq!(cfg.confidence_window(), Duration::days(MAX_WINDOW_DAYS));
        assert_eq!(cfg.waste_risk_ttl(), Duration::hours(MAX_WINDOW_DAYS * 24));
    }

    #[test]
    fn nested_heuristics_override_from_json() {
        let cfg = PredictionTuningConfig::from_json_str(
            r#"{"feedback": {"bonus": 0.1}, "waste_risk": {"no_usage_window_days": 3}}"#,
        )
        .unwrap();
        assert_eq!(cfg.feedback.bonus, 0.1);
        assert_eq!(cfg.feedback.penalty, 0.10);
        assert_eq!(cfg.waste_risk.no_usage_window_days, 3);
        assert_eq!(cfg.waste_risk.high_share, 0.5);
        assert_eq!(cfg.prediction_confidence.reorder, HeuristicConfidence::reorder());
    }

    #[test]
    fn inverted_waste_shares_are_rejected() {
        let err = PredictionTuningConfig::from_json_str(
            r#"{"waste_risk": {"high_share": 0.1, "medium_share": 0.4}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("waste risk"));
    }
}
