//! Typed predictions derived from an item and its usage pattern.
//!
//! Every generator is a pure function of `(item, pattern, tuning, as_of)`:
//! calling it twice with the same inputs yields the same prediction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::ItemId;
use stockcast_inventory::Item;

use crate::pattern::UsagePattern;
use crate::stats::round2;
use crate::tuning::{HeuristicConfidence, PredictionTuningConfig, WasteRiskTuning};

/// Kind of prediction, used to key stored records and feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    Reorder,
    WasteRisk,
    ThresholdOptimization,
    DemandForecast,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Reorder => "reorder",
            PredictionKind::WasteRisk => "waste_risk",
            PredictionKind::ThresholdOptimization => "threshold_optimization",
            PredictionKind::DemandForecast => "demand_forecast",
        }
    }
}

impl core::fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency tier carried by a reorder prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderForecast {
    /// `None` when there is no usage signal.
    pub days_until_reorder: Option<u32>,
    pub recommended_quantity: Option<u32>,
    pub priority: ReorderPriority,
    pub safety_buffer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRiskForecast {
    pub risk_level: RiskLevel,
    /// `None` when the item has no expiration date.
    pub days_until_expiration: Option<u32>,
    /// Never exceeds the on-hand quantity.
    pub estimated_waste_quantity: f64,
    pub waste_percentage: f64,
    pub estimated_waste_value: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdForecast {
    pub current_threshold: u32,
    pub recommended_threshold: u32,
    /// `current - recommended`: positive means the threshold can shrink.
    pub improvement: i64,
    pub safety_stock: u32,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub horizon_days: u32,
    pub projected_demand: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Type-specific prediction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredictionValue {
    Reorder(ReorderForecast),
    WasteRisk(WasteRiskForecast),
    ThresholdOptimization(ThresholdForecast),
    DemandForecast(DemandForecast),
}

impl PredictionValue {
    pub fn kind(&self) -> PredictionKind {
        match self {
            PredictionValue::Reorder(_) => PredictionKind::Reorder,
            PredictionValue::WasteRisk(_) => PredictionKind::WasteRisk,
            PredictionValue::ThresholdOptimization(_) => PredictionKind::ThresholdOptimization,
            PredictionValue::DemandForecast(_) => PredictionKind::DemandForecast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub item_id: ItemId,
    pub value: PredictionValue,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
    /// Recompute after this instant.
    pub expires_at: DateTime<Utc>,
    pub reasoning: String,
}

impl Prediction {
    pub fn kind(&self) -> PredictionKind {
        self.value.kind()
    }

    pub fn is_expired(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.expires_at
    }

    pub fn as_reorder(&self) -> Option<&ReorderForecast> {
        match &self.value {
            PredictionValue::Reorder(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_waste_risk(&self) -> Option<&WasteRiskForecast> {
        match &self.value {
            PredictionValue::WasteRisk(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_threshold(&self) -> Option<&ThresholdForecast> {
        match &self.value {
            PredictionValue::ThresholdOptimization(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_demand(&self) -> Option<&DemandForecast> {
        match &self.value {
            PredictionValue::DemandForecast(v) => Some(v),
            _ => None,
        }
    }
}

/// When (and how much) to reorder.
pub fn generate_reorder_prediction(
    item: &Item,
    pattern: &UsagePattern,
    tuning: &PredictionTuningConfig,
    as_of: DateTime<Utc>,
) -> Prediction {
    let expires_at = as_of + tuning.reorder_ttl();
    let avg = pattern.average_daily_usage;
    let quantity = f64::from(item.quantity);
    let confidence = heuristic_confidence(&tuning.prediction_confidence.reorder, pattern, quantity);

    if avg <= 0.0 {
        return Prediction {
            item_id: item.id,
            value: PredictionValue::Reorder(ReorderForecast {
                days_until_reorder: None,
                recommended_quantity: None,
                priority: ReorderPriority::Low,
                safety_buffer: 0.0,
            }),
            confidence_score: confidence,
            created_at: as_of,
            expires_at,
            reasoning: "insufficient usage data".to_string(),
        };
    }

    let safety_buffer = tuning.min_safety_buffer.max(pattern.usage_variance * 2.0);
    let headroom = quantity - f64::from(item.reorder_threshold) - safety_buffer;
    let days = (headroom / avg).max(0.0).round();
    let days_until_reorder = days.min(f64::from(u32::MAX)) as u32;

    let cover_days = tuning.lead_time_days + tuning.reorder_coverage_days;
    let order = (avg * cover_days + safety_buffer).ceil();
    let recommended_quantity = order.min(f64::from(u32::MAX)) as u32;

    let tiers = &tuning.reorder_tiers;
    let priority = if days_until_reorder <= tiers.urgent_days {
        ReorderPriority::High
    } else if days_until_reorder <= tiers.soon_days {
        ReorderPriority::Medium
    } else {
        ReorderPriority::Low
    };

    Prediction {
        item_id: item.id,
        value: PredictionValue::Reorder(ReorderForecast {
            days_until_reorder: Some(days_until_reorder),
            recommended_quantity: Some(recommended_quantity),
            priority,
            safety_buffer,
        }),
        confidence_score: confidence,
        created_at: as_of,
        expires_at,
        reasoning: format!(
            "average usage {avg:.1}/day with safety buffer {safety_buffer:.1}; stock reaches the reorder point in about {days_until_reorder} day(s)"
        ),
    }
}

/// How much stock is likely to expire before it is used.
pub fn generate_waste_risk_prediction(
    item: &Item,
    pattern: &UsagePattern,
    tuning: &PredictionTuningConfig,
    as_of: DateTime<Utc>,
) -> Prediction {
    let expires_at = as_of + tuning.waste_risk_ttl();

    let Some(expiration) = item.expiration_date else {
        return Prediction {
            item_id: item.id,
            value: PredictionValue::WasteRisk(WasteRiskForecast {
                risk_level: RiskLevel::Low,
                days_until_expiration: None,
                estimated_waste_quantity: 0.0,
                waste_percentage: 0.0,
                estimated_waste_value: 0.0,
                recommendation: "No expiration date recorded".to_string(),
            }),
            confidence_score: 0.1,
            created_at: as_of,
            expires_at,
            reasoning: "item has no expiration date".to_string(),
        };
    };

    let days = u32::try_from((expiration - as_of).num_days().max(0)).unwrap_or(u32::MAX);
    let quantity = f64::from(item.quantity);
    let avg = pattern.average_daily_usage;
    let tiers = &tuning.waste_risk;

    let (risk_level, waste_quantity, reasoning) = if avg > 0.0 {
        let projected = avg * f64::from(days);
        let waste = (quantity - projected).max(0.0);
        let pct = if quantity > 0.0 { waste / quantity } else { 0.0 };
        let risk = if pct > tiers.high_share {
            RiskLevel::High
        } else if pct > tiers.medium_share {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        (
            risk,
            waste,
            format!(
                "projected usage of {projected:.1} units over {days} day(s) leaves {waste:.1} of {} units ({:.0}%) at risk",
                item.quantity,
                pct * 100.0
            ),
        )
    } else if days <= tiers.no_usage_window_days && item.quantity > 0 {
        (
            RiskLevel::High,
            quantity,
            format!(
                "no usage recorded and stock expires in {days} day(s); all {} units are at risk",
                item.quantity
            ),
        )
    } else {
        (
            RiskLevel::Low,
            0.0,
            "insufficient usage data to project waste".to_string(),
        )
    };

    let waste_percentage = if quantity > 0.0 { waste_quantity / quantity } else { 0.0 };

    let confidence = heuristic_confidence(
        &tuning.prediction_confidence.waste_risk,
        pattern,
        quantity,
    );

    Prediction {
        item_id: item.id,
        value: PredictionValue::WasteRisk(WasteRiskForecast {
            risk_level,
            days_until_expiration: Some(days),
            estimated_waste_quantity: waste_quantity,
            waste_percentage,
            estimated_waste_value: round2(waste_quantity * item.unit_cost),
            recommendation: waste_recommendation_text(risk_level, days, waste_quantity, tiers),
        }),
        confidence_score: confidence,
        created_at: as_of,
        expires_at,
        reasoning,
    }
}

fn waste_recommendation_text(
    risk: RiskLevel,
    days: u32,
    waste: f64,
    tiers: &WasteRiskTuning,
) -> String {
    if risk == RiskLevel::Low {
        return "Stock level fits the remaining shelf life".to_string();
    }
    if days <= tiers.urgent_days {
        format!(
            "URGENT: {waste:.0} units expire within {days} day(s). Use immediately, run a special or donate."
        )
    } else if days <= tiers.critical_days {
        format!(
            "Use {waste:.0} units within {days} days: prioritize them in prep or transfer to another location."
        )
    } else {
        format!(
            "Reduce the next order: {waste:.0} units are projected to expire unused in {days} days."
        )
    }
}

/// Suggested reorder threshold given observed usage.
pub fn generate_threshold_optimization(
    item: &Item,
    pattern: &UsagePattern,
    tuning: &PredictionTuningConfig,
    as_of: DateTime<Utc>,
) -> Prediction {
    let expires_at = as_of + tuning.threshold_ttl();
    let current = item.reorder_threshold;
    let avg = pattern.average_daily_usage;
    let confidence = heuristic_confidence(
        &tuning.prediction_confidence.threshold,
        pattern,
        f64::from(item.quantity),
    );

    if avg <= 0.0 {
        return Prediction {
            item_id: item.id,
            value: PredictionValue::ThresholdOptimization(ThresholdForecast {
                current_threshold: current,
                recommended_threshold: current,
                improvement: 0,
                safety_stock: 0,
                recommendation: "Keep the current threshold".to_string(),
            }),
            confidence_score: confidence,
            created_at: as_of,
            expires_at,
            reasoning: "insufficient usage data".to_string(),
        };
    }

    let safety_stock = (avg * tuning.safety_stock_days + pattern.usage_variance * 2.0).ceil();
    let recommended = (avg * tuning.lead_time_days + safety_stock).ceil();
    let safety_stock = safety_stock.min(f64::from(u32::MAX)) as u32;
    let recommended_threshold = recommended.min(f64::from(u32::MAX)) as u32;
    let improvement = i64::from(current) - i64::from(recommended_threshold);

    let band = tuning.threshold_change_band;
    let (recommendation, reasoning) = if improvement > band {
        (
            format!(
                "Reduce the threshold from {current} to {recommended_threshold} to free up working capital"
            ),
            format!(
                "current threshold holds {improvement} units more than {:.0} days of lead-time demand plus safety stock requires",
                tuning.lead_time_days
            ),
        )
    } else if improvement < -band {
        (
            format!(
                "Increase the threshold from {current} to {recommended_threshold} to prevent stockouts"
            ),
            format!(
                "current threshold is {} units short of lead-time demand plus safety stock",
                -improvement
            ),
        )
    } else {
        (
            "Current threshold is optimal as-is".to_string(),
            format!(
                "current threshold is within {band} units of the computed {recommended_threshold}"
            ),
        )
    };


    Prediction {
        item_id: item.id,
        value: PredictionValue::ThresholdOptimization(ThresholdForecast {
            current_threshold: current,
            recommended_threshold,
            improvement,
            safety_stock,
            recommendation,
        }),
        confidence_score: confidence,
        created_at: as_of,
        expires_at,
        reasoning,
    }
}

/// Projected demand over `demand_horizon_days`, with a ±variance·√h band.
pub fn generate_demand_forecast(
    item: &Item,
    pattern: &UsagePattern,
    tuning: &PredictionTuningConfig,
    as_of: DateTime<Utc>,
) -> Prediction {
    let horizon = tuning.demand_horizon_days;
    let h = f64::from(horizon);
    let projected = pattern.average_daily_usage * h;
    let spread = pattern.usage_variance * h.sqrt();

    let confidence = heuristic_confidence(
        &tuning.prediction_confidence.demand,
        pattern,
        f64::from(item.quantity),
    );

    Prediction {
        item_id: item.id,
        value: PredictionValue::DemandForecast(DemandForecast {
            horizon_days: horizon,
            projected_demand: round2(projected),
            lower_bound: round2((projected - spread).max(0.0)),
            upper_bound: round2(projected + spread),
        }),
        confidence_score: confidence,
        created_at: as_of,
        expires_at: as_of + tuning.demand_forecast_ttl(),
        reasoning: format!(
            "{:.1} units/day projected over {horizon} day(s)",
            pattern.average_daily_usage
        ),
    }
}

/// Rule-based confidence: a fixed score without usage when the rule has one,
/// otherwise the base plus every bonus the pattern earns, capped.
fn heuristic_confidence(rule: &HeuristicConfidence, pattern: &UsagePattern, on_hand: f64) -> f64 {
    if !pattern.has_usage() {
        if let Some(score) = rule.no_usage {
            return score;
        }
    }
    let mut confidence = rule.base;
    if pattern.has_usage() {
        confidence += rule.usage_bonus;
    }
    if pattern.last_restock_days < rule.restock_within_days {
        confidence += rule.restock_bonus;
    }
    if pattern.usage_variance < rule.variance_below {
        confidence += rule.variance_bonus;
    }
    if on_hand > pattern.average_daily_usage * rule.stock_cover_days {
        confidence += rule.stock_cover_bonus;
    }
    confidence.min(rule.cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn as_of() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn item(quantity: u32, threshold: u32, unit_cost: f64) -> Item {
        Item::new(
            ItemId::new(),
            "Tomatoes",
            quantity,
            unit_cost,
            threshold,
            as_of() - Duration::days(120),
        )
        .unwrap()
    }

    fn pattern(avg: f64, variance: f64, last_restock_days: u32) -> UsagePattern {
        UsagePattern {
            average_daily_usage: avg,
            usage_variance: variance,
            last_restock_days,
            expiration_risk_score: crate::pattern::expiration_risk_score(
                avg,
                &crate::tuning::ExpirationRiskCurve::default(),
            ),
            seasonal_trend: 0.0,
        }
    }

    #[test]
    fn reorder_without_usage_is_low_confidence_and_empty() {
        let tuning = PredictionTuningConfig::default();
        let p = generate_reorder_prediction(
            &item(10, 5, 1.0),
            &pattern(0.0, 0.0, 999),
            &tuning,
            as_of(),
        );
        let v = p.as_reorder().unwrap();
        assert_eq!(v.days_until_reorder, None);
        assert_eq!(v.recommended_quantity, None);
        assert_eq!(v.priority, ReorderPriority::Low);
        assert_eq!(p.confidence_score, 0.1);
        assert_eq!(p.reasoning, "insufficient usage data");
        assert_eq!(p.expires_at, as_of() + Duration::hours(24));
    }

    #[test]
    fn reorder_scenario_two_per_day() {
        let tuning = PredictionTuningConfig::default();
        let p = generate_reorder_prediction(
            &item(10, 5, 1.0),
            &pattern(2.0, 0.0, 999),
            &tuning,
            as_of(),
        );
        let v = p.as_reorder().unwrap();
        // (10 - 5 - 3) / 2 = 1
        assert_eq!(v.days_until_reorder, Some(1));
        assert_eq!(v.priority, ReorderPriority::High);
        // ceil(2 * 21 + 3) = 45
        assert_eq!(v.recommended_quantity, Some(45));
        // 0.3 + 0.3 + 0.2 (variance) ; quantity 10 is not > 2*5
        assert!((p.confidence_score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn reorder_safety_buffer_grows_with_variance() {
        let tuning = PredictionTuningConfig::default();
        let p = generate_reorder_prediction(
            &item(100, 10, 1.0),
            &pattern(5.0, 4.0, 10),
            &tuning,
            as_of(),
        );
        let v = p.as_reorder().unwrap();
        assert_eq!(v.safety_buffer, 8.0);
        // (100 - 10 - 8) / 5 = 16.4 -> 16
        assert_eq!(v.days_until_reorder, Some(16));
        assert_eq!(v.priority, ReorderPriority::Low);
    }

    #[test]
    fn waste_without_usage_and_imminent_expiry_flags_entire_stock() {
        let tuning = PredictionTuningConfig::default();
        let it = item(100, 10, 2.5).with_expiration(as_of() + Duration::days(5));
        let p = generate_waste_risk_prediction(
            &it,
            &UsagePattern::insufficient_data(),
            &tuning,
            as_of(),
        );
        let v = p.as_waste_risk().unwrap();
        assert_eq!(v.risk_level, RiskLevel::High);
        assert_eq!(v.estimated_waste_quantity, 100.0);
        assert_eq!(v.estimated_waste_value, 250.0);
        assert_eq!(v.days_until_expiration, Some(5));
        assert_eq!(p.confidence_score, 0.2);
        assert_eq!(p.expires_at, as_of() + Duration::hours(12));
    }

    #[test]
    fn waste_projection_uses_average_usage() {
        let tuning = PredictionTuningConfig::default();
        let it = item(50, 10, 1.0).with_expiration(as_of() + Duration::days(10));
        let p = generate_waste_risk_prediction(&it, &pattern(2.0, 0.5, 5), &tuning, as_of());
        let v = p.as_waste_risk().unwrap();
        // 50 - 2*10 = 30 -> 60%
        assert_eq!(v.estimated_waste_quantity, 30.0);
        assert_eq!(v.risk_level, RiskLevel::High);
        assert!((p.confidence_score - 0.95).abs() < 1e-12);
        assert!(v.recommendation.starts_with("Reduce the next order"));
    }

    #[test]
    fn urgent_framing_within_three_days() {
        let tuning = PredictionTuningConfig::default();
        let it = item(40, 10, 1.0).with_expiration(as_of() + Duration::days(2));
        let p = generate_waste_risk_prediction(&it, &pattern(1.0, 0.5, 5), &tuning, as_of());
        let v = p.as_waste_risk().unwrap();
        assert_eq!(v.risk_level, RiskLevel::High);
        assert!(v.recommendation.starts_with("URGENT"));
    }

    #[test]
    fn expired_item_counts_zero_days() {
        let tuning = PredictionTuningConfig::default();
        let it = item(10, 0, 1.0).with_expiration(as_of() - Duration::days(3));
        let p = generate_waste_risk_prediction(&it, &pattern(1.0, 0.0, 5), &tuning, as_of());
        let v = p.as_waste_risk().unwrap();
        assert_eq!(v.days_until_expiration, Some(0));
        assert_eq!(v.estimated_waste_quantity, 10.0);
    }

    #[test]
    fn threshold_increase_when_too_low() {
        let tuning = PredictionTuningConfig::default();
        let p = generate_threshold_optimization(
            &item(50, 5, 1.0),
            &pattern(4.0, 1.0, 10),
            &tuning,
            as_of(),
        );
        let v = p.as_threshold().unwrap();
        // safety = ceil(12 + 2) = 14 ; recommended = ceil(28 + 14) = 42
        assert_eq!(v.safety_stock, 14);
        assert_eq!(v.recommended_threshold, 42);
        assert_eq!(v.improvement, -37);
        assert!(v.recommendation.starts_with("Increase"));
        assert!((p.confidence_score - 0.9).abs() < 1e-12);
        assert_eq!(p.expires_at, as_of() + Duration::days(7));
    }

    #[test]
    fn threshold_reduce_and_optimal_branches() {
        let tuning = PredictionTuningConfig::default();
        let reduce = generate_threshold_optimization(
            &item(80, 40, 1.0),
            &pattern(1.0, 0.0, 90),
            &tuning,
            as_of(),
        );
        let v = reduce.as_threshold().unwrap();
        // safety = 3 ; recommended = 10 ; improvement 30
        assert_eq!(v.recommended_threshold, 10);
        assert_eq!(v.improvement, 30);
        assert!(v.recommendation.starts_with("Reduce"));
        assert!((reduce.confidence_score - 0.6).abs() < 1e-12);

        let ok = generate_threshold_optimization(
            &item(80, 12, 1.0),
            &pattern(1.0, 0.0, 90),
            &tuning,
            as_of(),
        );
        assert!(ok.as_threshold().unwrap().recommendation.contains("optimal"));
    }

    #[test]
    fn threshold_without_usage_recommends_no_change() {
        let tuning = PredictionTuningConfig::default();
        let p = generate_threshold_optimization(
            &item(80, 12, 1.0),
            &UsagePattern::insufficient_data(),
            &tuning,
            as_of(),
        );
        let v = p.as_threshold().unwrap();
        assert_eq!(v.recommended_threshold, 12);
        assert_eq!(v.improvement, 0);
        assert_eq!(p.confidence_score, 0.1);
    }

    #[test]
    fn demand_forecast_band_is_non_negative() {
        let tuning = PredictionTuningConfig::default();
        let p = generate_demand_forecast(
            &item(10, 2, 1.0),
            &pattern(1.0, 5.0, 999),
            &tuning,
            as_of(),
        );
        let v = p.as_demand().unwrap();
        assert_eq!(v.horizon_days, 14);
        assert_eq!(v.projected_demand, 14.0);
        assert_eq!(v.lower_bound, 0.0);
        assert!(v.upper_bound > v.projected_demand);
    }

    #[test]
    fn generators_are_idempotent() {
        let tuning = PredictionTuningConfig::default();
        let it = item(30, 8, 3.0).with_expiration(as_of() + Duration::days(9));
        let pat = pattern(1.7, 0.9, 12);
        assert_eq!(
            generate_reorder_prediction(&it, &pat, &tuning, as_of()),
            generate_reorder_prediction(&it, &pat, &tuning, as_of())
        );
        assert_eq!(
            generate_waste_risk_prediction(&it, &pat, &tuning, as_of()),
            generate_waste_risk_prediction(&it, &pat, &tuning, as_of())
        );
        assert_eq!(
            generate_threshold_optimization(&it, &pat, &tuning, as_of()),
            generate_threshold_optimization(&it, &pat, &tuning, as_of())
        );
    }

    #[test]
    fn tuned_heuristics_change_confidence_and_tiers() {
        let mut tuning = PredictionTuningConfig::default();
        tuning.prediction_confidence.threshold.cap = 0.7;
        tuning.prediction_confidence.reorder.no_usage = Some(0.25);
        tuning.reorder_tiers.urgent_days = 0;

        let t = generate_threshold_optimization(
            &item(50, 5, 1.0),
            &pattern(4.0, 1.0, 10),
            &tuning,
            as_of(),
        );
        assert_eq!(t.confidence_score, 0.7);

        let none = generate_reorder_prediction(
            &item(10, 5, 1.0),
            &UsagePattern::insufficient_data(),
            &tuning,
            as_of(),
        );
        assert_eq!(none.confidence_score, 0.25);

        // One day out is no longer urgent.
        let r = generate_reorder_prediction(
            &item(10, 5, 1.0),
            &pattern(2.0, 0.0, 999),
            &tuning,
            as_of(),
        );
        assert_eq!(r.as_reorder().unwrap().priority, ReorderPriority::Medium);
    }

    #[test]
    fn tuned_waste_tiers_reclassify_risk() {
        let tuning = PredictionTuningConfig::default().with_waste_risk(WasteRiskTuning {
            high_share: 0.7,
            no_usage_window_days: 3,
            ..WasteRiskTuning::default()
        });
        let it = item(50, 10, 1.0).with_expiration(as_of() + Duration::days(10));
        // 60% at risk is only medium once high needs more than 70%.
        let p = generate_waste_risk_prediction(&it, &pattern(2.0, 0.5, 5), &tuning, as_of());
        assert_eq!(p.as_waste_risk().unwrap().risk_level, RiskLevel::Medium);

        let idle = item(100, 10, 1.0).with_expiration(as_of() + Duration::days(5));
        let p = generate_waste_risk_prediction(
            &idle,
            &UsagePattern::insufficient_data(),
            &tuning,
            as_of(),
        );
        assert_eq!(p.as_waste_risk().unwrap().risk_level, RiskLevel::Low);
    }

    proptest! {
        #[test]
        fn reorder_days_are_none_iff_no_usage(
            quantity in 0u32..10_000,
            threshold in 0u32..1_000,
            avg in prop_oneof![Just(0.0f64), 0.01f64..500.0],
            variance in 0.0f64..50.0,
        ) {
            let tuning = PredictionTuningConfig::default();
            let p = generate_reorder_prediction(
                &item(quantity, threshold, 1.0),
                &pattern(avg, variance, 999),
                &tuning,
                as_of(),
            );
            let v = p.as_reorder().unwrap();
            prop_assert_eq!(v.days_until_reorder.is_none(), avg <= 0.0);
            prop_assert!(p.confidence_score <= 0.95);
        }

        #[test]
        fn waste_never_exceeds_quantity(
            quantity in 0u32..10_000,
            avg in 0.0f64..100.0,
            days_to_expiry in -10i64..120,
        ) {
            let tuning = PredictionTuningConfig::default();
            let it = item(quantity, 0, 1.25)
                .with_expiration(as_of() + Duration::days(days_to_expiry));
            let p = generate_waste_risk_prediction(&it, &pattern(avg, 0.0, 999), &tuning, as_of());
            let v = p.as_waste_risk().unwrap();
            prop_assert!(v.estimated_waste_quantity <= f64::from(quantity));
            prop_assert!(v.estimated_waste_quantity >= 0.0);
            prop_assert!((0.0..=1.0).contains(&v.waste_percentage));
        }
    }
}
