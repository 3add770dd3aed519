//! Business-facing recommendations derived from predictions.
//!
//! Recommendations are a transient view over predictions plus business rules;
//! they are recomputed per request and never stored.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::{ItemId, LocationId};
use stockcast_inventory::Item;

use crate::confidence::Reliability;
use crate::error::ForecastError;
use crate::pattern::UsagePattern;
use crate::prediction::{Prediction, PredictionKind, RiskLevel};
use crate::stats::round2;
use crate::tuning::PredictionTuningConfig;

/// Subscription-derived feature switches, supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub advanced_analytics: bool,
}

impl FeatureFlags {
    pub fn allows(&self, kind: RecommendationKind) -> bool {
        match kind.feature_required() {
            Some(Feature::AdvancedAnalytics) => self.advanced_analytics,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AdvancedAnalytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Reorder,
    WastePrevention,
    ThresholdOptimization,
    UsageOptimization,
}

impl RecommendationKind {
    pub const ALL: [RecommendationKind; 4] = [
        RecommendationKind::Reorder,
        RecommendationKind::WastePrevention,
        RecommendationKind::ThresholdOptimization,
        RecommendationKind::UsageOptimization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Reorder => "reorder",
            RecommendationKind::WastePrevention => "waste_prevention",
            RecommendationKind::ThresholdOptimization => "threshold_optimization",
            RecommendationKind::UsageOptimization => "usage_optimization",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// The prediction a recommendation of this kind is backed by.
    pub fn prediction_kind(&self) -> PredictionKind {
        match self {
            RecommendationKind::Reorder => PredictionKind::Reorder,
            RecommendationKind::WastePrevention => PredictionKind::WasteRisk,
            RecommendationKind::ThresholdOptimization => PredictionKind::ThresholdOptimization,
            RecommendationKind::UsageOptimization => PredictionKind::DemandForecast,
        }
    }

    pub fn feature_required(&self) -> Option<Feature> {
        match self {
            RecommendationKind::Reorder | RecommendationKind::ThresholdOptimization => {
                Some(Feature::AdvancedAnalytics)
            }
            RecommendationKind::WastePrevention | RecommendationKind::UsageOptimization => None,
        }
    }
}

impl core::fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn weight(&self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    CreatePurchaseOrder { quantity: u32, estimated_cost: f64 },
    UseBeforeExpiry { quantity: f64, days_until_expiration: u32 },
    UpdateReorderThreshold { from: u32, to: u32 },
    ConsolidateOrders { monthly_quantity: f64, monthly_cost: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub kind: ActionKind,
    pub label: String,
    /// Set when the monetary or quantity impact is large enough to need a human.
    pub confirmation_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    pub confidence_score: f64,
    pub reasoning: String,
    pub valid_until: DateTime<Utc>,
    pub feature_required: Option<Feature>,
    /// Reliability bucket from the confidence calculator, when scored.
    pub reliability: Option<Reliability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// `<kind>_<item id>`; the kind prefix routes feedback to the backing prediction.
    pub id: String,
    pub kind: RecommendationKind,
    pub item_id: ItemId,
    pub item_name: String,
    pub location_id: Option<LocationId>,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actionable: bool,
    pub estimated_savings: f64,
    pub actions: Vec<RecommendedAction>,
    pub metadata: RecommendationMetadata,
}

impl Recommendation {
    pub fn make_id(kind: RecommendationKind, item_id: ItemId) -> String {
        format!("{}_{}", kind.as_str(), item_id)
    }

    /// Split an id produced by [`Recommendation::make_id`].
    pub fn parse_id(id: &str) -> Result<(RecommendationKind, ItemId), ForecastError> {
        let invalid = || ForecastError::InvalidRecommendationId(id.to_string());
        let (prefix, item) = id.rsplit_once('_').ok_or_else(invalid)?;
        let kind = RecommendationKind::parse(prefix).ok_or_else(invalid)?;
        let item_id = item.parse::<ItemId>().map_err(|_| invalid())?;
        Ok((kind, item_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub total_recommendations: usize,
    /// High + critical.
    pub high_priority_count: usize,
    pub total_estimated_savings: f64,
    /// Kinds ranked by mean priority weight.
    pub top_categories: Vec<RecommendationKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub summary: RecommendationSummary,
}

fn base(
    kind: RecommendationKind,
    item: &Item,
    prediction: &Prediction,
    priority: Priority,
    title: String,
    description: String,
    estimated_savings: f64,
    actions: Vec<RecommendedAction>,
) -> Recommendation {
    Recommendation {
        id: Recommendation::make_id(kind, item.id),
        kind,
        item_id: item.id,
        item_name: item.name.clone(),
        location_id: item.location_id(),
        priority,
        title,
        description,
        actionable: !actions.is_empty(),
        estimated_savings: round2(estimated_savings.max(0.0)),
        actions,
        metadata: RecommendationMetadata {
            confidence_score: prediction.confidence_score,
            reasoning: prediction.reasoning.clone(),
            valid_until: prediction.expires_at,
            feature_required: kind.feature_required(),
            reliability: None,
        },
    }
}

/// Reorder recommendation, when the reorder point is within the horizon.
pub fn reorder_recommendation(
    item: &Item,
    prediction: &Prediction,
    tuning: &PredictionTuningConfig,
) -> Option<Recommendation> {
    let forecast = prediction.as_reorder()?;
    let days = forecast.days_until_reorder?;
    if days > tuning.reorder_horizon_days {
        return None;
    }
    let quantity = forecast.recommended_quantity.unwrap_or(0);

    let tiers = &tuning.reorder_tiers;
    let priority = if days <= tiers.urgent_days {
        Priority::Critical
    } else if days <= tiers.soon_days {
        Priority::High
    } else if days <= tiers.upcoming_days {
        Priority::Medium
    } else {
        Priority::Low
    };
    let order_cost = f64::from(quantity) * item.unit_cost;
    let savings = if priority == Priority::Critical {
        order_cost * tuning.emergency_markup_rate
    } else {
        0.0
    };

    let action = RecommendedAction {
        kind: ActionKind::CreatePurchaseOrder {
            quantity,
            estimated_cost: round2(order_cost),
        },
        label: format!("Order {quantity} units of {}", item.name),
        confirmation_required: order_cost > tuning.confirmation_cost_threshold,
    };

    Some(base(
        RecommendationKind::Reorder,
        item,
        prediction,
        priority,
        format!("Reorder {}", item.name),
        format!(
            "{} reaches its reorder point in {days} day(s) ({} on hand, threshold {}). Order {quantity} units.",
            item.name, item.quantity, item.reorder_threshold
        ),
        savings,
        vec![action],
    ))
}

/// Waste-prevention recommendation for medium/high waste risk.
pub fn waste_recommendation(
    item: &Item,
    prediction: &Prediction,
    tuning: &PredictionTuningConfig,
) -> Option<Recommendation> {
    let forecast = prediction.as_waste_risk()?;
    let days = forecast.days_until_expiration?;
    let priority = match forecast.risk_level {
        RiskLevel::Low => return None,
        RiskLevel::High if days <= tuning.waste_risk.critical_days => Priority::Critical,
        RiskLevel::High => Priority::High,
        RiskLevel::Medium => Priority::Medium,
    };

    let action = RecommendedAction {
        kind: ActionKind::UseBeforeExpiry {
            quantity: forecast.estimated_waste_quantity,
            days_until_expiration: days,
        },
        label: forecast.recommendation.clone(),
        confirmation_required: forecast.estimated_waste_value > tuning.confirmation_cost_threshold,
    };

    Some(base(
        RecommendationKind::WastePrevention,
        item,
        prediction,
        priority,
        format!("Prevent waste: {}", item.name),
        format!(
            "{:.0} units (${:.2}) of {} may expire in {days} day(s).",
            forecast.estimated_waste_quantity, forecast.estimated_waste_value, item.name
        ),
        forecast.estimated_waste_value,
        vec![action],
    ))
}

/// Threshold recommendation when the change is material and well supported.
pub fn threshold_recommendation(
    item: &Item,
    prediction: &Prediction,
    tuning: &PredictionTuningConfig,
) -> Option<Recommendation> {
    let forecast = prediction.as_threshold()?;
    let delta = forecast.improvement.unsigned_abs();
    if delta < u64::from(tuning.threshold_min_delta)
        || prediction.confidence_score <= tuning.threshold_min_confidence
    {
        return None;
    }

    let capital = if forecast.improvement > 0 {
        forecast.improvement as f64 * item.unit_cost
    } else {
        0.0
    };
    let priority = if delta >= u64::from(tuning.confirmation_threshold_delta) {
        Priority::Medium
    } else {
        Priority::Low
    };

    let action = RecommendedAction {
        kind: ActionKind::UpdateReorderThreshold {
            from: forecast.current_threshold,
            to: forecast.recommended_threshold,
        },
        label: forecast.recommendation.clone(),
        confirmation_required: delta >= u64::from(tuning.confirmation_threshold_delta)
            || capital > tuning.confirmation_cost_threshold,
    };

    Some(base(
        RecommendationKind::ThresholdOptimization,
        item,
        prediction,
        priority,
        format!("Adjust reorder threshold: {}", item.name),
        format!(
            "Change the reorder threshold of {} from {} to {}.",
            item.name, forecast.current_threshold, forecast.recommended_threshold
        ),
        capital,
        vec![action],
    ))
}

/// Input for bulk-order candidate selection.
#[derive(Debug, Clone, Copy)]
pub struct UsageCandidate<'a> {
    pub item: &'a Item,
    pub pattern: &'a UsagePattern,
    pub demand: &'a Prediction,
}

/// Bulk-order candidates: fast movers with material monthly spend, top N by turnover.
pub fn usage_optimization_recommendations(
    candidates: &[UsageCandidate<'_>],
    tuning: &PredictionTuningConfig,
) -> Vec<Recommendation> {
    let mut scored: Vec<(f64, f64, f64, &UsageCandidate<'_>)> = candidates
        .iter()
        .filter_map(|c| {
            let monthly_usage = c.pattern.average_daily_usage * 30.0;
            let turnover = monthly_usage / f64::from(c.item.quantity.max(1));
            let cost_impact = monthly_usage * c.item.unit_cost;
            (turnover > tuning.bulk_min_turnover && cost_impact > tuning.bulk_min_cost_impact)
                .then_some((turnover, monthly_usage, cost_impact, c))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.3.item.id.cmp(&b.3.item.id)));
    scored.truncate(tuning.bulk_max_candidates);

    scored
        .into_iter()
        .map(|(turnover, monthly_usage, cost_impact, c)| {
            let action = RecommendedAction {
                kind: ActionKind::ConsolidateOrders {
                    monthly_quantity: round2(monthly_usage),
                    monthly_cost: round2(cost_impact),
                },
                label: format!("Consolidate {} orders into a bulk purchase", c.item.name),
                confirmation_required: cost_impact > tuning.confirmation_cost_threshold,
            };
            base(
                RecommendationKind::UsageOptimization,
                c.item,
                c.demand,
                Priority::Medium,
                format!("Bulk-order {}", c.item.name),
                format!(
                    "{} turns over {turnover:.1}x per month (${cost_impact:.2} monthly spend); bulk ordering can lower unit cost.",
                    c.item.name
                ),
                cost_impact * tuning.bulk_discount_rate,
                vec![action],
            )
        })
        .collect()
}

/// Priority weight desc, savings desc, confidence desc.
pub fn compare_recommendations(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| b.estimated_savings.total_cmp(&a.estimated_savings))
        .then_with(|| b.metadata.confidence_score.total_cmp(&a.metadata.confidence_score))
}

/// Sort, drop duplicate `(kind, item)` entries keeping the best-ranked one, truncate.
pub fn rank_recommendations(mut recs: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    recs.sort_by(compare_recommendations);
    let mut seen = HashSet::new();
    recs.retain(|r| seen.insert(r.id.clone()));
    recs.truncate(limit);
    recs
}

pub fn summarize(recs: &[Recommendation]) -> RecommendationSummary {
    let mut by_kind: BTreeMap<RecommendationKind, (u32, u32)> = BTreeMap::new();
    for r in recs {
        let entry = by_kind.entry(r.kind).or_insert((0, 0));
        entry.0 += u32::from(r.priority.weight());
        entry.1 += 1;
    }
    let mut ranked: Vec<(RecommendationKind, f64)> = by_kind
        .into_iter()
        .map(|(k, (sum, n))| (k, f64::from(sum) / f64::from(n)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    RecommendationSummary {
        total_recommendations: recs.len(),
        high_priority_count: recs.iter().filter(|r| r.priority >= Priority::High).count(),
        total_estimated_savings: round2(recs.iter().map(|r| r.estimated_savings).sum()),
        top_categories: ranked.into_iter().map(|(k, _)| k).collect(),
    }
}
