//! Reliability scoring for predictions.
//!
//! Five independent factors, each in [0, 1], are weighted into a base score,
//! nudged by historical feedback accuracy, then clamped (to [0.05, 0.95] by
//! default).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stockcast_core::{ItemId, OrganizationId};
use stockcast_inventory::ChangeEvent;

use crate::batch::run_batched;
use crate::error::ForecastError;
use crate::ports::{InventoryReader, PredictionHistoryProvider};
use crate::prediction::PredictionKind;
use crate::stats::{coefficient_of_variation, days_between, round2};
use crate::tuning::{ConfidenceWeights, PredictionTuningConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

impl Reliability {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Reliability::High
        } else if score >= 0.4 {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub data_quality: f64,
    pub pattern_consistency: f64,
    pub recent_activity: f64,
    pub item_maturity: f64,
    pub seasonal_reliability: f64,
}

impl ConfidenceFactors {
    pub fn weighted(&self, w: &ConfidenceWeights) -> f64 {
        self.data_quality * w.data_quality
            + self.pattern_consistency * w.pattern_consistency
            + self.recent_activity * w.recent_activity
            + self.item_maturity * w.item_maturity
            + self.seasonal_reliability * w.seasonal_reliability
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub item_id: ItemId,
    pub prediction_kind: PredictionKind,
    /// Overall score in [0.05, 0.95], 2 decimals.
    pub score: f64,
    pub factors: ConfidenceFactors,
    pub reasoning: Vec<String>,
    pub data_points: usize,
    pub reliability: Reliability,
}

/// Everything the pure scoring function needs, already fetched.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInput<'a> {
    pub item_id: ItemId,
    pub kind: PredictionKind,
    /// The confidence window of change events (default 90 days).
    pub events: &'a [ChangeEvent],
    pub item_created_at: DateTime<Utc>,
    /// Feedback scores (-1/0/1) of actioned predictions of the same kind.
    pub feedback_scores: &'a [i8],
    pub as_of: DateTime<Utc>,
}

/// Score a prediction's reliability. Pure: no IO, no clock.
pub fn calculate_confidence(
    input: &ConfidenceInput<'_>,
    tuning: &PredictionTuningConfig,
) -> ConfidenceMetrics {
    let factors = ConfidenceFactors {
        data_quality: data_quality(input.events, tuning.max_plausible_delta),
        pattern_consistency: pattern_consistency(input.events, tuning.max_plausible_delta),
        recent_activity: recent_activity(input.events, input.as_of),
        item_maturity: item_maturity(input.events.len(), input.item_created_at, input.as_of),
        seasonal_reliability: seasonal_reliability(input.events),
    };

    let mut score = factors.weighted(&tuning.confidence);
    let adjust = &tuning.feedback;
    let accuracy = feedback_accuracy(input.feedback_scores);
    if let Some(accuracy) = accuracy {
        if accuracy >= adjust.high_accuracy {
            score += adjust.bonus;
        } else if accuracy <= adjust.low_accuracy {
            score -= adjust.penalty;
        }
    }
    let score = round2(score.clamp(adjust.min_score, adjust.max_score));

    let mut reasoning = factor_reasoning(&factors);
    if let Some(accuracy) = accuracy {
        reasoning.push(format!(
            "{:.0}% of {} past {} prediction(s) were rated helpful",
            accuracy * 100.0,
            input.feedback_scores.len(),
            input.kind
        ));
    }
    reasoning.push(format!(
        "Based on {} inventory change(s) over the last {} days",
        input.events.len(),
        tuning.confidence_window_days
    ));

    ConfidenceMetrics {
        item_id: input.item_id,
        prediction_kind: input.kind,
        score,
        factors,
        reasoning,
        data_points: input.events.len(),
        reliability: Reliability::from_score(score),
    }
}

/// Volume, coverage and plausibility of the change log.
pub fn data_quality(events: &[ChangeEvent], max_plausible_delta: u32) -> f64 {
    let n = events.len();
    let mut score = match n {
        20.. => 0.4,
        10.. => 0.3,
        5.. => 0.2,
        _ => 0.1,
    };
    if events.iter().any(ChangeEvent::is_usage) {
        score += 0.3;
    }
    if events.iter().any(ChangeEvent::is_restock) {
        score += 0.2;
    }
    let kinds: BTreeSet<_> = events.iter().map(|e| e.change_type).collect();
    if kinds.len() >= 3 {
        score += 0.1;
    }

    let validity = if n == 0 {
        1.0
    } else {
        let invalid = events
            .iter()
            .filter(|e| !e.is_plausible(max_plausible_delta))
            .count();
        1.0 - invalid as f64 / n as f64
    };

    (score * validity).min(1.0)
}

/// Regularity of usage amounts, with a bonus for a regular cadence.
pub fn pattern_consistency(events: &[ChangeEvent], max_plausible_delta: u32) -> f64 {
    let mut usage: Vec<&ChangeEvent> = events
        .iter()
        .filter(|e| e.is_usage() && e.is_plausible(max_plausible_delta))
        .collect();
    if usage.len() < 3 {
        return 0.2;
    }
    usage.sort_by_key(|e| e.occurred_at);

    let amounts: Vec<f64> = usage.iter().map(|e| f64::from(e.usage_amount())).collect();
    let Some(cv) = coefficient_of_variation(&amounts) else {
        return 0.1;
    };
    let mut score = (1.0 - cv / 2.0).max(0.0);

    let intervals: Vec<f64> = usage
        .windows(2)
        .map(|pair| days_between(pair[0].occurred_at, pair[1].occurred_at))
        .collect();
    if coefficient_of_variation(&intervals).is_some_and(|cv| cv < 0.5) {
        score += 0.1;
    }

    score.min(1.0)
}

/// How active the item has been over the last 30 days.
pub fn recent_activity(events: &[ChangeEvent], as_of: DateTime<Utc>) -> f64 {
    let cutoff = as_of - Duration::days(30);
    let recent: Vec<&ChangeEvent> = events.iter().filter(|e| e.occurred_at >= cutoff).collect();
    let recent_usage = recent.iter().filter(|e| e.is_usage()).count();

    let mut score: f64 = match recent.len() {
        5.. => 0.5,
        2.. => 0.3,
        1 => 0.1,
        0 => 0.0,
    };
    score += match recent_usage {
        3.. => 0.3,
        1.. => 0.2,
        0 => 0.0,
    };
    if let Some(latest) = events.iter().map(|e| e.occurred_at).max() {
        let age = days_between(latest, as_of);
        if age <= 7.0 {
            score += 0.2;
        } else if age <= 30.0 {
            score += 0.1;
        }
    }

    score.min(1.0)
}

/// Age, activity rate and historical depth of the item.
pub fn item_maturity(event_count: usize, created_at: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    let age_days = days_between(created_at, as_of).max(0.0);

    let mut score: f64 = if age_days >= 90.0 {
        0.4
    } else if age_days >= 30.0 {
        0.3
    } else if age_days >= 14.0 {
        0.2
    } else {
        0.1
    };

    let weeks = (age_days / 7.0).max(1.0);
    let per_week = event_count as f64 / weeks;
    if per_week >= 2.0 {
        score += 0.3;
    } else if per_week >= 1.0 {
        score += 0.2;
    } else if per_week >= 0.5 {
        score += 0.1;
    }

    score += match event_count {
        20.. => 0.3,
        10.. => 0.2,
        5.. => 0.1,
        _ => 0.0,
    };

    score.min(1.0)
}

/// Stability of monthly usage totals.
///
/// Stand-in for a seasonal model: monthly CV only, bounded to [0.3, 0.8].
pub fn seasonal_reliability(events: &[ChangeEvent]) -> f64 {
    if events.len() < 10 {
        return 0.3;
    }
    let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for e in events.iter().filter(|e| e.is_usage()) {
        let key = (e.occurred_at.year(), e.occurred_at.month());
        *monthly.entry(key).or_insert(0.0) += f64::from(e.usage_amount());
    }
    let totals: Vec<f64> = monthly.into_values().collect();
    match coefficient_of_variation(&totals) {
        Some(cv) => (1.0 - cv).clamp(0.3, 0.8),
        None => 0.3,
    }
}

/// Share of feedback scores equal to 1; `None` without feedback.
fn feedback_accuracy(scores: &[i8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let helpful = scores.iter().filter(|s| **s == 1).count();
    Some(helpful as f64 / scores.len() as f64)
}

fn bucket<'a>(value: f64, high: &'a str, medium: &'a str, low: &'a str) -> &'a str {
    if value >= 0.7 {
        high
    } else if value >= 0.4 {
        medium
    } else {
        low
    }
}

fn factor_reasoning(f: &ConfidenceFactors) -> Vec<String> {
    [
        bucket(
            f.data_quality,
            "Rich, clean change history",
            "Moderate amount of usable change history",
            "Limited or noisy change history",
        ),
        bucket(
            f.pattern_consistency,
            "Usage amounts follow a consistent pattern",
            "Usage shows some variability",
            "Usage is irregular or too sparse to establish a pattern",
        ),
        bucket(
            f.recent_activity,
            "Item is actively tracked",
            "Some recent activity recorded",
            "Little recent activity recorded",
        ),
        bucket(
            f.item_maturity,
            "Item has a long, active history",
            "Item history is still building",
            "Item is new or rarely updated",
        ),
        bucket(
            f.seasonal_reliability,
            "Monthly usage is stable",
            "Monthly usage varies moderately",
            "Not enough history to judge month-to-month stability",
        ),
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Fetches history through the injected capabilities and scores it.
pub struct ConfidenceCalculator {
    inventory: Arc<dyn InventoryReader>,
    history: Arc<dyn PredictionHistoryProvider>,
    tuning: PredictionTuningConfig,
}

impl ConfidenceCalculator {
    pub fn new(
        inventory: Arc<dyn InventoryReader>,
        history: Arc<dyn PredictionHistoryProvider>,
        tuning: PredictionTuningConfig,
    ) -> Self {
        Self {
            inventory,
            history,
            tuning,
        }
    }

    pub fn calculate_item_confidence(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        kind: PredictionKind,
        as_of: DateTime<Utc>,
    ) -> Result<ConfidenceMetrics, ForecastError> {
        let item = self.inventory.item(org, item_id)?;
        let since = as_of - self.tuning.confidence_window();
        let events = self.inventory.change_events(org, item_id, since)?;
        self.score_events(org, item_id, item.created_at, &events, kind, as_of)
    }

    /// Score with an already-fetched confidence window of events.
    pub fn score_events(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        item_created_at: DateTime<Utc>,
        events: &[ChangeEvent],
        kind: PredictionKind,
        as_of: DateTime<Utc>,
    ) -> Result<ConfidenceMetrics, ForecastError> {
        let since = as_of - self.tuning.feedback_window();
        let feedback: Vec<i8> = self
            .history
            .actioned_since(org, item_id, kind, since)?
            .into_iter()
            .filter_map(|r| r.feedback_score)
            .collect();

        let metrics = calculate_confidence(
            &ConfidenceInput {
                item_id,
                kind,
                events,
                item_created_at,
                feedback_scores: &feedback,
                as_of,
            },
            &self.tuning,
        );
        debug!(org = %org, item = %item_id, kind = %kind, score = metrics.score, "confidence scored");
        Ok(metrics)
    }

    /// Score many items with bounded fan-out. Items that fail are logged and
    /// left out of the map.
    pub fn calculate_batch_confidence(
        &self,
        org: OrganizationId,
        item_ids: &[ItemId],
        kind: PredictionKind,
        as_of: DateTime<Utc>,
    ) -> HashMap<ItemId, ConfidenceMetrics> {
        let results = run_batched(item_ids, self.tuning.batch_size, |id| {
            self.calculate_item_confidence(org, *id, kind, as_of)
        });

        let mut out = HashMap::with_capacity(item_ids.len());
        for (id, result) in item_ids.iter().zip(results) {
            match result {
                Ok(metrics) => {
                    out.insert(*id, metrics);
                }
                Err(e) => {
                    warn!(org = %org, item = %id, kind = %kind, error = %e, "confidence scoring failed; item omitted");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::FeedbackAdjustment;
    use proptest::prelude::*;
    use stockcast_inventory::ChangeType;

    fn as_of() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-30T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ev(item: ItemId, days_ago: i64, before: u32, after: u32, kind: ChangeType) -> ChangeEvent {
        ChangeEvent::new(item, before, after, kind, as_of() - Duration::days(days_ago))
    }

    fn regular_usage(item: ItemId, count: i64, every_days: i64) -> Vec<ChangeEvent> {
        (0..count)
            .map(|i| ev(item, (count - i) * every_days, 500, 495, ChangeType::Usage))
            .collect()
    }

    #[test]
    fn data_quality_rewards_volume_and_coverage() {
        let item = ItemId::new();
        let mut events = regular_usage(item, 20, 1);
        events.push(ev(item, 3, 10, 60, ChangeType::Restock));
        events.push(ev(item, 2, 60, 58, ChangeType::Waste));
        assert!((data_quality(&events, 1000) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn implausible_deltas_suppress_data_quality_proportionally() {
        let item = ItemId::new();
        let mut events = regular_usage(item, 3, 1);
        events.push(ev(item, 1, 40, 40, ChangeType::Adjustment));
        // base 0.1 + 0.3 (usage) = 0.4; one of four events invalid.
        assert!((data_quality(&events, 1000) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn consistency_needs_three_usage_events() {
        let item = ItemId::new();
        assert_eq!(pattern_consistency(&regular_usage(item, 2, 1), 1000), 0.2);
    }

    #[test]
    fn perfectly_regular_usage_is_fully_consistent() {
        let item = ItemId::new();
        // CV 0 -> 1.0, cadence bonus capped.
        assert_eq!(pattern_consistency(&regular_usage(item, 6, 2), 1000), 1.0);
    }

    #[test]
    fn irregular_amounts_lower_consistency() {
        let item = ItemId::new();
        let events = [
            ev(item, 9, 100, 99, ChangeType::Usage),
            ev(item, 8, 99, 79, ChangeType::Usage),
            ev(item, 2, 79, 78, ChangeType::Usage),
        ];
        let score = pattern_consistency(&events, 1000);
        assert!(score < 0.6, "score was {score}");
    }

    #[test]
    fn recent_activity_caps_at_one() {
        let item = ItemId::new();
        assert_eq!(recent_activity(&regular_usage(item, 10, 1), as_of()), 1.0);
        assert_eq!(recent_activity(&[], as_of()), 0.0);
    }

    #[test]
    fn stale_activity_only_gets_recency_credit() {
        let item = ItemId::new();
        let events = [ev(item, 45, 10, 5, ChangeType::Usage)];
        assert_eq!(recent_activity(&events, as_of()), 0.0);
        let events = [ev(item, 20, 10, 5, ChangeType::Usage)];
        // 1 change +0.1, 1 usage +0.2, latest <= 30 days +0.1
        assert!((recent_activity(&events, as_of()) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn item_maturity_combines_age_rate_and_depth() {
        let created = as_of() - Duration::days(100);
        // 30 events over ~14.3 weeks -> 2.1/week
        assert!((item_maturity(30, created, as_of()) - 1.0).abs() < 1e-12);
        assert!((item_maturity(0, as_of(), as_of()) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn seasonal_reliability_is_bounded() {
        let item = ItemId::new();
        assert_eq!(seasonal_reliability(&regular_usage(item, 5, 1)), 0.3);
        let steady = regular_usage(item, 60, 1);
        let s = seasonal_reliability(&steady);
        assert!((0.3..=0.8).contains(&s));
    }

    #[test]
    fn feedback_accuracy_adjusts_score() {
        let item = ItemId::new();
        let events = regular_usage(item, 12, 2);
        let base = ConfidenceInput {
            item_id: item,
            kind: PredictionKind::Reorder,
            events: &events,
            item_created_at: as_of() - Duration::days(60),
            feedback_scores: &[],
            as_of: as_of(),
        };
        let tuning = PredictionTuningConfig::default();
        let plain = calculate_confidence(&base, &tuning).score;

        let good = calculate_confidence(
            &ConfidenceInput {
                feedback_scores: &[1, 1, 1, 1, 0],
                ..base
            },
            &tuning,
        );
        let bad = calculate_confidence(
            &ConfidenceInput {
                feedback_scores: &[-1, -1, 0, 1],
                ..base
            },
            &tuning,
        );
        assert!(good.score > plain);
        assert!((good.score - plain - 0.05).abs() < 0.0101);
        assert!(bad.score < plain);
        assert!(good.reasoning.iter().any(|r| r.contains("rated helpful")));
    }

    #[test]
    fn feedback_adjustment_and_clamp_follow_tuning() {
        let item = ItemId::new();
        let events = regular_usage(item, 12, 2);
        let base = ConfidenceInput {
            item_id: item,
            kind: PredictionKind::Reorder,
            events: &events,
            item_created_at: as_of() - Duration::days(60),
            feedback_scores: &[],
            as_of: as_of(),
        };
        let lenient = PredictionTuningConfig::default().with_feedback(FeedbackAdjustment {
            penalty: 0.0,
            ..FeedbackAdjustment::default()
        });
        let plain = calculate_confidence(&base, &lenient).score;
        let bad = calculate_confidence(
            &ConfidenceInput {
                feedback_scores: &[-1, -1, 0],
                ..base
            },
            &lenient,
        );
        assert_eq!(bad.score, plain);

        let pinned = PredictionTuningConfig::default().with_feedback(FeedbackAdjustment {
            min_score: 0.5,
            max_score: 0.5,
            ..FeedbackAdjustment::default()
        });
        assert_eq!(calculate_confidence(&base, &pinned).score, 0.5);
    }

    #[test]
    fn empty_history_is_low_reliability() {
        let m = calculate_confidence(
            &ConfidenceInput {
                item_id: ItemId::new(),
                kind: PredictionKind::WasteRisk,
                events: &[],
                item_created_at: as_of(),
                feedback_scores: &[],
                as_of: as_of(),
            },
            &PredictionTuningConfig::default(),
        );
        assert_eq!(m.reliability, Reliability::Low);
        assert_eq!(m.data_points, 0);
        assert_eq!(m.reasoning.len(), 6);
        assert!(m.score >= 0.05);
    }

    #[test]
    fn reliability_buckets() {
        assert_eq!(Reliability::from_score(0.7), Reliability::High);
        assert_eq!(Reliability::from_score(0.4), Reliability::Medium);
        assert_eq!(Reliability::from_score(0.39), Reliability::Low);
    }

    fn arb_event(item: ItemId) -> impl Strategy<Value = ChangeEvent> {
        (
            0i64..90,
            0u32..2000,
            0u32..2000,
            prop_oneof![
                Just(ChangeType::Usage),
                Just(ChangeType::Restock),
                Just(ChangeType::Waste),
                Just(ChangeType::Adjustment)
            ],
        )
            .prop_map(move |(days_ago, before, after, kind)| {
                ev(item, days_ago, before, after, kind)
            })
    }

    proptest! {
        #[test]
        fn score_is_always_clamped(
            events in proptest::collection::vec(arb_event(ItemId::new()), 0..60),
            feedback in proptest::collection::vec(-1i8..=1, 0..10),
            age_days in 0i64..400,
        ) {
            let m = calculate_confidence(
                &ConfidenceInput {
                    item_id: ItemId::new(),
                    kind: PredictionKind::Reorder,
                    events: &events,
                    item_created_at: as_of() - Duration::days(age_days),
                    feedback_scores: &feedback,
                    as_of: as_of(),
                },
                &PredictionTuningConfig::default(),
            );
            prop_assert!((0.05..=0.95).contains(&m.score));
            prop_assert_eq!(m.data_points, events.len());
        }

        #[test]
        fn more_valid_data_never_lowers_data_quality(
            events in proptest::collection::vec(arb_event(ItemId::new()), 0..40),
            extra in 1usize..30,
        ) {
            let item = ItemId::new();
            let before = data_quality(&events, 1000);
            let mut more = events.clone();
            more.extend((0..extra).map(|i| ev(item, (i % 90) as i64, 100, 90, ChangeType::Usage)));
            prop_assert!(data_quality(&more, 1000) + 1e-12 >= before);
        }
    }
}
