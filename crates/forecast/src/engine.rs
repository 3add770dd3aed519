//! Organization-level entry points: pattern lookup, recommendation
//! generation, feedback and supplier quotes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stockcast_core::{DomainError, ItemId, LocationId, OrganizationId, UserId};
use stockcast_inventory::{ChangeEvent, Item};

use crate::batch::run_batched;
use crate::confidence::{ConfidenceCalculator, ConfidenceMetrics};
use crate::error::ForecastError;
use crate::ordering::{OrderingOption, SupplierDirectory, rank_ordering_options};
use crate::pattern::{UsagePattern, analyze_events};
use crate::ports::{
    FeatureUsageRecorder, Feedback, InventoryReader, PredictionHistoryProvider, PredictionRecord,
    PredictionStore, SupplierPreferenceProvider,
};
use crate::prediction::{
    Prediction, PredictionKind, generate_demand_forecast, generate_reorder_prediction,
    generate_threshold_optimization, generate_waste_risk_prediction,
};
use crate::recommendation::{
    FeatureFlags, Recommendation, RecommendationKind, RecommendationReport, UsageCandidate,
    rank_recommendations, reorder_recommendation, summarize, threshold_recommendation,
    usage_optimization_recommendations, waste_recommendation,
};
use crate::tuning::PredictionTuningConfig;

/// Feature key under which actioned recommendations are counted.
pub const RECOMMENDATIONS_FEATURE: &str = "ai_recommendations";

/// What the user did with a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
    Accepted,
    Dismissed,
}

impl RecommendationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationAction::Accepted => "accepted",
            RecommendationAction::Dismissed => "dismissed",
        }
    }
}

/// Per-item output of one generation pass.
struct ItemAnalysis {
    pattern: UsagePattern,
    demand: Prediction,
    /// Confidence window of events, kept for later reliability scoring.
    events: Vec<ChangeEvent>,
    recommendations: Vec<Recommendation>,
}

pub struct ForecastEngine {
    inventory: Arc<dyn InventoryReader>,
    predictions: Arc<dyn PredictionStore>,
    history: Arc<dyn PredictionHistoryProvider>,
    usage: Arc<dyn FeatureUsageRecorder>,
    suppliers: Arc<dyn SupplierPreferenceProvider>,
    confidence: ConfidenceCalculator,
    directory: SupplierDirectory,
    tuning: PredictionTuningConfig,
}

impl ForecastEngine {
    pub fn new<I, S, U, P>(
        inventory: Arc<I>,
        predictions: Arc<S>,
        usage: Arc<U>,
        suppliers: Arc<P>,
    ) -> Self
    where
        I: InventoryReader + 'static,
        S: PredictionStore + 'static,
        U: FeatureUsageRecorder + 'static,
        P: SupplierPreferenceProvider + 'static,
    {
        let inventory: Arc<dyn InventoryReader> = inventory;
        let history: Arc<dyn PredictionHistoryProvider> = predictions.clone();
        let tuning = PredictionTuningConfig::default();
        Self {
            confidence: ConfidenceCalculator::new(
                inventory.clone(),
                history.clone(),
                tuning.clone(),
            ),
            inventory,
            predictions,
            history,
            usage,
            suppliers,
            directory: SupplierDirectory::default(),
            tuning,
        }
    }

    pub fn with_tuning(mut self, tuning: PredictionTuningConfig) -> Self {
        self.confidence =
            ConfidenceCalculator::new(self.inventory.clone(), self.history.clone(), tuning.clone());
        self.tuning = tuning;
        self
    }

    pub fn with_directory(mut self, directory: SupplierDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn tuning(&self) -> &PredictionTuningConfig {
        &self.tuning
    }

    /// Usage pattern of one item over the trailing `window_days`.
    pub fn analyze_usage_pattern(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        window_days: i64,
        as_of: DateTime<Utc>,
    ) -> Result<UsagePattern, ForecastError> {
        let since = Duration::try_days(window_days)
            .filter(|_| window_days > 0)
            .and_then(|window| as_of.checked_sub_signed(window))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "window_days must be a positive day count, got {window_days}"
                ))
            })?;
        // Surfaces NotFound before reading the log.
        self.inventory.item(org, item_id)?;
        let events: Vec<ChangeEvent> = self
            .inventory
            .change_events(org, item_id, since)?
            .into_iter()
            .filter(|e| e.occurred_at <= as_of)
            .collect();
        Ok(analyze_events(&events, as_of, &self.tuning))
    }

    pub fn calculate_item_confidence(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        kind: PredictionKind,
        as_of: DateTime<Utc>,
    ) -> Result<ConfidenceMetrics, ForecastError> {
        self.confidence.calculate_item_confidence(org, item_id, kind, as_of)
    }

    pub fn calculate_batch_confidence(
        &self,
        org: OrganizationId,
        item_ids: &[ItemId],
        kind: PredictionKind,
        as_of: DateTime<Utc>,
    ) -> HashMap<ItemId, ConfidenceMetrics> {
        self.confidence.calculate_batch_confidence(org, item_ids, kind, as_of)
    }

    /// Analyze every item of the organization and return the ranked report.
    ///
    /// Items whose analysis fails are logged and left out.
    pub fn generate_recommendations(
        &self,
        org: OrganizationId,
        flags: FeatureFlags,
        as_of: DateTime<Utc>,
    ) -> Result<RecommendationReport, ForecastError> {
        let items = self.inventory.items(org)?;
        let results = run_batched(&items, self.tuning.batch_size, |item| {
            self.analyze_item(org, item, flags, as_of)
        });

        let mut analyzed: Vec<(&Item, ItemAnalysis)> = Vec::with_capacity(items.len());
        for (item, result) in items.iter().zip(results) {
            match result {
                Ok(analysis) => analyzed.push((item, analysis)),
                Err(e) => {
                    warn!(org = %org, item = %item.id, error = %e, "item analysis failed; item omitted");
                }
            }
        }

        let mut recommendations: Vec<Recommendation> = analyzed
            .iter_mut()
            .flat_map(|(_, a)| std::mem::take(&mut a.recommendations))
            .collect();

        if flags.allows(RecommendationKind::UsageOptimization) {
            recommendations.extend(self.usage_optimizations(org, &analyzed, as_of));
        }

        let recommendations =
            rank_recommendations(recommendations, self.tuning.max_recommendations);
        let summary = summarize(&recommendations);
        info!(
            org = %org,
            items = items.len(),
            analyzed = analyzed.len(),
            recommendations = summary.total_recommendations,
            high_priority = summary.high_priority_count,
            "recommendations generated"
        );
        Ok(RecommendationReport {
            recommendations,
            summary,
        })
    }

    /// Recommendations for one user, optionally narrowed to a location.
    ///
    /// Items without a location are visible from every location.
    pub fn get_personalized_recommendations(
        &self,
        org: OrganizationId,
        user: UserId,
        location: Option<LocationId>,
        flags: FeatureFlags,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, ForecastError> {
        let report = self.generate_recommendations(org, flags, as_of)?;
        let recs: Vec<Recommendation> = report
            .recommendations
            .into_iter()
            .filter(|r| match (location, r.location_id) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .filter(|r| flags.allows(r.kind))
            .take(self.tuning.max_personalized_recommendations)
            .collect();
        debug!(org = %org, user = %user, count = recs.len(), "personalized recommendations");
        Ok(recs)
    }

    /// Record the user's response to a recommendation against the prediction
    /// behind it, and count the interaction for the month.
    pub fn mark_recommendation_actioned(
        &self,
        org: OrganizationId,
        recommendation_id: &str,
        action: RecommendationAction,
        feedback: Option<Feedback>,
        as_of: DateTime<Utc>,
    ) -> Result<(), ForecastError> {
        let (kind, item_id) = Recommendation::parse_id(recommendation_id)?;
        let prediction_kind = kind.prediction_kind();

        let record = self
            .predictions
            .latest_open(org, item_id, prediction_kind)?
            .ok_or_else(|| {
                ForecastError::not_found(format!(
                    "open {prediction_kind} prediction for item {item_id}"
                ))
            })?;
        self.predictions
            .mark_actioned(org, record.id, Feedback::score(feedback), as_of)?;

        let period = as_of.format("%Y-%m").to_string();
        let count = self.usage.increment(org, RECOMMENDATIONS_FEATURE, &period)?;
        info!(
            org = %org,
            recommendation = recommendation_id,
            prediction = %record.id,
            action = action.as_str(),
            period = %period,
            count,
            "recommendation actioned"
        );
        Ok(())
    }

    /// Supplier quotes for ordering `quantity` units of `item`.
    pub fn get_ordering_options(
        &self,
        org: OrganizationId,
        item: &Item,
        quantity: u32,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<OrderingOption>, ForecastError> {
        let preferences = self.suppliers.preferences(org)?;
        Ok(rank_ordering_options(
            item,
            quantity,
            &self.directory,
            &preferences,
            &self.tuning,
            as_of,
        ))
    }

    fn analyze_item(
        &self,
        org: OrganizationId,
        item: &Item,
        flags: FeatureFlags,
        as_of: DateTime<Utc>,
    ) -> Result<ItemAnalysis, ForecastError> {
        let window = self.tuning.confidence_window().max(self.tuning.pattern_window());
        let events: Vec<ChangeEvent> = self
            .inventory
            .change_events(org, item.id, as_of - window)?
            .into_iter()
            .filter(|e| e.occurred_at <= as_of)
            .collect();

        let pattern_since = as_of - self.tuning.pattern_window();
        let pattern_events: Vec<ChangeEvent> = events
            .iter()
            .filter(|e| e.occurred_at >= pattern_since)
            .cloned()
            .collect();
        let pattern = analyze_events(&pattern_events, as_of, &self.tuning);

        let confidence_since = as_of - self.tuning.confidence_window();
        let events: Vec<ChangeEvent> = events
            .into_iter()
            .filter(|e| e.occurred_at >= confidence_since)
            .collect();

        let mut recommendations = Vec::new();

        if flags.allows(RecommendationKind::Reorder) {
            let prediction = generate_reorder_prediction(item, &pattern, &self.tuning, as_of);
            self.persist(org, &prediction);
            if let Some(rec) = reorder_recommendation(item, &prediction, &self.tuning) {
                recommendations.push(rec);
            }
        }

        let waste = generate_waste_risk_prediction(item, &pattern, &self.tuning, as_of);
        self.persist(org, &waste);
        if let Some(rec) = waste_recommendation(item, &waste, &self.tuning) {
            recommendations.push(rec);
        }

        if flags.allows(RecommendationKind::ThresholdOptimization) {
            let prediction = generate_threshold_optimization(item, &pattern, &self.tuning, as_of);
            self.persist(org, &prediction);
            if let Some(rec) = threshold_recommendation(item, &prediction, &self.tuning) {
                recommendations.push(rec);
            }
        }

        let demand = generate_demand_forecast(item, &pattern, &self.tuning, as_of);
        self.persist(org, &demand);

        for rec in &mut recommendations {
            let metrics = self.confidence.score_events(
                org,
                item.id,
                item.created_at,
                &events,
                rec.kind.prediction_kind(),
                as_of,
            )?;
            rec.metadata.reliability = Some(metrics.reliability);
        }

        debug!(
            org = %org,
            item = %item.id,
            avg_daily_usage = pattern.average_daily_usage,
            recommendations = recommendations.len(),
            "item analyzed"
        );
        Ok(ItemAnalysis {
            pattern,
            demand,
            events,
            recommendations,
        })
    }

    fn usage_optimizations(
        &self,
        org: OrganizationId,
        analyzed: &[(&Item, ItemAnalysis)],
        as_of: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let candidates: Vec<UsageCandidate<'_>> = analyzed
            .iter()
            .map(|(item, a)| UsageCandidate {
                item: *item,
                pattern: &a.pattern,
                demand: &a.demand,
            })
            .collect();
        let mut recs = usage_optimization_recommendations(&candidates, &self.tuning);

        for rec in &mut recs {
            let Some((item, a)) = analyzed.iter().find(|(item, _)| item.id == rec.item_id) else {
                continue;
            };
            match self.confidence.score_events(
                org,
                item.id,
                item.created_at,
                &a.events,
                PredictionKind::DemandForecast,
                as_of,
            ) {
                Ok(metrics) => rec.metadata.reliability = Some(metrics.reliability),
                Err(e) => {
                    warn!(org = %org, item = %item.id, error = %e, "reliability scoring failed");
                }
            }
        }
        recs
    }

    /// Store failures are logged; the in-memory prediction is still used.
    fn persist(&self, org: OrganizationId, prediction: &Prediction) {
        let record = PredictionRecord::new(org, prediction.clone());
        if let Err(e) = self.predictions.save(record) {
            warn!(
                org = %org,
                item = %prediction.item_id,
                kind = %prediction.kind(),
                error = %e,
                "failed to save prediction"
            );
        }
    }
}
