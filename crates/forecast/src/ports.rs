//! Capabilities the engine consumes from the surrounding application.
//!
//! The engine stays storage-agnostic: items, change events, prediction records,
//! usage counters and supplier preferences are provided through these traits.
//! Adapters own retries and timeouts; the engine never retries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::{ItemId, OrganizationId, PredictionId};
use stockcast_inventory::{ChangeEvent, Item};

use crate::error::ForecastError;
use crate::ordering::SupplierPreferences;
use crate::prediction::{Prediction, PredictionKind};

/// User feedback on an actioned recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Helpful,
    NotHelpful,
}

impl Feedback {
    /// Stored score: helpful 1, no feedback 0, not helpful -1.
    pub fn score(feedback: Option<Feedback>) -> i8 {
        match feedback {
            Some(Feedback::Helpful) => 1,
            None => 0,
            Some(Feedback::NotHelpful) => -1,
        }
    }
}

/// A persisted prediction. The `actioned`/`feedback_score` pair is the only
/// mutation a record ever sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: PredictionId,
    pub organization_id: OrganizationId,
    pub prediction: Prediction,
    pub actioned: bool,
    pub feedback_score: Option<i8>,
    pub actioned_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    pub fn new(organization_id: OrganizationId, prediction: Prediction) -> Self {
        Self {
            id: PredictionId::new(),
            organization_id,
            prediction,
            actioned: false,
            feedback_score: None,
            actioned_at: None,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.prediction.item_id
    }

    pub fn kind(&self) -> PredictionKind {
        self.prediction.kind()
    }

    /// Past its validity horizon (the TTL stores may use for eviction).
    pub fn is_expired(&self, as_of: DateTime<Utc>) -> bool {
        self.prediction.is_expired(as_of)
    }
}

/// Read API over items and their change log.
pub trait InventoryReader: Send + Sync {
    /// `NotFound` when the item does not exist for the organization.
    fn item(&self, org: OrganizationId, item_id: ItemId) -> Result<Item, ForecastError>;

    fn items(&self, org: OrganizationId) -> Result<Vec<Item>, ForecastError>;

    /// Events for one item at or after `since`, any order.
    fn change_events(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ChangeEvent>, ForecastError>;
}

/// Feedback on past predictions, consumed by the confidence calculator.
pub trait PredictionHistoryProvider: Send + Sync {
    /// Actioned predictions of `kind` for the item created at or after `since`.
    fn actioned_since(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        kind: PredictionKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<PredictionRecord>, ForecastError>;
}

/// Persistence of prediction records.
pub trait PredictionStore: PredictionHistoryProvider {
    fn save(&self, record: PredictionRecord) -> Result<(), ForecastError>;

    /// Most recently created, not yet actioned record of `kind` for the item.
    fn latest_open(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        kind: PredictionKind,
    ) -> Result<Option<PredictionRecord>, ForecastError>;

    fn mark_actioned(
        &self,
        org: OrganizationId,
        id: PredictionId,
        feedback_score: i8,
        actioned_at: DateTime<Utc>,
    ) -> Result<PredictionRecord, ForecastError>;
}

/// Monthly per-organization, per-feature usage counter.
pub trait FeatureUsageRecorder: Send + Sync {
    /// Upsert keyed by `(org, feature, period)`; returns the new count.
    fn increment(
        &self,
        org: OrganizationId,
        feature: &str,
        period: &str,
    ) -> Result<u64, ForecastError>;
}

/// Organization-configured supplier preferences.
pub trait SupplierPreferenceProvider: Send + Sync {
    fn preferences(&self, org: OrganizationId) -> Result<SupplierPreferences, ForecastError>;
}
