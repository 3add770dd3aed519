use chrono::{DateTime, Utc};
use tracing::debug;

use stockcast_core::{DomainError, ItemId, OrganizationId, PredictionId};
use stockcast_forecast::{
    ForecastError, PredictionHistoryProvider, PredictionKind, PredictionRecord, PredictionStore,
};

use crate::read_model::{InMemoryOrgStore, OrgStore};

/// In-memory prediction records.
///
/// Saving a prediction replaces the open record of the same item and kind, so
/// at most one open record exists per pair. Actioned records are kept as
/// feedback history.
#[derive(Debug, Default)]
pub struct InMemoryPredictionStore {
    records: InMemoryOrgStore<PredictionId, PredictionRecord>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, org: OrganizationId, id: PredictionId) -> Option<PredictionRecord> {
        self.records.get(org, &id)
    }

    pub fn list(&self, org: OrganizationId) -> Vec<PredictionRecord> {
        self.records.list(org)
    }

    /// Evict open records past their validity horizon.
    pub fn purge_expired(&self, as_of: DateTime<Utc>) -> usize {
        let removed = self.records.remove_where(|r| !r.actioned && r.is_expired(as_of));
        debug!(removed, "expired predictions purged");
        removed
    }
}

impl PredictionHistoryProvider for InMemoryPredictionStore {
    fn actioned_since(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        kind: PredictionKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<PredictionRecord>, ForecastError> {
        Ok(self
            .records
            .list(org)
            .into_iter()
            .filter(|r| {
                r.actioned
                    && r.item_id() == item_id
                    && r.kind() == kind
                    && r.prediction.created_at >= since
            })
            .collect())
    }
}

impl PredictionStore for InMemoryPredictionStore {
    fn save(&self, record: PredictionRecord) -> Result<(), ForecastError> {
        let (org, item_id, kind) = (record.organization_id, record.item_id(), record.kind());
        let superseded = self.records.remove_where(|r| {
            !r.actioned && r.organization_id == org && r.item_id() == item_id && r.kind() == kind
        });
        if superseded > 0 {
            debug!(
                org = %org,
                item = %item_id,
                kind = %kind,
                superseded,
                "open prediction replaced"
            );
        }
        self.records.upsert(org, record.id, record);
        Ok(())
    }

    fn latest_open(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        kind: PredictionKind,
    ) -> Result<Option<PredictionRecord>, ForecastError> {
        // Ids are v7 UUIDs, so they break ties between same-instant records.
        Ok(self
            .records
            .list(org)
            .into_iter()
            .filter(|r| !r.actioned && r.item_id() == item_id && r.kind() == kind)
            .max_by_key(|r| (r.prediction.created_at, r.id)))
    }

    fn mark_actioned(
        &self,
        org: OrganizationId,
        id: PredictionId,
        feedback_score: i8,
        actioned_at: DateTime<Utc>,
    ) -> Result<PredictionRecord, ForecastError> {
        self.records
            .update(org, id, |r| {
                if r.actioned {
                    return Err(ForecastError::from(DomainError::conflict(format!(
                        "prediction {id} already actioned"
                    ))));
                }
                r.actioned = true;
                r.feedback_score = Some(feedback_score);
                r.actioned_at = Some(actioned_at);
                Ok(r.clone())
            })
            .ok_or_else(|| ForecastError::not_found(format!("prediction {id}")))?
    }
}
