use chrono::{DateTime, Utc};

use stockcast_core::{ItemId, OrganizationId};
use stockcast_forecast::{ForecastError, InventoryReader};
use stockcast_inventory::{ChangeEvent, Item};

use crate::read_model::{InMemoryOrgStore, OrgStore};

/// In-memory items and change log, one partition per organization.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    items: InMemoryOrgStore<ItemId, Item>,
    events: InMemoryOrgStore<ItemId, Vec<ChangeEvent>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_item(&self, org: OrganizationId, item: Item) {
        self.items.upsert(org, item.id, item);
    }

    /// Append one event to the item's log.
    pub fn record_event(&self, org: OrganizationId, event: ChangeEvent) {
        self.events.upsert_with(org, event.item_id, |log| log.push(event));
    }

    pub fn record_events(
        &self,
        org: OrganizationId,
        events: impl IntoIterator<Item = ChangeEvent>,
    ) {
        for event in events {
            self.record_event(org, event);
        }
    }
}

impl InventoryReader for InMemoryInventory {
    fn item(&self, org: OrganizationId, item_id: ItemId) -> Result<Item, ForecastError> {
        self.items
            .get(org, &item_id)
            .ok_or_else(|| ForecastError::not_found(format!("item {item_id}")))
    }

    fn items(&self, org: OrganizationId) -> Result<Vec<Item>, ForecastError> {
        let mut items = self.items.list(org);
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    fn change_events(
        &self,
        org: OrganizationId,
        item_id: ItemId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ChangeEvent>, ForecastError> {
        Ok(self
            .events
            .get(org, &item_id)
            .unwrap_or_default()
            .into_iter()
            .filter(|e| e.occurred_at >= since)
            .collect())
    }
}
