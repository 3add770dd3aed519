use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::{CategoryId, DomainError, DomainResult, ItemId, LocationId};

/// Opaque reference to a category or location, with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef<Id> {
    pub id: Id,
    pub name: Option<String>,
}

impl<Id> ItemRef<Id> {
    pub fn new(id: Id) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// Inventory item as seen by the forecasting engine (read-only snapshot).
///
/// Quantity and reorder threshold are non-negative by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_cost: f64,
    pub reorder_threshold: u32,
    pub expiration_date: Option<DateTime<Utc>>,
    pub category: Option<ItemRef<CategoryId>>,
    pub location: Option<ItemRef<LocationId>>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Create a validated item snapshot.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        quantity: u32,
        unit_cost: f64,
        reorder_threshold: u32,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if !(unit_cost.is_finite() && unit_cost >= 0.0) {
            return Err(DomainError::validation(
                "unit cost must be a finite non-negative number",
            ));
        }
        Ok(Self {
            id,
            name,
            quantity,
            unit_cost,
            reorder_threshold,
            expiration_date: None,
            category: None,
            location: None,
            created_at,
        })
    }

    pub fn with_expiration(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn with_category(mut self, category: ItemRef<CategoryId>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_location(mut self, location: ItemRef<LocationId>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn location_id(&self) -> Option<LocationId> {
        self.location.as_ref().map(|l| l.id)
    }
}
