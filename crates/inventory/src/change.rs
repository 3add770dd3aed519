use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::ItemId;

/// Why an item's on-hand quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Stock consumed.
    Usage,
    /// Stock replenished.
    Restock,
    /// Stock disposed of (expired, spoiled), not consumed.
    Waste,
    /// Manual correction (stock count, shrinkage).
    Adjustment,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Usage => "usage",
            ChangeType::Restock => "restock",
            ChangeType::Waste => "waste",
            ChangeType::Adjustment => "adjustment",
        }
    }
}

/// Immutable, append-only record of a quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub item_id: ItemId,
    pub quantity_before: u32,
    pub quantity_after: u32,
    pub change_type: ChangeType,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(
        item_id: ItemId,
        quantity_before: u32,
        quantity_after: u32,
        change_type: ChangeType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            quantity_before,
            quantity_after,
            change_type,
            occurred_at,
        }
    }

    pub fn is_usage(&self) -> bool {
        self.change_type == ChangeType::Usage
    }

    pub fn is_restock(&self) -> bool {
        self.change_type == ChangeType::Restock
    }

    /// Units consumed: `max(0, before - after)`.
    pub fn usage_amount(&self) -> u32 {
        self.quantity_before.saturating_sub(self.quantity_after)
    }

    /// Units received: `max(0, after - before)`.
    pub fn restock_amount(&self) -> u32 {
        self.quantity_after.saturating_sub(self.quantity_before)
    }

    /// Absolute quantity delta, regardless of direction.
    pub fn magnitude(&self) -> u32 {
        self.quantity_before.abs_diff(self.quantity_after)
    }

    /// A delta of zero or above `max_delta` is treated as a data-entry error.
    pub fn is_plausible(&self, max_delta: u32) -> bool {
        let m = self.magnitude();
        m > 0 && m <= max_delta
    }
}
