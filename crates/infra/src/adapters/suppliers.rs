use stockcast_core::OrganizationId;
use stockcast_forecast::{ForecastError, SupplierPreferenceProvider, SupplierPreferences};

use crate::read_model::{InMemoryOrgStore, OrgStore};

/// Supplier preferences per organization; organizations without an entry
/// get empty preferences.
#[derive(Debug, Default)]
pub struct InMemorySupplierPreferences {
    preferences: InMemoryOrgStore<(), SupplierPreferences>,
}

impl InMemorySupplierPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, org: OrganizationId, preferences: SupplierPreferences) {
        self.preferences.upsert(org, (), preferences);
    }
}

impl SupplierPreferenceProvider for InMemorySupplierPreferences {
    fn preferences(&self, org: OrganizationId) -> Result<SupplierPreferences, ForecastError> {
        Ok(self.preferences.get(org, &()).unwrap_or_default())
    }
}
