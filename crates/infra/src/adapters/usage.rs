use stockcast_core::OrganizationId;
use stockcast_forecast::{FeatureUsageRecorder, ForecastError};

use crate::read_model::{InMemoryOrgStore, OrgStore};

/// Monthly feature-usage counters keyed by `(feature, period)`.
#[derive(Debug, Default)]
pub struct InMemoryFeatureUsage {
    counters: InMemoryOrgStore<(String, String), u64>,
}

impl InMemoryFeatureUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, org: OrganizationId, feature: &str, period: &str) -> u64 {
        self.counters
            .get(org, &(feature.to_string(), period.to_string()))
            .unwrap_or(0)
    }
}

impl FeatureUsageRecorder for InMemoryFeatureUsage {
    fn increment(
        &self,
        org: OrganizationId,
        feature: &str,
        period: &str,
    ) -> Result<u64, ForecastError> {
        self.counters
            .upsert_with(org, (feature.to_string(), period.to_string()), |n| {
                *n += 1;
                *n
            })
            .ok_or_else(|| ForecastError::store("feature usage counters unavailable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_org_feature_and_month() {
        let usage = InMemoryFeatureUsage::new();
        let (a, b) = (OrganizationId::new(), OrganizationId::new());
        assert_eq!(usage.increment(a, "ai_recommendations", "2026-03").unwrap(), 1);
        assert_eq!(usage.increment(a, "ai_recommendations", "2026-03").unwrap(), 2);
        usage.increment(a, "ai_recommendations", "2026-04").unwrap();
        usage.increment(b, "ai_recommendations", "2026-03").unwrap();

        assert_eq!(usage.count(a, "ai_recommendations", "2026-03"), 2);
        assert_eq!(usage.count(a, "ai_recommendations", "2026-04"), 1);
        assert_eq!(usage.count(b, "ai_recommendations", "2026-03"), 1);
        assert_eq!(usage.count(b, "exports", "2026-03"), 0);
    }
}
