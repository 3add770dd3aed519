use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_inventory::ChangeEvent;

use crate::stats::{days_between, mean, stddev_population};
use crate::tuning::{ExpirationRiskCurve, PredictionTuningConfig};

/// Usage summary of one item over a trailing window.
///
/// Derived and ephemeral: recomputed on every call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePattern {
    pub average_daily_usage: f64,
    /// Standard deviation of per-interval daily usage rates.
    pub usage_variance: f64,
    /// Whole days since the last restock (`NO_RESTOCK_DAYS` if none observed).
    pub last_restock_days: u32,
    pub expiration_risk_score: f64,
    /// Reserved for a seasonal model; always 0 for now.
    pub seasonal_trend: f64,
}

impl UsagePattern {
    pub const NO_RESTOCK_DAYS: u32 = 999;

    /// Pattern returned when the window holds fewer than 2 events.
    pub fn insufficient_data() -> Self {
        Self {
            average_daily_usage: 0.0,
            usage_variance: 0.0,
            last_restock_days: Self::NO_RESTOCK_DAYS,
            expiration_risk_score: 0.5,
            seasonal_trend: 0.0,
        }
    }

    pub fn has_usage(&self) -> bool {
        self.average_daily_usage > 0.0
    }
}

/// Aggregate a window of change events into a [`UsagePattern`].
///
/// `events` is the window ending at `as_of`; ordering is not assumed. Events
/// with an implausible delta (zero, or above `max_plausible_delta`) are left
/// out of every aggregate.
pub fn analyze_events(
    events: &[ChangeEvent],
    as_of: DateTime<Utc>,
    tuning: &PredictionTuningConfig,
) -> UsagePattern {
    if events.len() < 2 {
        return UsagePattern::insufficient_data();
    }

    let mut window: Vec<&ChangeEvent> = events
        .iter()
        .filter(|e| e.is_plausible(tuning.max_plausible_delta))
        .collect();
    window.sort_by_key(|e| e.occurred_at);

    let usage: Vec<&ChangeEvent> = window.iter().copied().filter(|e| e.is_usage()).collect();
    let total_usage: f64 = usage.iter().map(|e| f64::from(e.usage_amount())).sum();

    let days_covered = match window.first() {
        Some(first) => days_between(first.occurred_at, as_of).max(1.0),
        None => 1.0,
    };
    let average_daily_usage = total_usage / days_covered;

    let rates: Vec<f64> = usage
        .windows(2)
        .map(|pair| {
            let gap = days_between(pair[0].occurred_at, pair[1].occurred_at).max(1.0);
            f64::from(pair[0].usage_amount()) / gap
        })
        .collect();
    let usage_variance = if rates.len() < 2 {
        0.0
    } else {
        stddev_population(&rates, mean(&rates))
    };

    let last_restock_days = window
        .iter()
        .rev()
        .find(|e| e.is_restock())
        .map(|e| {
            let days = (as_of - e.occurred_at).num_days().max(0);
            u32::try_from(days)
                .unwrap_or(UsagePattern::NO_RESTOCK_DAYS)
                .min(UsagePattern::NO_RESTOCK_DAYS)
        })
        .unwrap_or(UsagePattern::NO_RESTOCK_DAYS);

    UsagePattern {
        average_daily_usage,
        usage_variance,
        last_restock_days,
        expiration_risk_score: expiration_risk_score(average_daily_usage, &tuning.expiration_risk),
        seasonal_trend: 0.0,
    }
}

/// Placeholder heuristic: slow movers carry more expiration risk.
pub fn expiration_risk_score(average_daily_usage: f64, curve: &ExpirationRiskCurve) -> f64 {
    if average_daily_usage <= 0.0 {
        curve.no_usage
    } else if average_daily_usage > curve.fast_mover_usage {
        curve.floor
    } else {
        let share = average_daily_usage / curve.fast_mover_usage;
        (curve.no_usage - share * curve.slope).max(curve.floor)
    }
}
