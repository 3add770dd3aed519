//! Small deterministic statistics helpers shared by the analyzers.

use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

/// Population standard deviation (n), deterministic.
pub(crate) fn stddev_population(xs: &[f64], mean: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let var = xs
        .iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / (xs.len() as f64);
    var.sqrt()
}

/// Coefficient of variation (stddev / mean). `None` when the mean is not positive.
pub(crate) fn coefficient_of_variation(xs: &[f64]) -> Option<f64> {
    let m = mean(xs);
    if xs.is_empty() || m <= 0.0 {
        return None;
    }
    Some(stddev_population(xs, m) / m)
}

/// Fractional days from `from` to `to` (negative if `to` is earlier).
pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Round to 2 decimal places (currency, scores).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn population_stddev_of_constant_series_is_zero() {
        let xs = [2.0, 2.0, 2.0];
        assert_eq!(stddev_population(&xs, mean(&xs)), 0.0);
    }

    #[test]
    fn population_stddev_uses_n() {
        let xs = [1.0, 3.0];
        assert!((stddev_population(&xs, mean(&xs)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cv_is_none_for_non_positive_mean() {
        assert_eq!(coefficient_of_variation(&[]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }

    #[test]
    fn days_between_is_fractional() {
        let t = Utc::now();
        assert!((days_between(t, t + Duration::hours(36)) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(12.344), 12.34);
    }
}
