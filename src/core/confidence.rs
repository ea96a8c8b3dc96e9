use crate::models::{Metric, MetricReading};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Recency factor: `0.5^(age / half_life)`
///
/// Range: 0.0 - 1.0. Readings stamped in the future count as fresh.
#[inline]
pub fn recency_factor(last_updated: DateTime<Utc>, as_of: DateTime<Utc>, half_life_days: f64) -> f64 {
    if !half_life_days.is_finite() || half_life_days <= 0.0 {
        return 1.0;
    }

    let age_days = (as_of - last_updated).num_seconds().max(0) as f64 / SECONDS_PER_DAY;

    0.5_f64.powf(age_days / half_life_days)
}

/// Confidence = completeness × recency, clamped to [0, 1]
#[inline]
pub fn estimate(reading: &MetricReading, as_of: DateTime<Utc>, half_life_days: f64) -> f64 {
    let completeness = if reading.completeness.is_finite() {
        reading.completeness.clamp(0.0, 1.0)
    } else {
        0.0
    };

    (completeness * recency_factor(reading.last_updated, as_of, half_life_days)).clamp(0.0, 1.0)
}

/// Per-metric half-lives: configured overrides over built-in defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalfLifeTable {
    overrides: BTreeMap<Metric, f64>,
}

impl HalfLifeTable {
    pub fn new(overrides: BTreeMap<Metric, f64>) -> Self {
        Self { overrides }
    }

    pub fn half_life_days(&self, metric: Metric) -> f64 {
        self.overrides
            .get(&metric)
            .copied()
            .unwrap_or_else(|| metric.default_half_life_days())
    }

    pub fn confidence(&self, metric: Metric, reading: &MetricReading, as_of: DateTime<Utc>) -> f64 {
        estimate(reading, as_of, self.half_life_days(metric))
    }
}
