use crate::core::confidence::HalfLifeTable;
use crate::models::{Metric, NeighborhoodRecord, NormalizedMetric, Polarity};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Value assigned when every reporting neighborhood has the same raw value
pub const NEUTRAL_VALUE: f64 = 50.0;

/// Width of the mean ± kσ window used for heavy-tailed metrics
const OUTLIER_SIGMAS: f64 = 2.0;

const DEGENERATE_SPAN: f64 = 1e-9;

/// How a metric's scaling bounds are derived from the corpus
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsStrategy {
    /// Observed minimum and maximum
    MinMax,
    /// mean ± k standard deviations, never wider than the observed range
    StdDev { k: f64 },
}

impl BoundsStrategy {
    pub fn for_metric(metric: Metric) -> Self {
        if metric.has_outliers() {
            BoundsStrategy::StdDev { k: OUTLIER_SIGMAS }
        } else {
            BoundsStrategy::MinMax
        }
    }
}

/// Corpus-wide scaling bounds for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBounds {
    pub lower: f64,
    pub upper: f64,
    pub polarity: Polarity,
}

impl MetricBounds {
    /// Map a raw value onto 0-100 where 100 is always most desirable
    #[inline]
    pub fn normalize(&self, raw: f64) -> f64 {
        let span = self.upper - self.lower;
        if span.abs() < DEGENERATE_SPAN {
            return NEUTRAL_VALUE;
        }

        let scaled = ((raw - self.lower) / span).clamp(0.0, 1.0) * 100.0;

        match self.polarity {
            Polarity::HigherIsBetter => scaled,
            Polarity::LowerIsBetter => 100.0 - scaled,
        }
    }
}

/// Compute bounds for a metric across every neighborhood that reports it
///
/// Readings with no completeness carry no data and do not move the bounds.
/// Values are sorted before aggregation so the result does not depend on
/// corpus order. Returns None when no neighborhood reports the metric.
pub fn compute_bounds(
    corpus: &[NeighborhoodRecord],
    metric: Metric,
    strategy: BoundsStrategy,
) -> Option<MetricBounds> {
    let mut values: Vec<f64> = corpus
        .iter()
        .filter_map(|record| record.reading(metric))
        .filter(|reading| reading.completeness.is_finite() && reading.completeness > 0.0)
        .map(|reading| reading.value)
        .collect();

    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let observed_min = values[0];
    let observed_max = values[values.len() - 1];

    let (lower, upper) = match strategy {
        BoundsStrategy::MinMax => (observed_min, observed_max),
        BoundsStrategy::StdDev { k } => {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let sigma = variance.sqrt();
            (
                (mean - k * sigma).max(observed_min),
                (mean + k * sigma).min(observed_max),
            )
        }
    };

    Some(MetricBounds {
        lower,
        upper,
        polarity: metric.polarity(),
    })
}

/// Read-only bounds for every metric present in a corpus snapshot
///
/// Built once per scoring run before any parallel work starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationTable {
    bounds: BTreeMap<Metric, MetricBounds>,
}

impl NormalizationTable {
    pub fn from_corpus(corpus: &[NeighborhoodRecord]) -> Self {
        let bounds = Metric::ALL
            .into_iter()
            .filter_map(|metric| {
                compute_bounds(corpus, metric, BoundsStrategy::for_metric(metric))
                    .map(|b| (metric, b))
            })
            .collect();

        Self { bounds }
    }

    pub fn bounds(&self, metric: Metric) -> Option<&MetricBounds> {
        self.bounds.get(&metric)
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Normalized value of one metric, or None when the record does not report it
    pub fn normalize(&self, record: &NeighborhoodRecord, metric: Metric) -> Option<f64> {
        let reading = record.reading(metric)?;
        let bounds = self.bounds.get(&metric)?;
        Some(bounds.normalize(reading.value))
    }

    /// Every metric the record reports, rescaled and paired with its confidence
    pub fn normalize_record(
        &self,
        record: &NeighborhoodRecord,
        half_lives: &HalfLifeTable,
        as_of: DateTime<Utc>,
    ) -> BTreeMap<Metric, NormalizedMetric> {
        record
            .metrics
            .iter()
            .filter_map(|(metric, reading)| {
                let value = self.normalize(record, *metric)?;
                let confidence = half_lives.confidence(*metric, reading, as_of);
                Some((*metric, NormalizedMetric { value, confidence }))
            })
            .collect()
    }
}
