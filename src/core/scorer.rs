use crate::core::{confidence::HalfLifeTable, normalizer::NormalizationTable, weighting::WeightVector};
use crate::error::EngineError;
use crate::models::{Dimension, DimensionContribution, Metric, NeighborhoodRecord};
use chrono::{DateTime, Utc};

/// Intermediate per-neighborhood score, before boosting and explanation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub neighborhood_id: String,
    pub name: String,
    pub city: String,
    /// Coverage-normalized weighted score, 0-100
    pub base_score: f64,
    pub boost: f64,
    /// base_score + boost, clamped to 0-100
    pub score: f64,
    /// Ordered by contribution descending
    pub contributions: Vec<DimensionContribution>,
    /// Weighted dimensions with no usable data
    pub uncovered: Vec<Dimension>,
    /// Mean confidence across scored dimensions
    pub mean_confidence: f64,
    /// Most recent update among scored metrics
    pub latest_update: DateTime<Utc>,
    pub median_rent: Option<f64>,
}

impl ScoreCard {
    pub fn apply_boost(&mut self, boost: f64) {
        self.boost = boost.max(0.0);
        self.score = (self.base_score + self.boost).clamp(0.0, 100.0);
    }
}

/// Confidence-weighted, coverage-normalized scorer
///
/// Borrows the run's read-only normalization snapshot, so one scorer can be
/// shared across worker threads.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    table: &'a NormalizationTable,
    half_lives: &'a HalfLifeTable,
    as_of: DateTime<Utc>,
}

impl<'a> Scorer<'a> {
    pub fn new(table: &'a NormalizationTable, half_lives: &'a HalfLifeTable, as_of: DateTime<Utc>) -> Self {
        Self { table, half_lives, as_of }
    }

    /// Score one neighborhood against the user's weights
    ///
    /// score = Σ(Wi × Ni × Ci) / Σ(Wi over scored dimensions)
    ///
    /// Dimensions without a normalized value, or with zero confidence, drop
    /// out of both sums. Fails with InsufficientData when nothing is left.
    pub fn score(
        &self,
        record: &NeighborhoodRecord,
        weights: &WeightVector,
    ) -> Result<ScoreCard, EngineError> {
        let mut contributions = Vec::with_capacity(weights.len());
        let mut uncovered = Vec::new();
        let mut weighted_sum = 0.0;
        let mut scored_weight = 0.0;
        let mut confidence_sum = 0.0;
        let mut latest_update: Option<DateTime<Utc>> = None;

        let normalized = self.table.normalize_record(record, self.half_lives, self.as_of);

        for (dimension, weight) in weights.iter() {
            if weight <= 0.0 {
                continue;
            }

            let metric = dimension.metric();
            let usable = normalized
                .get(&metric)
                .filter(|n| n.confidence > 0.0)
                .zip(record.reading(metric))
                .map(|(n, reading)| (n.value, n.confidence, reading.last_updated));

            let Some((value, confidence, updated)) = usable else {
                uncovered.push(dimension);
                continue;
            };

            let contribution = weight * value * confidence;
            weighted_sum += contribution;
            scored_weight += weight;
            confidence_sum += confidence;
            latest_update = Some(latest_update.map_or(updated, |t| t.max(updated)));

            contributions.push(DimensionContribution {
                dimension,
                weight,
                normalized_value: value,
                confidence,
                contribution,
            });
        }

        let Some(latest_update) = latest_update else {
            return Err(EngineError::InsufficientData {
                neighborhood_id: record.id.clone(),
            });
        };

        let base_score = (weighted_sum / scored_weight).clamp(0.0, 100.0);
        let mean_confidence = confidence_sum / contributions.len() as f64;

        contributions.sort_by(|a, b| {
            b.contribution
                .total_cmp(&a.contribution)
                .then_with(|| a.dimension.cmp(&b.dimension))
        });

        Ok(ScoreCard {
            neighborhood_id: record.id.clone(),
            name: record.name.clone(),
            city: record.city.clone(),
            base_score,
            boost: 0.0,
            score: base_score,
            contributions,
            uncovered,
            mean_confidence,
            latest_update,
            median_rent: record.reading(Metric::MedianRent).map(|r| r.value),
        })
    }
}
