use crate::error::EngineError;
use crate::models::Dimension;
use std::collections::BTreeMap;

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 10;

/// Normalized per-dimension weights summing to 1 over the rated dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    weights: BTreeMap<Dimension, f64>,
}

impl WeightVector {
    /// Build from validated priorities. Callers guarantee the map is non-empty
    /// and every value is positive.
    pub fn from_priorities(priorities: &BTreeMap<Dimension, u8>) -> Self {
        let total: f64 = priorities.values().map(|p| *p as f64).sum();
        let weights = priorities
            .iter()
            .map(|(dim, p)| (*dim, *p as f64 / total))
            .collect();

        Self { weights }
    }

    /// Weight for a dimension; 0 when the user did not rate it
    pub fn get(&self, dimension: Dimension) -> f64 {
        self.weights.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        self.weights.iter().map(|(d, w)| (*d, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Average weight across rated dimensions
    pub fn mean_weight(&self) -> f64 {
        if self.weights.is_empty() {
            return 0.0;
        }
        self.total() / self.weights.len() as f64
    }

    /// Dense vector over every recognized dimension, for similarity comparisons
    pub fn as_dense(&self) -> Vec<f64> {
        Dimension::ALL.iter().map(|d| self.get(*d)).collect()
    }
}

/// Validate raw priorities into the closed dimension set
///
/// Rejects empty vectors, unrecognized names and values outside [1, 10].
pub fn parse_priorities(raw: &BTreeMap<String, i64>) -> Result<BTreeMap<Dimension, u8>, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::InvalidProfile("priority vector is empty".to_string()));
    }

    let mut parsed = BTreeMap::new();
    for (name, value) in raw {
        let dimension = Dimension::from_name(name).ok_or_else(|| {
            EngineError::InvalidProfile(format!("unrecognized dimension: {}", name))
        })?;

        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(value) {
            return Err(EngineError::InvalidProfile(format!(
                "priority for {} must be within [{}, {}], got {}",
                name, MIN_PRIORITY, MAX_PRIORITY, value
            )));
        }

        if parsed.insert(dimension, *value as u8).is_some() {
            return Err(EngineError::InvalidProfile(format!(
                "dimension {} is rated more than once",
                dimension
            )));
        }
    }

    Ok(parsed)
}

/// Resolve a user's priority sliders into a weight vector
///
/// Wi = priority_i / Σ priority_j. Every core dimension must be rated.
pub fn resolve_weights(raw: &BTreeMap<String, i64>) -> Result<WeightVector, EngineError> {
    let priorities = parse_priorities(raw)?;

    let missing: Vec<&str> = Dimension::CORE
        .iter()
        .filter(|d| !priorities.contains_key(d))
        .map(|d| d.name())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::InvalidProfile(format!(
            "priority vector is missing: {}",
            missing.join(", ")
        )));
    }

    Ok(WeightVector::from_priorities(&priorities))
}
