use crate::core::weighting::{parse_priorities, WeightVector};
use crate::models::PeerProfile;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Ratings at or above this value (1-5 scale) count as engagement
pub const HIGH_RATING: u8 = 4;

/// Per-run collaborative signal: neighborhood id -> engagement in [0, 1]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoostTable {
    engagement: BTreeMap<String, f64>,
    max_fraction: f64,
    similar_profiles: usize,
}

impl BoostTable {
    /// Table that boosts nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(engagement: BTreeMap<String, f64>, max_fraction: f64, similar_profiles: usize) -> Self {
        Self {
            engagement,
            max_fraction,
            similar_profiles,
        }
    }

    /// Boost for a neighborhood, capped at `max_fraction` of its base score
    pub fn boost_for(&self, neighborhood_id: &str, base_score: f64) -> f64 {
        match self.engagement.get(neighborhood_id) {
            Some(engagement) => self.max_fraction * base_score * engagement.clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    pub fn engagement(&self, neighborhood_id: &str) -> Option<f64> {
        self.engagement.get(neighborhood_id).copied()
    }

    pub fn similar_profiles(&self) -> usize {
        self.similar_profiles
    }

    pub fn is_empty(&self) -> bool {
        self.engagement.is_empty()
    }
}

/// Secondary scoring signal derived from other users
///
/// Implementations must be pure: the same weights and peers always produce
/// the same table.
pub trait CollaborativeBooster: Send + Sync + Debug {
    fn prepare(&self, weights: &WeightVector, peers: &[PeerProfile]) -> BoostTable;
}

/// Booster used when the collaborative signal is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBoost;

impl CollaborativeBooster for NoBoost {
    fn prepare(&self, _weights: &WeightVector, _peers: &[PeerProfile]) -> BoostTable {
        BoostTable::empty()
    }
}

/// Boosts neighborhoods rated highly by users with similar priorities
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarUserBooster {
    pub similarity_threshold: f64,
    pub min_similar_profiles: usize,
    pub max_boost_fraction: f64,
}

impl SimilarUserBooster {
    pub fn new(similarity_threshold: f64, min_similar_profiles: usize, max_boost_fraction: f64) -> Self {
        Self {
            similarity_threshold,
            min_similar_profiles,
            max_boost_fraction,
        }
    }
}

impl CollaborativeBooster for SimilarUserBooster {
    fn prepare(&self, weights: &WeightVector, peers: &[PeerProfile]) -> BoostTable {
        let user = weights.as_dense();

        let similar: Vec<(&PeerProfile, f64)> = peers
            .iter()
            .filter_map(|peer| match parse_priorities(&peer.priorities) {
                Ok(priorities) => {
                    let peer_vector = WeightVector::from_priorities(&priorities).as_dense();
                    Some((peer, cosine_similarity(&user, &peer_vector)))
                }
                Err(e) => {
                    tracing::warn!("Skipping peer profile {}: {}", peer.profile_id, e);
                    None
                }
            })
            .filter(|(_, similarity)| *similarity >= self.similarity_threshold && *similarity > 0.0)
            .collect();

        // Cold start: too little collaborative signal to trust
        if similar.len() < self.min_similar_profiles {
            tracing::debug!(
                "Collaborative boost disabled for this run: {} similar profiles (need {})",
                similar.len(),
                self.min_similar_profiles
            );
            return BoostTable::empty();
        }

        let total_similarity: f64 = similar.iter().map(|(_, s)| s).sum();
        let mut engagement: BTreeMap<String, f64> = BTreeMap::new();
        for (peer, similarity) in &similar {
            for (neighborhood_id, rating) in &peer.ratings {
                if *rating >= HIGH_RATING {
                    *engagement.entry(neighborhood_id.clone()).or_insert(0.0) += similarity;
                }
            }
        }
        for value in engagement.values_mut() {
            *value = (*value / total_similarity).clamp(0.0, 1.0);
        }

        BoostTable::new(engagement, self.max_boost_fraction, similar.len())
    }
}

/// Cosine similarity of two equal-length vectors; 0 when either is all zeros
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::weighting::resolve_weights;
    use crate::models::Dimension;

    fn priorities(safety: i64, nightlife: i64) -> BTreeMap<String, i64> {
        let mut raw: BTreeMap<String, i64> = Dimension::CORE
            .iter()
            .map(|d| (d.name().to_string(), 5))
            .collect();
        raw.insert("safety".to_string(), safety);
        raw.insert("nightlife".to_string(), nightlife);
        raw
    }

    fn peer(id: &str, safety: i64, nightlife: i64, ratings: &[(&str, u8)]) -> PeerProfile {
        PeerProfile {
            profile_id: id.to_string(),
            priorities: priorities(safety, nightlife),
            ratings: ratings.iter().map(|(n, r)| (n.to_string(), *r)).collect(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_no_boost_is_empty() {
        let weights = resolve_weights(&priorities(10, 1)).unwrap();
        let table = NoBoost.prepare(&weights, &[peer("p", 10, 1, &[("a", 5)])]);
        assert!(table.is_empty());
        assert_eq!(table.boost_for("a", 80.0), 0.0);
    }

    #[test]
    fn test_cold_start_returns_empty() {
        let booster = SimilarUserBooster::new(0.8, 3, 0.1);
        let weights = resolve_weights(&priorities(10, 1)).unwrap();
        let peers = vec![peer("p1", 10, 1, &[("a", 5)]), peer("p2", 9, 1, &[("a", 5)])];

        let table = booster.prepare(&weights, &peers);
        assert!(table.is_empty());
    }

    #[test]
    fn test_boost_capped_by_fraction() {
        let booster = SimilarUserBooster::new(0.8, 2, 0.1);
        let weights = resolve_weights(&priorities(10, 1)).unwrap();
        let peers = vec![
            peer("p1", 10, 1, &[("a", 5), ("b", 2)]),
            peer("p2", 10, 2, &[("a", 4)]),
        ];

        let table = booster.prepare(&weights, &peers);
        assert_eq!(table.similar_profiles(), 2);
        assert!((table.engagement("a").unwrap() - 1.0).abs() < 1e-12);
        assert!(table.engagement("b").is_none());
        assert!((table.boost_for("a", 80.0) - 8.0).abs() < 1e-9);
        assert_eq!(table.boost_for("b", 80.0), 0.0);
    }

    #[test]
    fn test_dissimilar_peers_ignored() {
        let booster = SimilarUserBooster::new(0.95, 1, 0.1);
        let weights = resolve_weights(&priorities(10, 1)).unwrap();
        let peers = vec![
            peer("alike", 10, 1, &[("a", 5)]),
            peer("opposite", 1, 10, &[("b", 5)]),
        ];

        let table = booster.prepare(&weights, &peers);
        assert!(table.engagement("a").is_some());
        assert!(table.engagement("b").is_none());
    }

    #[test]
    fn test_invalid_peer_skipped() {
        let booster = SimilarUserBooster::new(0.8, 1, 0.1);
        let weights = resolve_weights(&priorities(10, 1)).unwrap();
        let mut broken = peer("broken", 10, 1, &[("b", 5)]);
        broken.priorities.insert("safety".to_string(), 42);
        let peers = vec![broken, peer("ok", 10, 1, &[("a", 5)])];

        let table = booster.prepare(&weights, &peers);
        assert_eq!(table.similar_profiles(), 1);
        assert!(table.engagement("b").is_none());
    }
}
