// Property tests for NeighborFit Engine

use chrono::{DateTime, Duration, TimeZone, Utc};
use neighborfit_engine::core::{resolve_weights, Engine, HalfLifeTable, NormalizationTable};
use neighborfit_engine::models::{
    Dimension, Metric, MetricReading, NeighborhoodCorpus, NeighborhoodRecord, UserProfile,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap()
}

fn arb_reading() -> impl Strategy<Value = MetricReading> {
    (0.0f64..200.0, 0.0f64..=1.0, 0i64..1_000).prop_map(|(value, completeness, age)| MetricReading {
        value,
        unit: String::new(),
        last_updated: as_of() - Duration::days(age),
        completeness,
    })
}

fn arb_record(id: usize) -> impl Strategy<Value = NeighborhoodRecord> {
    proptest::collection::btree_map(
        proptest::sample::select(Metric::ALL.to_vec()),
        arb_reading(),
        0..Metric::ALL.len(),
    )
    .prop_map(move |metrics| NeighborhoodRecord {
        id: format!("n{:03}", id),
        name: format!("Neighborhood {}", id),
        city: String::new(),
        metrics,
    })
}

fn arb_corpus() -> impl Strategy<Value = NeighborhoodCorpus> {
    (1usize..12)
        .prop_flat_map(|n| (0..n).map(arb_record).collect::<Vec<_>>())
        .prop_map(|neighborhoods| NeighborhoodCorpus {
            neighborhoods,
            peers: vec![],
        })
}

/// Core dimensions always rated, extended ones optionally
fn arb_priorities() -> impl Strategy<Value = BTreeMap<String, i64>> {
    (
        proptest::collection::vec(1i64..=10, Dimension::CORE.len()),
        proptest::collection::vec(proptest::option::of(1i64..=10), 3),
    )
        .prop_map(|(core, extended)| {
            let mut raw: BTreeMap<String, i64> = Dimension::CORE
                .iter()
                .zip(core)
                .map(|(d, p)| (d.name().to_string(), p))
                .collect();
            let extra = [Dimension::Transit, Dimension::Amenities, Dimension::Affordability];
            for (d, p) in extra.iter().zip(extended) {
                if let Some(p) = p {
                    raw.insert(d.name().to_string(), p);
                }
            }
            raw
        })
}

proptest! {
    #[test]
    fn prop_weights_sum_to_one(raw in arb_priorities()) {
        let weights = resolve_weights(&raw).unwrap();
        prop_assert!((weights.total() - 1.0).abs() < 1e-9);
        prop_assert_eq!(weights.len(), raw.len());
    }

    #[test]
    fn prop_scores_bounded(corpus in arb_corpus(), raw in arb_priorities()) {
        let engine = Engine::with_default_config().unwrap();
        let profile = UserProfile { priorities: raw, ..UserProfile::default() };
        let outcome = engine.rank(&profile, &corpus, as_of(), None).unwrap();

        prop_assert_eq!(
            outcome.results.len() + outcome.diagnostics.len(),
            corpus.neighborhoods.len()
        );
        for result in &outcome.results {
            prop_assert!(result.score >= 0.0 && result.score <= 100.0);
            for d in &result.dimensions {
                prop_assert!(d.normalized_value >= 0.0 && d.normalized_value <= 100.0);
                prop_assert!(d.confidence > 0.0 && d.confidence <= 1.0);
            }
        }
    }

    #[test]
    fn prop_normalization_idempotent(corpus in arb_corpus()) {
        let half_lives = HalfLifeTable::default();
        let first = NormalizationTable::from_corpus(&corpus.neighborhoods);
        let second = NormalizationTable::from_corpus(&corpus.neighborhoods);
        prop_assert_eq!(&first, &second);

        for record in &corpus.neighborhoods {
            prop_assert_eq!(
                first.normalize_record(record, &half_lives, as_of()),
                second.normalize_record(record, &half_lives, as_of())
            );
        }
    }

    #[test]
    fn prop_ranking_ignores_input_order(corpus in arb_corpus(), raw in arb_priorities()) {
        let engine = Engine::with_default_config().unwrap();
        let profile = UserProfile { priorities: raw, ..UserProfile::default() };
        let forward = engine.rank(&profile, &corpus, as_of(), None).unwrap();

        let mut reversed = corpus.clone();
        reversed.neighborhoods.reverse();
        let backward = engine.rank(&profile, &reversed, as_of(), None).unwrap();

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_raising_priority_keeps_better_neighborhood_ahead(
        safety in 1i64..=10,
        others in proptest::collection::vec(1i64..=10, Dimension::CORE.len()),
        walk in 0.0f64..100.0,
    ) {
        let reading = |value: f64| MetricReading {
            value,
            unit: String::new(),
            last_updated: as_of(),
            completeness: 1.0,
        };
        let record = |id: &str, crime: f64| NeighborhoodRecord {
            id: id.to_string(),
            name: id.to_string(),
            city: String::new(),
            metrics: [
                (Metric::WalkScore, reading(walk)),
                (Metric::CrimeRate, reading(crime)),
            ]
            .into_iter()
            .collect(),
        };
        // "safe" scores strictly higher on safety, all else equal; "z" sorts
        // last by id so a tie would not favour it.
        let corpus = NeighborhoodCorpus {
            neighborhoods: vec![record("safe", 5.0), record("unsafe", 40.0), record("z", 20.0)],
            peers: vec![],
        };

        let engine = Engine::with_default_config().unwrap();
        let mut raw: BTreeMap<String, i64> = Dimension::CORE
            .iter()
            .zip(others)
            .map(|(d, p)| (d.name().to_string(), p))
            .collect();

        for boosted in safety..=10 {
            raw.insert("safety".to_string(), boosted);
            let profile = UserProfile { priorities: raw.clone(), ..UserProfile::default() };
            let outcome = engine.rank(&profile, &corpus, as_of(), None).unwrap();
            let position = |id: &str| outcome.results.iter().position(|r| r.neighborhood_id == id).unwrap();
            prop_assert!(position("safe") < position("unsafe"));
        }
    }
}
