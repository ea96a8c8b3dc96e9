use crate::config::EngineConfig;
use crate::core::{
    booster::{CollaborativeBooster, NoBoost, SimilarUserBooster},
    confidence::HalfLifeTable,
    explainer::Explainer,
    normalizer::NormalizationTable,
    ranker,
    scorer::{ScoreCard, Scorer},
    weighting::resolve_weights,
};
use crate::error::EngineError;
use crate::models::{Diagnostic, MatchResult, NeighborhoodCorpus, UserProfile};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation signal, checked at every neighborhood boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a complete scoring run
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    pub results: Vec<MatchResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Weight resolution from the profile's priority vector
/// 2. Corpus-wide normalization bounds (once, before parallel work)
/// 3. Collaborative boost table
/// 4. Parallel per-neighborhood scoring
/// 5. Deterministic ranking
/// 6. Explanation
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    half_lives: HalfLifeTable,
    explainer: Explainer,
    booster: Arc<dyn CollaborativeBooster>,
    pool: Arc<rayon::ThreadPool>,
}

impl Engine {
    /// Build an engine from validated configuration
    ///
    /// The collaborative booster is chosen from `collaborative_boost_enabled`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let booster: Arc<dyn CollaborativeBooster> = if config.collaborative_boost_enabled {
            Arc::new(SimilarUserBooster::new(
                config.similarity_threshold,
                config.min_similar_profiles,
                config.max_boost_fraction,
            ))
        } else {
            Arc::new(NoBoost)
        };

        Self::with_booster(config, booster)
    }

    /// Build an engine with an explicit booster strategy
    pub fn with_booster(
        config: EngineConfig,
        booster: Arc<dyn CollaborativeBooster>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let half_lives = HalfLifeTable::new(config.half_life_overrides()?);
        let explainer = Explainer {
            strong_threshold: config.strong_threshold,
            weak_threshold: config.weak_threshold,
            highlight_limit: config.highlight_limit,
            uncertain_confidence: config.uncertain_confidence,
        };

        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("scoring-{}", i));
        if let Some(workers) = config.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|e| EngineError::Configuration(format!("failed to build scoring pool: {}", e)))?;

        Ok(Self {
            config,
            half_lives,
            explainer,
            booster,
            pool: Arc::new(pool),
        })
    }

    pub fn with_default_config() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Rank every neighborhood in the corpus for a profile
    ///
    /// `as_of` is the reference time for data staleness; passing it in keeps
    /// the run a pure function of its inputs.
    pub fn rank(
        &self,
        profile: &UserProfile,
        corpus: &NeighborhoodCorpus,
        as_of: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<RankingOutcome, EngineError> {
        self.rank_with_cancel(profile, corpus, as_of, limit, &CancelFlag::new())
    }

    /// Same as [`Engine::rank`], abandoning the run once `cancel` is set
    ///
    /// A cancelled run returns `EngineError::Cancelled`; partial results are
    /// never returned.
    pub fn rank_with_cancel(
        &self,
        profile: &UserProfile,
        corpus: &NeighborhoodCorpus,
        as_of: DateTime<Utc>,
        limit: Option<usize>,
        cancel: &CancelFlag,
    ) -> Result<RankingOutcome, EngineError> {
        let total_candidates = corpus.neighborhoods.len();
        if total_candidates == 0 {
            return Err(EngineError::EmptyCorpus);
        }

        let weights = resolve_weights(&profile.priorities)?;

        let table = NormalizationTable::from_corpus(&corpus.neighborhoods);
        tracing::debug!(
            "Normalization bounds computed for {} metrics across {} neighborhoods",
            table.len(),
            total_candidates
        );

        let boosts = self.booster.prepare(&weights, &corpus.peers);
        let scorer = Scorer::new(&table, &self.half_lives, as_of);

        let scored: Vec<Result<ScoreCard, EngineError>> = self.pool.install(|| {
            corpus
                .neighborhoods
                .par_iter()
                .map(|record| {
                    if cancel.is_cancelled() {
                        return Err(EngineError::Cancelled);
                    }
                    scorer.score(record, &weights)
                })
                .collect()
        });

        if cancel.is_cancelled() {
            tracing::info!("Scoring run cancelled after partial evaluation");
            return Err(EngineError::Cancelled);
        }

        let mut cards = Vec::with_capacity(scored.len());
        let mut diagnostics = Vec::new();
        for result in scored {
            match result {
                Ok(mut card) => {
                    card.apply_boost(boosts.boost_for(&card.neighborhood_id, card.base_score));
                    cards.push(card);
                }
                Err(EngineError::InsufficientData { neighborhood_id }) => {
                    tracing::warn!("Dropping neighborhood {}: insufficient data", neighborhood_id);
                    let error = EngineError::InsufficientData {
                        neighborhood_id: neighborhood_id.clone(),
                    };
                    diagnostics.push(Diagnostic {
                        neighborhood_id,
                        kind: error.kind().to_string(),
                        message: error.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        diagnostics.sort_by(|a, b| a.neighborhood_id.cmp(&b.neighborhood_id));

        let ranked = ranker::rank(cards, limit);

        let results: Vec<MatchResult> = ranked
            .into_iter()
            .map(|card| {
                let explanation = self.explainer.explain(&card, &weights, profile);
                MatchResult {
                    neighborhood_id: card.neighborhood_id,
                    name: card.name,
                    city: card.city,
                    score: card.score,
                    base_score: card.base_score,
                    collaborative_boost: card.boost,
                    dimensions: card.contributions,
                    highlights: explanation.highlights,
                    considerations: explanation.considerations,
                    summary: explanation.summary,
                }
            })
            .collect();

        tracing::info!(
            "Ranked {} neighborhoods ({} dropped, {} similar profiles)",
            results.len(),
            diagnostics.len(),
            boosts.similar_profiles()
        );

        Ok(RankingOutcome {
            results,
            diagnostics,
            total_candidates,
        })
    }
}
