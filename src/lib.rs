//! NeighborFit Engine - neighborhood matching and ranking
//!
//! Scores a corpus of neighborhood records against a user's lifestyle
//! profile and returns a ranked, explained list of fits. The pipeline is
//! normalize -> weight -> score (+ collaborative boost) -> rank -> explain,
//! with every stage a pure function of its inputs.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use config::EngineConfig;
pub use core::{CancelFlag, CollaborativeBooster, Engine, RankingOutcome};
pub use error::EngineError;
pub use models::{
    Dimension, MatchResult, Metric, MetricReading, NeighborhoodCorpus, NeighborhoodRecord,
    PeerProfile, UserProfile,
};
