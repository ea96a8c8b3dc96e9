// Core algorithm exports
pub mod booster;
pub mod confidence;
pub mod engine;
pub mod explainer;
pub mod normalizer;
pub mod ranker;
pub mod scorer;
pub mod weighting;

pub use booster::{BoostTable, CollaborativeBooster, NoBoost, SimilarUserBooster};
pub use confidence::HalfLifeTable;
pub use engine::{CancelFlag, Engine, RankingOutcome};
pub use explainer::{Explainer, Explanation};
pub use normalizer::{BoundsStrategy, MetricBounds, NormalizationTable};
pub use scorer::{ScoreCard, Scorer};
pub use weighting::{resolve_weights, WeightVector};
