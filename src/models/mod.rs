// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeBracket, CommuteTolerance, Demographics, Diagnostic, Dimension, DimensionContribution,
    MatchResult, Metric, MetricReading, NeighborhoodCorpus, NeighborhoodRecord, NormalizedMetric,
    PeerProfile, Polarity, UserProfile,
};
pub use requests::MatchNeighborhoodsRequest;
pub use responses::{ErrorResponse, HealthResponse, MatchNeighborhoodsResponse, ReloadResponse};
