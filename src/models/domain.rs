use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A lifestyle attribute scored per neighborhood and weighted per user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Walkability,
    Safety,
    Nightlife,
    FamilyFriendly,
    Diversity,
    GreenSpace,
    Transit,
    Amenities,
    Affordability,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Walkability,
        Dimension::Safety,
        Dimension::Nightlife,
        Dimension::FamilyFriendly,
        Dimension::Diversity,
        Dimension::GreenSpace,
        Dimension::Transit,
        Dimension::Amenities,
        Dimension::Affordability,
    ];

    /// Dimensions every priority vector must rate
    pub const CORE: [Dimension; 6] = [
        Dimension::Walkability,
        Dimension::Safety,
        Dimension::Nightlife,
        Dimension::FamilyFriendly,
        Dimension::Diversity,
        Dimension::GreenSpace,
    ];

    /// Wire name as used in priority vectors and JSON output
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Walkability => "walkability",
            Dimension::Safety => "safety",
            Dimension::Nightlife => "nightlife",
            Dimension::FamilyFriendly => "familyFriendly",
            Dimension::Diversity => "diversity",
            Dimension::GreenSpace => "greenSpace",
            Dimension::Transit => "transit",
            Dimension::Amenities => "amenities",
            Dimension::Affordability => "affordability",
        }
    }

    /// Human-readable label used in explanation text
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Walkability => "Walkability",
            Dimension::Safety => "Safety",
            Dimension::Nightlife => "Nightlife",
            Dimension::FamilyFriendly => "Family friendliness",
            Dimension::Diversity => "Diversity",
            Dimension::GreenSpace => "Green space access",
            Dimension::Transit => "Transit access",
            Dimension::Amenities => "Amenity density",
            Dimension::Affordability => "Affordability",
        }
    }

    /// Parse a wire name, accepting both camelCase and snake_case spellings
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "walkability" => Some(Dimension::Walkability),
            "safety" => Some(Dimension::Safety),
            "nightlife" => Some(Dimension::Nightlife),
            "familyFriendly" | "family_friendly" => Some(Dimension::FamilyFriendly),
            "diversity" => Some(Dimension::Diversity),
            "greenSpace" | "green_space" => Some(Dimension::GreenSpace),
            "transit" => Some(Dimension::Transit),
            "amenities" => Some(Dimension::Amenities),
            "affordability" => Some(Dimension::Affordability),
            _ => None,
        }
    }

    /// The raw metric this dimension is scored from
    pub fn metric(&self) -> Metric {
        match self {
            Dimension::Walkability => Metric::WalkScore,
            Dimension::Safety => Metric::CrimeRate,
            Dimension::Nightlife => Metric::NightlifeScore,
            Dimension::FamilyFriendly => Metric::FamilyFriendliness,
            Dimension::Diversity => Metric::DiversityIndex,
            Dimension::GreenSpace => Metric::GreenSpaceAccess,
            Dimension::Transit => Metric::TransitScore,
            Dimension::Amenities => Metric::AmenityDensity,
            Dimension::Affordability => Metric::AffordabilityIndex,
        }
    }

    pub fn is_core(&self) -> bool {
        Self::CORE.contains(self)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether larger raw values are more desirable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Raw neighborhood metrics delivered by the ingestion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    WalkScore,
    CrimeRate,
    MedianIncome,
    TransitScore,
    AmenityDensity,
    FamilyFriendliness,
    DiversityIndex,
    NightlifeScore,
    GreenSpaceAccess,
    AffordabilityIndex,
    MedianRent,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::WalkScore,
        Metric::CrimeRate,
        Metric::MedianIncome,
        Metric::TransitScore,
        Metric::AmenityDensity,
        Metric::FamilyFriendliness,
        Metric::DiversityIndex,
        Metric::NightlifeScore,
        Metric::GreenSpaceAccess,
        Metric::AffordabilityIndex,
        Metric::MedianRent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::WalkScore => "walk_score",
            Metric::CrimeRate => "crime_rate",
            Metric::MedianIncome => "median_income",
            Metric::TransitScore => "transit_score",
            Metric::AmenityDensity => "amenity_density",
            Metric::FamilyFriendliness => "family_friendliness",
            Metric::DiversityIndex => "diversity_index",
            Metric::NightlifeScore => "nightlife_score",
            Metric::GreenSpaceAccess => "green_space_access",
            Metric::AffordabilityIndex => "affordability_index",
            Metric::MedianRent => "median_rent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name.trim())
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            Metric::CrimeRate | Metric::MedianRent => Polarity::LowerIsBetter,
            _ => Polarity::HigherIsBetter,
        }
    }

    /// Default staleness half-life in days, reflecting how fast each source changes
    pub fn default_half_life_days(&self) -> f64 {
        match self {
            Metric::CrimeRate => 30.0,
            Metric::TransitScore => 60.0,
            Metric::NightlifeScore | Metric::AmenityDensity => 90.0,
            Metric::MedianRent | Metric::AffordabilityIndex => 180.0,
            Metric::WalkScore | Metric::GreenSpaceAccess => 365.0,
            Metric::FamilyFriendliness | Metric::DiversityIndex | Metric::MedianIncome => 730.0,
        }
    }

    /// Heavy-tailed metrics are bounded by mean ± 2σ instead of raw min/max
    pub fn has_outliers(&self) -> bool {
        matches!(
            self,
            Metric::CrimeRate | Metric::AmenityDensity | Metric::MedianIncome | Metric::MedianRent
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One raw metric observation for a neighborhood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(default = "default_completeness")]
    pub completeness: f64,
}

fn default_completeness() -> f64 { 1.0 }

/// Neighborhood record as supplied by the storage collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub metrics: BTreeMap<Metric, MetricReading>,
}

impl NeighborhoodRecord {
    /// Reading for a metric, ignoring non-finite values
    pub fn reading(&self, metric: Metric) -> Option<&MetricReading> {
        self.metrics.get(&metric).filter(|r| r.value.is_finite())
    }
}

/// A prior user whose preferences and ratings feed the collaborative signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerProfile {
    #[serde(rename = "profileId")]
    pub profile_id: String,
    pub priorities: BTreeMap<String, i64>,
    /// Neighborhood id -> rating on a 1-5 scale
    #[serde(default)]
    pub ratings: BTreeMap<String, u8>,
}

/// Read-only snapshot handed to the engine for one scoring run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodCorpus {
    pub neighborhoods: Vec<NeighborhoodRecord>,
    #[serde(default)]
    pub peers: Vec<PeerProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommuteTolerance {
    #[serde(rename = "under-15")]
    Under15,
    #[serde(rename = "15-30")]
    From15To30,
    #[serde(rename = "30-45")]
    From30To45,
    #[serde(rename = "45-60")]
    From45To60,
    #[serde(rename = "over-60")]
    Over60,
}

impl CommuteTolerance {
    /// Phrase used in explanation text, e.g. "15 to 30 minute"
    pub fn label(&self) -> &'static str {
        match self {
            CommuteTolerance::Under15 => "under 15 minute",
            CommuteTolerance::From15To30 => "15 to 30 minute",
            CommuteTolerance::From30To45 => "30 to 45 minute",
            CommuteTolerance::From45To60 => "45 to 60 minute",
            CommuteTolerance::Over60 => "over 60 minute",
        }
    }

    /// Tolerances of 30 minutes or less, where weak transit is worth calling out
    pub fn is_short(&self) -> bool {
        matches!(self, CommuteTolerance::Under15 | CommuteTolerance::From15To30)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "18-25")]
    From18To25,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "36-45")]
    From36To45,
    #[serde(rename = "46-55")]
    From46To55,
    #[serde(rename = "56-65")]
    From56To65,
    #[serde(rename = "65+")]
    Over65,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(rename = "ageBracket", alias = "ageGroup", default)]
    pub age_bracket: Option<AgeBracket>,
    /// 5 stands for "five or more"
    #[serde(rename = "householdSize", default)]
    pub household_size: Option<u8>,
    #[serde(rename = "hasChildren", default)]
    pub has_children: bool,
    #[serde(rename = "hasPets", default)]
    pub has_pets: bool,
}

/// Lifestyle profile collected by the assessment wizard
///
/// Priorities drive the score. Budget, commute tolerance and lifestyle tags
/// shape the explanation text. Demographics, transportation and amenities
/// are accepted so the full assessment form deserializes, but no stage reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Monthly housing budget ceiling
    #[serde(rename = "budgetCeiling", alias = "budget", default)]
    pub budget_ceiling: Option<f64>,
    #[serde(rename = "commuteTolerance", alias = "commute", default)]
    pub commute_tolerance: Option<CommuteTolerance>,
    #[serde(default)]
    pub lifestyle: BTreeSet<String>,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub transportation: BTreeSet<String>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    /// Raw 1-10 importance per dimension name, validated by the weighting resolver
    pub priorities: BTreeMap<String, i64>,
}

/// A metric rescaled to 0-100 together with its reliability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetric {
    pub value: f64,
    pub confidence: f64,
}

/// Per-dimension term of a match score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionContribution {
    #[serde(rename = "name")]
    pub dimension: Dimension,
    pub weight: f64,
    #[serde(rename = "normalizedValue")]
    pub normalized_value: f64,
    pub confidence: f64,
    pub contribution: f64,
}

/// Ranked, explained match for one neighborhood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "neighborhoodId")]
    pub neighborhood_id: String,
    pub name: String,
    pub city: String,
    pub score: f64,
    #[serde(rename = "baseScore")]
    pub base_score: f64,
    #[serde(rename = "collaborativeBoost")]
    pub collaborative_boost: f64,
    pub dimensions: Vec<DimensionContribution>,
    pub highlights: Vec<String>,
    pub considerations: Vec<String>,
    pub summary: String,
}

/// Per-neighborhood failure reported alongside successful results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "neighborhoodId")]
    pub neighborhood_id: String,
    pub kind: String,
    pub message: String,
}
