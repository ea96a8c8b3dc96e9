use crate::core::{scorer::ScoreCard, weighting::WeightVector};
use crate::models::{Dimension, DimensionContribution, UserProfile};
use std::collections::BTreeSet;

/// Highlight, consideration and summary text for one ranked neighborhood
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Explanation {
    pub highlights: Vec<String>,
    pub considerations: Vec<String>,
    pub summary: String,
}

/// Templated explanation generator
///
/// Output depends only on the score card, the weights and the profile, so it
/// is stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Explainer {
    pub strong_threshold: f64,
    pub weak_threshold: f64,
    pub highlight_limit: usize,
    pub uncertain_confidence: f64,
}

impl Default for Explainer {
    fn default() -> Self {
        Self {
            strong_threshold: 70.0,
            weak_threshold: 40.0,
            highlight_limit: 3,
            uncertain_confidence: 0.5,
        }
    }
}

impl Explainer {
    pub fn explain(
        &self,
        card: &ScoreCard,
        weights: &WeightVector,
        profile: &UserProfile,
    ) -> Explanation {
        let important = weights.mean_weight();
        let unreliable = |c: &DimensionContribution| {
            c.weight >= important && c.confidence < self.uncertain_confidence
        };

        // Contributions arrive sorted by contribution, so the first matches
        // are the strongest. Unreliable dimensions are reported as uncertain
        // instead.
        let strong: Vec<&DimensionContribution> = card
            .contributions
            .iter()
            .filter(|c| c.weight > 0.0 && c.normalized_value >= self.strong_threshold && !unreliable(*c))
            .take(self.highlight_limit)
            .collect();

        let highlights = strong.iter().map(|c| highlight_text(c)).collect();

        let short_commute = profile.commute_tolerance.filter(|t| t.is_short());
        let mut considerations = Vec::new();
        let mut uncertain = Vec::new();

        for c in card.contributions.iter().filter(|c| c.weight > 0.0) {
            if unreliable(c) {
                uncertain.push(format!(
                    "{}: data uncertain (confidence {:.0}%)",
                    c.dimension.label(),
                    c.confidence * 100.0
                ));
            } else if c.normalized_value <= self.weak_threshold {
                match (c.dimension, short_commute) {
                    (Dimension::Transit, Some(commute)) => considerations.push(format!(
                        "{} is weak here ({:.0}/100) for a {} commute",
                        c.dimension.label(),
                        c.normalized_value,
                        commute.label()
                    )),
                    _ => considerations.push(format!(
                        "{} is weak here ({:.0}/100)",
                        c.dimension.label(),
                        c.normalized_value
                    )),
                }
            }
        }

        for dimension in &card.uncovered {
            if weights.get(*dimension) >= important {
                uncertain.push(format!(
                    "{}: data uncertain (no reliable data available)",
                    dimension.label()
                ));
            }
        }

        considerations.extend(uncertain);

        if let (Some(rent), Some(budget)) = (card.median_rent, profile.budget_ceiling) {
            if rent > budget {
                considerations.push(format!(
                    "Typical rent of ${:.0}/month exceeds your budget of ${:.0}",
                    rent, budget
                ));
            }
        }

        let summary = summary_text(card, &strong, &profile.lifestyle);

        Explanation {
            highlights,
            considerations,
            summary,
        }
    }
}

fn highlight_text(c: &DimensionContribution) -> String {
    format!(
        "Strong {} ({:.0}/100) on a priority weighted {:.0}%",
        c.dimension.label().to_lowercase(),
        c.normalized_value,
        c.weight * 100.0
    )
}

fn summary_text(card: &ScoreCard, strong: &[&DimensionContribution], lifestyle: &BTreeSet<String>) -> String {
    let place = if card.city.is_empty() {
        card.name.clone()
    } else {
        format!("{} ({})", card.name, card.city)
    };

    let mut summary = match strong {
        [] => format!("{} is a {:.0}% match for your priorities.", place, card.score),
        [only] => format!(
            "{} is a {:.0}% match, led by {}.",
            place,
            card.score,
            only.dimension.label().to_lowercase()
        ),
        [first, second, ..] => format!(
            "{} is a {:.0}% match, led by {} and {}.",
            place,
            card.score,
            first.dimension.label().to_lowercase(),
            second.dimension.label().to_lowercase()
        ),
    };

    if let Some(tags) = lifestyle_text(lifestyle) {
        summary.push_str(&format!(" Matched against your {} lifestyle.", tags));
    }

    if card.boost > 0.0 {
        summary.push_str(" Users with similar priorities rated it highly.");
    }

    summary
}

/// First two lifestyle tags, with a count of the rest
fn lifestyle_text(lifestyle: &BTreeSet<String>) -> Option<String> {
    let tags: Vec<&str> = lifestyle
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    match tags.as_slice() {
        [] => None,
        [only] => Some(only.to_string()),
        [first, second] => Some(format!("{} and {}", first, second)),
        [first, second, rest @ ..] => Some(format!("{}, {} and {} more", first, second, rest.len())),
    }
}
