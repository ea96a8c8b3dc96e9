use crate::core::scorer::ScoreCard;
use std::cmp::Ordering;

/// Total order over score cards
///
/// Final score descending, then mean confidence descending, then most recent
/// data first, then id ascending.
pub fn compare(a: &ScoreCard, b: &ScoreCard) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.mean_confidence.total_cmp(&a.mean_confidence))
        .then_with(|| b.latest_update.cmp(&a.latest_update))
        .then_with(|| a.neighborhood_id.cmp(&b.neighborhood_id))
}

/// Sort cards into rank order and apply an optional limit
pub fn rank(mut cards: Vec<ScoreCard>, limit: Option<usize>) -> Vec<ScoreCard> {
    cards.sort_by(compare);

    if let Some(limit) = limit {
        cards.truncate(limit);
    }

    cards
}
