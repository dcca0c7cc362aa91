// Threshold filtering and deterministic ranking of scorer output.

use std::cmp::Ordering;

use super::models::{RawScore, TopicResult};

/// Number of decimal places kept in `confidence_score`.
const DISPLAY_DECIMALS: i32 = 3;

/// Filter, round and sort raw scores into the response order.
///
/// `raw_scores` must be in the caller's label order. The threshold is
/// inclusive and is applied to the unrounded score, so 0.0999 is dropped
/// even though it would display as 0.100. The sort is stable: labels with
/// equal rounded scores keep their input order.
pub fn rank(raw_scores: &[RawScore], threshold: f64) -> Vec<TopicResult> {
    let mut topics: Vec<TopicResult> = raw_scores
        .iter()
        .filter(|raw| raw.score >= threshold)
        .map(|raw| TopicResult {
            topic: raw.label.clone(),
            confidence_score: round_score(raw.score),
        })
        .collect();

    // sort_by is stable
    topics.sort_by(|a, b| {
        b.confidence_score
            .partial_cmp(&a.confidence_score)
            .unwrap_or(Ordering::Equal)
    });

    topics
}

/// Round to three decimals, half away from zero.
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(DISPLAY_DECIMALS);
    (score * factor).round() / factor
}
