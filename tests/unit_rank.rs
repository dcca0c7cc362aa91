// Unit tests for the topic ranker.
//
// Covers threshold filtering on the raw score, display rounding, and the
// stable ordering guarantee (ties keep the caller's label order).

use topicsift::classify::models::{RawScore, MINIMUM_CONFIDENCE_THRESHOLD};
use topicsift::classify::rank::{rank, round_score};

fn raw(label: &str, score: f64) -> RawScore {
    RawScore {
        label: label.to_string(),
        score,
    }
}

fn topics_of(scores: &[RawScore]) -> Vec<String> {
    rank(scores, MINIMUM_CONFIDENCE_THRESHOLD)
        .into_iter()
        .map(|t| t.topic)
        .collect()
}

// ============================================================
// Threshold filtering
// ============================================================

#[test]
fn below_threshold_is_dropped_even_when_it_rounds_up() {
    // 0.0999 would display as 0.100, but filtering uses the raw value
    let topics = rank(&[raw("a", 0.0999)], MINIMUM_CONFIDENCE_THRESHOLD);
    assert!(topics.is_empty());
}

#[test]
fn exactly_threshold_is_kept() {
    let topics = rank(&[raw("a", 0.1)], MINIMUM_CONFIDENCE_THRESHOLD);
    assert_eq!(topics.len(), 1);
}

#[test]
fn all_below_threshold_gives_empty_result() {
    let topics = rank(
        &[raw("a", 0.01), raw("b", 0.05), raw("c", 0.09)],
        MINIMUM_CONFIDENCE_THRESHOLD,
    );
    assert!(topics.is_empty());
}

#[test]
fn no_result_below_threshold() {
    let scores: Vec<RawScore> = (0..=100)
        .map(|i| raw(&format!("label-{i}"), i as f64 / 100.0))
        .collect();
    let topics = rank(&scores, MINIMUM_CONFIDENCE_THRESHOLD);
    assert_eq!(topics.len(), 91);
    assert!(topics
        .iter()
        .all(|t| t.confidence_score >= MINIMUM_CONFIDENCE_THRESHOLD));
}

#[test]
fn custom_threshold_is_respected() {
    let topics = rank(&[raw("a", 0.45), raw("b", 0.55)], 0.5);
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].topic, "b");
}

// ============================================================
// Rounding
// ============================================================

#[test]
fn rounds_to_three_decimals() {
    let topics = rank(&[raw("a", 0.8754999)], MINIMUM_CONFIDENCE_THRESHOLD);
    assert_eq!(topics[0].confidence_score, 0.875);
}

#[test]
fn rounding_is_half_away_from_zero() {
    // 1/16 and 3/16 are exact in binary, so x * 1000 is a true .5
    assert_eq!(round_score(0.0625), 0.063);
    assert_eq!(round_score(0.1875), 0.188);
    assert_eq!(round_score(0.25), 0.25);
    assert_eq!(round_score(0.9996), 1.0);
}

// ============================================================
// Ordering
// ============================================================

#[test]
fn sorted_descending() {
    let topics = rank(
        &[raw("low", 0.2), raw("high", 0.9), raw("mid", 0.5)],
        MINIMUM_CONFIDENCE_THRESHOLD,
    );
    let scores: Vec<f64> = topics.iter().map(|t| t.confidence_score).collect();
    assert_eq!(scores, vec![0.9, 0.5, 0.2]);
}

#[test]
fn ties_keep_input_label_order() {
    assert_eq!(
        topics_of(&[raw("b", 0.5), raw("a", 0.5), raw("c", 0.5)]),
        vec!["b", "a", "c"]
    );
    assert_eq!(
        topics_of(&[raw("c", 0.5), raw("b", 0.5), raw("a", 0.5)]),
        vec!["c", "b", "a"]
    );
}

#[test]
fn ties_are_judged_on_rounded_score() {
    // 0.4001 and 0.4004 both display as 0.4, so input order decides
    assert_eq!(
        topics_of(&[raw("first", 0.4001), raw("second", 0.4004)]),
        vec!["first", "second"]
    );
}

#[test]
fn ranking_is_idempotent() {
    let scores = vec![
        raw("technology", 0.92),
        raw("finance", 0.15),
        raw("science", 0.92),
        raw("sports", 0.03),
    ];
    let first = rank(&scores, MINIMUM_CONFIDENCE_THRESHOLD);
    let second = rank(&scores, MINIMUM_CONFIDENCE_THRESHOLD);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        first.iter().map(|t| t.topic.as_str()).collect::<Vec<_>>(),
        vec!["technology", "science", "finance"]
    );
}
