// Request and response types for topic classification.
//
// Everything here is request-scoped: built when a request arrives and
// dropped once the response is serialized.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Topic labels used when the caller does not supply any, in their fixed order.
pub const DEFAULT_TOPIC_CATEGORIES: [&str; 11] = [
    "technology",
    "finance",
    "healthcare",
    "education",
    "marketing",
    "research",
    "environment",
    "sports",
    "entertainment",
    "politics",
    "science",
];

/// Minimum raw score a label needs to appear in the response.
pub const MINIMUM_CONFIDENCE_THRESHOLD: f64 = 0.1;

/// Per-label scores as returned by a scorer. Unordered.
pub type LabelScores = HashMap<String, f64>;

/// Incoming request body for `POST /extract_keywords`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassificationRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Candidate labels. `None` (absent or `null`) means the default categories.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

impl ClassificationRequest {
    pub fn new(text: impl Into<String>, labels: Option<Vec<String>>) -> Self {
        Self {
            text: Some(text.into()),
            labels,
        }
    }
}

/// A request that passed validation: trimmed text and a clean label set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    pub text: String,
    pub labels: Vec<String>,
}

/// One scorer output, aligned to the caller's label order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScore {
    pub label: String,
    pub score: f64,
}

/// A label that cleared the threshold, with its display score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic: String,
    /// Rounded to 3 decimal places.
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// Successful classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub topics: Vec<TopicResult>,
    pub status: Status,
}

impl ClassificationResponse {
    pub fn success(topics: Vec<TopicResult>) -> Self {
        Self {
            topics,
            status: Status::Success,
        }
    }
}

/// The default categories as owned strings.
pub fn default_labels() -> Vec<String> {
    DEFAULT_TOPIC_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
