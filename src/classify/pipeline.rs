// Classification pipeline: defaults → validate → score → align → rank.
//
// The scorer is injected at construction so the same pipeline runs against
// the ONNX model, the hosted inference API, or a test fake.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::ClassifyError;
use super::models::{
    default_labels, ClassificationRequest, ClassificationResponse, LabelScores, RawScore,
    MINIMUM_CONFIDENCE_THRESHOLD,
};
use super::rank::rank;
use super::validate::validate;
use crate::output::truncate_chars;
use crate::scorer::traits::TopicScorer;

/// Characters of input text included in log lines.
const LOG_PREVIEW_CHARS: usize = 100;

/// Shared, read-only classifier. Cheap to clone.
#[derive(Clone)]
pub struct Classifier {
    scorer: Arc<dyn TopicScorer>,
    threshold: f64,
    default_labels: Arc<Vec<String>>,
}

impl Classifier {
    /// Classifier with the default threshold and category list.
    pub fn new(scorer: Arc<dyn TopicScorer>) -> Self {
        Self {
            scorer,
            threshold: MINIMUM_CONFIDENCE_THRESHOLD,
            default_labels: Arc::new(default_labels()),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn model_name(&self) -> &str {
        self.scorer.model_name()
    }

    /// Run a full classification for one request.
    ///
    /// Returns either a complete response or a single error, never a
    /// partial result. An empty topic list is a success.
    pub async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationResponse, ClassifyError> {
        let labels = request
            .labels
            .unwrap_or_else(|| self.default_labels.as_ref().clone());

        let input = validate(request.text.as_deref(), &labels)?;

        info!(
            text_preview = %truncate_chars(&input.text, LOG_PREVIEW_CHARS),
            label_count = input.labels.len(),
            model = self.scorer.model_name(),
            "Attempting classification"
        );

        let scores = self
            .scorer
            .score(&input.text, &input.labels)
            .await
            .map_err(ClassifyError::ScoringUnavailable)?;

        let raw_scores =
            align_scores(&input.labels, &scores).map_err(ClassifyError::ScoringUnavailable)?;

        let topics = rank(&raw_scores, self.threshold);

        info!(
            topic_count = topics.len(),
            "Classification successful"
        );

        Ok(ClassificationResponse::success(topics))
    }
}

/// Put scorer output back into the caller's label order, checking that
/// every label got exactly one usable score.
pub fn align_scores(labels: &[String], scores: &LabelScores) -> anyhow::Result<Vec<RawScore>> {
    let mut aligned = Vec::with_capacity(labels.len());
    for label in labels {
        let Some(&score) = scores.get(label) else {
            anyhow::bail!("Scorer returned no score for label '{label}'");
        };
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            anyhow::bail!("Scorer returned out-of-range score {score} for label '{label}'");
        }
        debug!(label = %label, score, "raw score");
        aligned.push(RawScore {
            label: label.clone(),
            score,
        });
    }

    if scores.len() > labels.len() {
        warn!(
            expected = labels.len(),
            received = scores.len(),
            "Scorer returned scores for unrequested labels, ignoring them"
        );
    }

    Ok(aligned)
}
