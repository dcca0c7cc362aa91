// Topic scorer trait: the swap-ready abstraction.
//
// The default implementation runs a local ONNX NLI model. A hosted
// inference API is available as an alternative, and tests plug in fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::models::LabelScores;

/// Multi-label zero-shot scorer.
///
/// Each label is scored independently against the text, so scores do not
/// sum to 1. Implementations are loaded once and shared across concurrent
/// requests, hence `Send + Sync` and `&self`.
#[async_trait]
pub trait TopicScorer: Send + Sync {
    /// Score `text` against every label, returning one score in [0, 1] per label.
    ///
    /// Callers apply their own timeouts by dropping the returned future.
    /// Backends that hand work to a blocking thread must notice that and
    /// skip work nobody is waiting for (see `blocking::spawn_abandonable`).
    async fn score(&self, text: &str, labels: &[String]) -> Result<LabelScores>;

    /// Identifier of the underlying model, for logs and health output.
    fn model_name(&self) -> &str;
}
