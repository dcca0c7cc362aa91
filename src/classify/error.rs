// Error taxonomy for the classification pipeline.
//
// Validation failures are the caller's fault and map to 400s at the web
// boundary. Scorer failures and anything unexpected map to 500s.

use thiserror::Error;

/// Reasons a request is rejected before it reaches the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No valid text provided")]
    EmptyText,

    #[error("No candidate labels provided")]
    EmptyLabelSet,

    #[error("Label at position {index} is empty")]
    BlankLabel { index: usize },

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),
}

/// Every way a classification request can fail.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The request body was absent or could not be parsed.
    #[error("{message}")]
    MalformedRequest { message: String, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The scorer could not produce usable scores. Not retried.
    #[error("Scoring unavailable: {0:#}")]
    ScoringUnavailable(anyhow::Error),

    /// Anything else, e.g. a panic inside the pipeline caught by the web
    /// handler. Logged with full context.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl ClassifyError {
    /// Body missing or empty.
    pub fn missing_body() -> Self {
        Self::MalformedRequest {
            message: "No JSON data provided".to_string(),
            reason: "request body is empty".to_string(),
        }
    }

    /// Body present but not a usable JSON object.
    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: "Invalid request body".to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the request itself (HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest { .. } | Self::Validation(_)
        )
    }
}
