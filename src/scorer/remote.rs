// Hosted zero-shot inference API (HuggingFace Inference).
//
// Sends the text and candidate labels to the zero-shot-classification task
// endpoint for the configured model, with multi_label enabled so each label
// is scored independently. Useful when the ONNX model can't be run locally.
//
// API docs: https://huggingface.co/docs/inference-providers/tasks/zero-shot-classification

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::TopicScorer;
use crate::classify::models::LabelScores;

/// Default base URL; the model id is appended as a path segment.
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Per-request HTTP timeout. Covers cold starts on the hosted side.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Zero-shot scorer backed by a hosted inference endpoint.
pub struct RemoteZeroShotScorer {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    model_name: String,
    rate_limiter: Option<RateLimiter>,
}

impl RemoteZeroShotScorer {
    /// Create a scorer for `model_name` served under `base_url`.
    pub fn new(base_url: &str, model_name: &str, api_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model_name),
            api_token: api_token.filter(|t| !t.is_empty()),
            model_name: model_name.to_string(),
            rate_limiter: None,
        })
    }

    /// Space requests out to at most `requests_per_second`.
    pub fn with_rate_limit(mut self, requests_per_second: f64) -> Self {
        self.rate_limiter = Some(RateLimiter::new(requests_per_second));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TopicScorer for RemoteZeroShotScorer {
    async fn score(&self, text: &str, labels: &[String]) -> Result<LabelScores> {
        if labels.is_empty() {
            return Ok(LabelScores::new());
        }

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let request = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                candidate_labels: labels,
                multi_label: true,
            },
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .context("Failed to call inference API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API returned {}: {}", status, body);
        }

        let result: InferenceResponse = response
            .json()
            .await
            .context("Failed to parse inference API response")?;

        let scores = result.into_scores()?;

        debug!(
            model = %self.model_name,
            labels = labels.len(),
            scored = scores.len(),
            "Remote scored text"
        );

        Ok(scores)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

// --- Inference API request/response types ---

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Serialize)]
struct InferenceParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

/// The endpoint has returned both shapes over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    /// `[{"label": ..., "score": ...}, ...]`
    Pairs(Vec<LabelScore>),
    /// `{"sequence": ..., "labels": [...], "scores": [...]}`
    Columns { labels: Vec<String>, scores: Vec<f64> },
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl InferenceResponse {
    fn into_scores(self) -> Result<LabelScores> {
        match self {
            Self::Pairs(pairs) => Ok(pairs.into_iter().map(|p| (p.label, p.score)).collect()),
            Self::Columns { labels, scores } => {
                if labels.len() != scores.len() {
                    anyhow::bail!(
                        "Inference API returned {} labels but {} scores",
                        labels.len(),
                        scores.len()
                    );
                }
                Ok(labels.into_iter().zip(scores).collect())
            }
        }
    }
}
