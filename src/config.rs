use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::classify::models::MINIMUM_CONFIDENCE_THRESHOLD;

/// Model used when MODEL_NAME is unset.
pub const DEFAULT_MODEL_NAME: &str = "facebook/bart-large-mnli";

/// Which scoring backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum ScorerBackend {
    /// Local ONNX model (default); no network needed once downloaded
    Onnx,
    /// Hosted inference API; needs network, usually HF_API_TOKEN
    Remote,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Scoring model identifier (MODEL_NAME)
    pub model_name: String,
    pub scorer_backend: ScorerBackend,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// HuggingFace repo `download-model` fetches the ONNX export from
    pub onnx_repo: String,
    pub inference_url: String,
    pub api_token: Option<String>,
    /// Optional client-side rate limit for the remote scorer
    pub remote_qps: Option<f64>,
    pub confidence_threshold: f64,
    pub request_timeout: Duration,
    pub max_concurrent_inferences: usize,
    pub bind: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default. Values that are set but don't parse are
    /// errors rather than silently falling back.
    pub fn load() -> Result<Self> {
        let scorer_backend = match env::var("TOPICSIFT_SCORER").as_deref() {
            Ok("remote") => ScorerBackend::Remote,
            Ok("onnx") | Err(_) => ScorerBackend::Onnx,
            Ok(other) => anyhow::bail!(
                "Unknown TOPICSIFT_SCORER '{other}'. Expected 'onnx' or 'remote'."
            ),
        };

        let model_dir = env::var("TOPICSIFT_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::scorer::download::default_model_dir());

        let confidence_threshold =
            parse_var("TOPICSIFT_CONFIDENCE_THRESHOLD")?.unwrap_or(MINIMUM_CONFIDENCE_THRESHOLD);
        if !(0.0..=1.0).contains(&confidence_threshold) {
            anyhow::bail!(
                "TOPICSIFT_CONFIDENCE_THRESHOLD must be between 0 and 1, got {confidence_threshold}"
            );
        }

        let remote_qps: Option<f64> = parse_var("TOPICSIFT_REMOTE_QPS")?;
        if let Some(qps) = remote_qps {
            if !(qps > 0.0 && qps.is_finite()) {
                anyhow::bail!("TOPICSIFT_REMOTE_QPS must be a positive number, got {qps}");
            }
        }

        let timeout_secs: u64 = parse_var("TOPICSIFT_REQUEST_TIMEOUT_SECS")?.unwrap_or(30);

        Ok(Self {
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string()),
            scorer_backend,
            model_dir,
            onnx_repo: env::var("TOPICSIFT_ONNX_REPO")
                .unwrap_or_else(|_| crate::scorer::download::DEFAULT_ONNX_REPO.to_string()),
            inference_url: env::var("HF_INFERENCE_URL")
                .unwrap_or_else(|_| crate::scorer::remote::DEFAULT_INFERENCE_URL.to_string()),
            api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),
            remote_qps,
            confidence_threshold,
            request_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_inferences: parse_var("TOPICSIFT_MAX_CONCURRENT_INFERENCES")?
                .unwrap_or(4),
            bind: env::var("TOPICSIFT_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("TOPICSIFT_PORT")?.unwrap_or(5000),
        })
    }

    /// Validate that the chosen scorer backend has what it needs.
    /// For ONNX: model files must exist (or the user should run download-model).
    pub fn require_scorer(&self) -> Result<()> {
        match self.scorer_backend {
            ScorerBackend::Onnx => {
                if !crate::scorer::download::model_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "ONNX model files not found in {}\n\
                         Run `topicsift download-model` to download them.\n\
                         Or set TOPICSIFT_SCORER=remote to use the hosted inference API instead.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            // Public models work without a token, so nothing to check
            ScorerBackend::Remote => Ok(()),
        }
    }
}

/// Read and parse an optional env var. Unset means `None`.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {name}: '{raw}'")),
        Err(_) => Ok(None),
    }
}
