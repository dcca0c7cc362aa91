// Local ONNX zero-shot scorer using an NLI model (bart-large-mnli by default).
//
// Zero-shot classification is framed as entailment: for each candidate label
// the model reads (text, "This example is {label}.") and decides whether the
// text entails the hypothesis. In multi-label mode each label's score is the
// entailment probability from a softmax over only the contradiction and
// entailment logits, so labels are scored independently.
//
// Model: Xenova/bart-large-mnli (quantized ONNX export)

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use super::blocking::spawn_abandonable;
use super::download::{CONFIG_FILE, MODEL_FILE, TOKENIZER_FILE};
use super::traits::TopicScorer;
use crate::classify::models::LabelScores;

/// NLI hypothesis template, filled with each candidate label.
const HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

/// BART's positional embedding limit.
const MAX_SEQUENCE_LEN: usize = 1024;

/// Pad token id used when the tokenizer doesn't declare one (BART/RoBERTa).
const FALLBACK_PAD_ID: u32 = 1;

/// Positions of the NLI classes in the model's output logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NliLabels {
    entailment: usize,
    contradiction: usize,
    num_classes: usize,
}

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    label2id: HashMap<String, usize>,
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Local ONNX-based zero-shot scorer.
pub struct OnnxZeroShotScorer {
    // ort::Session::run takes &mut self, and spawn_blocking needs 'static
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    nli: NliLabels,
    pad_id: u32,
    model_name: String,
}

impl OnnxZeroShotScorer {
    /// Load the ONNX model, tokenizer and label mapping from `model_dir`.
    ///
    /// Expects `model_quantized.onnx`, `tokenizer.json` and `config.json`.
    /// Run `topicsift download-model` first if they don't exist.
    pub fn load(model_dir: &Path, model_name: &str) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let config_path = model_dir.join(CONFIG_FILE);

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Model file not found: {}\nRun `topicsift download-model` to download it.",
                    path.display()
                );
            }
        }

        let config_json = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let nli = parse_nli_labels(&config_json)?;

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                strategy: TruncationStrategy::OnlyFirst,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(FALLBACK_PAD_ID);

        info!(
            model = model_name,
            dir = %model_dir.display(),
            entailment = nli.entailment,
            contradiction = nli.contradiction,
            "Loaded ONNX zero-shot model"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            nli,
            pad_id,
            model_name: model_name.to_string(),
        })
    }
}

#[async_trait]
impl TopicScorer for OnnxZeroShotScorer {
    /// One forward pass over every (text, hypothesis) pair.
    ///
    /// Tokenization and inference are CPU-bound, so they run on a blocking
    /// thread to keep the async runtime responsive. A job whose caller has
    /// already given up (timed out) skips the forward pass.
    async fn score(&self, text: &str, labels: &[String]) -> Result<LabelScores> {
        if labels.is_empty() {
            return Ok(LabelScores::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();
        let labels = labels.to_vec();
        let nli = self.nli;
        let pad_id = self.pad_id as i64;

        spawn_abandonable(move |caller| {
            if caller.is_gone() {
                anyhow::bail!("Inference abandoned before tokenization");
            }

            let encodings: Vec<_> = labels
                .iter()
                .map(|label| {
                    let hypothesis = HYPOTHESIS_TEMPLATE.replace("{}", label);
                    tokenizer
                        .encode((text.as_str(), hypothesis.as_str()), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

            // Right-pad every pair to max_len. Shape: [batch_size, max_len]
            let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

            for enc in &encodings {
                let seq_len = enc.get_ids().len();
                input_ids_flat.extend(enc.get_ids().iter().map(|&id| id as i64));
                attention_mask_flat.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
                for _ in seq_len..max_len {
                    input_ids_flat.push(pad_id);
                    attention_mask_flat.push(0);
                }
            }

            let shape = [batch_size as i64, max_len as i64];

            let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                // Waiting for the lock can outlast the caller's timeout
                if caller.is_gone() {
                    debug!("Caller gone while queued for the session, skipping inference");
                    anyhow::bail!("Inference abandoned while waiting for the session");
                }

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [batch_size, num_classes]
                let (_out_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            if logits.len() != batch_size * nli.num_classes {
                anyhow::bail!(
                    "Unexpected logits size {} for {} pairs of {} classes",
                    logits.len(),
                    batch_size,
                    nli.num_classes
                );
            }

            let mut scores = LabelScores::with_capacity(batch_size);
            for (i, label) in labels.into_iter().enumerate() {
                let row = &logits[i * nli.num_classes..(i + 1) * nli.num_classes];
                let score = entailment_probability(
                    row[nli.entailment] as f64,
                    row[nli.contradiction] as f64,
                );
                debug!(label = %label, score, "ONNX scored label");
                scores.insert(label, score);
            }

            Ok(scores)
        })
        .await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Softmax over just the entailment and contradiction logits, returning
/// the entailment side.
fn entailment_probability(entailment: f64, contradiction: f64) -> f64 {
    // 1 / (1 + e^(c - e)) is the two-class softmax, stable for large logits
    1.0 / (1.0 + (contradiction - entailment).exp())
}

/// Find the entailment and contradiction output positions in the model's
/// `config.json`.
fn parse_nli_labels(config_json: &str) -> Result<NliLabels> {
    let config: ModelConfig =
        serde_json::from_str(config_json).context("Failed to parse model config.json")?;

    // label2id keys can be mixed case ("ENTAILMENT"), so normalize
    let mut by_name: HashMap<String, usize> = config
        .label2id
        .iter()
        .map(|(name, &id)| (name.to_lowercase(), id))
        .collect();
    if by_name.is_empty() {
        for (id, name) in &config.id2label {
            let id: usize = id
                .parse()
                .with_context(|| format!("Invalid id2label key '{id}'"))?;
            by_name.insert(name.to_lowercase(), id);
        }
    }

    let entailment = *by_name
        .get("entailment")
        .context("Model config has no 'entailment' label; is this an NLI model?")?;
    let contradiction = *by_name
        .get("contradiction")
        .context("Model config has no 'contradiction' label; is this an NLI model?")?;
    let num_classes = by_name.values().max().map(|m| m + 1).unwrap_or(0);

    Ok(NliLabels {
        entailment,
        contradiction,
        num_classes,
    })
}
