// Model download helper for the ONNX zero-shot model.
//
// Downloads the quantized NLI export, its tokenizer and its config from a
// HuggingFace repo (Xenova/bart-large-mnli by default). Files are stored in
// a platform-appropriate directory (~/.local/share/topicsift/models/ on
// Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo with an ONNX export of bart-large-mnli.
pub const DEFAULT_ONNX_REPO: &str = "Xenova/bart-large-mnli";

const HF_BASE_URL: &str = "https://huggingface.co";

/// Local file names inside the model directory.
pub const MODEL_FILE: &str = "model_quantized.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

/// Path of the ONNX weights inside the HuggingFace repo.
const REMOTE_MODEL_FILE: &str = "onnx/model_quantized.onnx";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/topicsift/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topicsift")
        .join("models")
}

/// Check whether every required model file exists.
pub fn model_files_present(dir: &Path) -> bool {
    [MODEL_FILE, TOKENIZER_FILE, CONFIG_FILE]
        .iter()
        .all(|f| dir.join(f).exists())
}

fn repo_file_url(repo: &str, file: &str) -> String {
    format!("{HF_BASE_URL}/{repo}/resolve/main/{file}")
}

/// Download the ONNX model files from `repo` into `dir`.
///
/// Shows a progress bar for the model weights. Skips files that already exist.
pub async fn download_model(dir: &Path, repo: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nZero-shot model ({repo}):");

    let files = [
        (TOKENIZER_FILE, TOKENIZER_FILE, false),
        (CONFIG_FILE, CONFIG_FILE, false),
        (REMOTE_MODEL_FILE, MODEL_FILE, true),
    ];

    for (remote, local, large) in files {
        let dest = dir.join(local);
        if dest.exists() {
            info!(file = local, "Model file already exists, skipping");
            println!("  {local} (already exists)");
            continue;
        }
        if large {
            println!("  Downloading {local} (~400 MB)...");
        } else {
            println!("  Downloading {local}...");
        }
        download_file(&repo_file_url(repo, remote), &dest, large).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        let pb = match response.content_length() {
            Some(size) => {
                let pb = ProgressBar::new(size);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .context("Invalid progress bar template")?
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner} {bytes}")
                        .context("Invalid progress bar template")?,
                );
                pb
            }
        };
        Some(pb)
    } else {
        None
    };

    // Write to a temp name first so an interrupted download isn't mistaken
    // for a complete file on the next run.
    let partial = dest.with_extension("part");
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
