use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use topicsift::classify::models::ClassificationRequest;
use topicsift::classify::pipeline::Classifier;
use topicsift::config::{Config, ScorerBackend};
use topicsift::scorer::traits::TopicScorer;

/// topicsift: zero-shot topic extraction.
///
/// Scores free text against candidate topic labels and returns the ones
/// that clear the confidence threshold, ranked by confidence.
#[derive(Parser)]
#[command(name = "topicsift", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (POST /extract_keywords)
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: TOPICSIFT_PORT or 5000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: TOPICSIFT_BIND or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Classify a single text and print the ranked topics
    Classify {
        /// The text to classify
        text: String,

        /// Candidate label (repeatable). Defaults to the built-in categories.
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,

        /// Print the JSON response instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Download the ONNX zero-shot model (~400 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("topicsift=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_scorer()?;

            let scorer = create_scorer(&config)?;
            let bounded = topicsift::scorer::bounded::BoundedScorer::new(
                scorer,
                config.max_concurrent_inferences,
                config.request_timeout,
            );
            let classifier =
                Classifier::new(Arc::new(bounded)).with_threshold(config.confidence_threshold);

            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let port = port.unwrap_or(config.port);
            topicsift::web::run_server(classifier, &bind, port).await?;
        }

        Commands::Classify { text, labels, json } => {
            let config = Config::load()?;
            config.require_scorer()?;

            let classifier = Classifier::new(create_scorer(&config)?)
                .with_threshold(config.confidence_threshold);

            let labels = if labels.is_empty() { None } else { Some(labels) };
            let response = classifier
                .classify(ClassificationRequest::new(text.clone(), labels))
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                topicsift::output::terminal::display_topics(
                    &text,
                    &response.topics,
                    classifier.threshold(),
                );
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX model...");
            println!("  Destination: {}", model_dir.display());

            topicsift::scorer::download::download_model(model_dir, &config.onnx_repo).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `topicsift serve` or `topicsift classify \"some text\"`.");
        }
    }

    Ok(())
}

/// Create a topic scorer based on the configured backend.
///
/// Loading is done once, before any request is served; a model that fails
/// to load stops startup.
fn create_scorer(config: &Config) -> Result<Arc<dyn TopicScorer>> {
    match config.scorer_backend {
        ScorerBackend::Onnx => {
            info!(model = %config.model_name, "Using local ONNX zero-shot scorer");
            let scorer = topicsift::scorer::onnx::OnnxZeroShotScorer::load(
                &config.model_dir,
                &config.model_name,
            )?;
            Ok(Arc::new(scorer))
        }
        ScorerBackend::Remote => {
            info!(
                model = %config.model_name,
                url = %config.inference_url,
                "Using hosted inference API scorer"
            );
            let mut scorer = topicsift::scorer::remote::RemoteZeroShotScorer::new(
                &config.inference_url,
                &config.model_name,
                config.api_token.clone(),
            )?;
            if let Some(qps) = config.remote_qps {
                scorer = scorer.with_rate_limit(qps);
            }
            Ok(Arc::new(scorer))
        }
    }
}
