// Fake scorers shared by the integration tests. No model files or network.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use topicsift::classify::models::LabelScores;
use topicsift::scorer::traits::TopicScorer;

/// Returns canned scores and records every call.
pub struct FixedScorer {
    scores: LabelScores,
    /// Score for labels not in `scores`. `None` means omit them.
    fallback: Option<f64>,
    calls: AtomicUsize,
    last_call: Mutex<Option<(String, Vec<String>)>>,
}

impl FixedScorer {
    pub fn new(scores: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            scores: scores.iter().map(|(l, s)| (l.to_string(), *s)).collect(),
            fallback: Some(0.0),
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        })
    }

    /// Like `new`, but labels without a canned score are left out.
    pub fn partial(scores: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            scores: scores.iter().map(|(l, s)| (l.to_string(), *s)).collect(),
            fallback: None,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_call.lock().unwrap().as_ref().map(|(t, _)| t.clone())
    }

    pub fn last_labels(&self) -> Option<Vec<String>> {
        self.last_call.lock().unwrap().as_ref().map(|(_, l)| l.clone())
    }
}

#[async_trait]
impl TopicScorer for FixedScorer {
    async fn score(&self, text: &str, labels: &[String]) -> Result<LabelScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((text.to_string(), labels.to_vec()));

        // Build in reverse so output order never matches input order
        let mut out = LabelScores::new();
        for label in labels.iter().rev() {
            match (self.scores.get(label), self.fallback) {
                (Some(&s), _) => {
                    out.insert(label.clone(), s);
                }
                (None, Some(f)) => {
                    out.insert(label.clone(), f);
                }
                (None, None) => {}
            }
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        "fixed-test-scorer"
    }
}

/// Always fails, like an unreachable model.
pub struct FailingScorer;

#[async_trait]
impl TopicScorer for FailingScorer {
    async fn score(&self, _text: &str, _labels: &[String]) -> Result<LabelScores> {
        anyhow::bail!("model backend unreachable")
    }

    fn model_name(&self) -> &str {
        "failing-test-scorer"
    }
}

/// Panics mid-request, to exercise the boundary's catch-all.
pub struct PanickingScorer;

#[async_trait]
impl TopicScorer for PanickingScorer {
    async fn score(&self, _text: &str, _labels: &[String]) -> Result<LabelScores> {
        panic!("scorer exploded")
    }

    fn model_name(&self) -> &str {
        "panicking-test-scorer"
    }
}

/// Sleeps longer than any reasonable test timeout.
pub struct StallingScorer;

#[async_trait]
impl TopicScorer for StallingScorer {
    async fn score(&self, _text: &str, _labels: &[String]) -> Result<LabelScores> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(LabelScores::new())
    }

    fn model_name(&self) -> &str {
        "stalling-test-scorer"
    }
}
