// Timeout and concurrency limits around any scorer.
//
// Deployment policy lives here rather than in the pipeline: the server wraps
// its scorer in a BoundedScorer and the classifier never knows.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::warn;

use super::traits::TopicScorer;
use crate::classify::models::LabelScores;

/// A scorer that runs at most `max_concurrent` inferences at once and gives
/// up on any single call after `timeout`.
pub struct BoundedScorer {
    inner: Arc<dyn TopicScorer>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl BoundedScorer {
    pub fn new(inner: Arc<dyn TopicScorer>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    async fn score_with_permit(&self, text: &str, labels: &[String]) -> Result<LabelScores> {
        let _permit = self
            .permits
            .acquire()
            .await
            .context("Inference semaphore closed")?;
        self.inner.score(text, labels).await
    }
}

#[async_trait]
impl TopicScorer for BoundedScorer {
    /// The timeout covers both waiting for a permit and the inference itself.
    async fn score(&self, text: &str, labels: &[String]) -> Result<LabelScores> {
        match tokio::time::timeout(self.timeout, self.score_with_permit(text, labels)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    model = self.inner.model_name(),
                    "Scoring timed out"
                );
                anyhow::bail!("Scoring timed out after {:?}", self.timeout)
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;
    use crate::scorer::blocking::spawn_abandonable;

    /// Sleeps, then scores every label 0.5, tracking peak concurrency.
    struct SlowScorer {
        delay: Duration,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowScorer {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TopicScorer for SlowScorer {
        async fn score(&self, _text: &str, labels: &[String]) -> Result<LabelScores> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(labels.iter().map(|l| (l.clone(), 0.5)).collect())
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    fn labels() -> Vec<String> {
        vec!["a".to_string()]
    }

    #[tokio::test]
    async fn test_passes_through_when_fast() {
        let inner = Arc::new(SlowScorer::new(Duration::from_millis(1)));
        let bounded = BoundedScorer::new(inner, 2, Duration::from_secs(5));
        let scores = bounded.score("text", &labels()).await.unwrap();
        assert_eq!(scores["a"], 0.5);
        assert_eq!(bounded.model_name(), "slow");
    }

    #[tokio::test]
    async fn test_times_out() {
        let inner = Arc::new(SlowScorer::new(Duration::from_secs(5)));
        let bounded = BoundedScorer::new(inner, 1, Duration::from_millis(20));
        let err = bounded.score("text", &labels()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_limits_concurrency() {
        let inner = Arc::new(SlowScorer::new(Duration::from_millis(30)));
        let bounded = BoundedScorer::new(inner.clone(), 2, Duration::from_secs(5));
        let l = labels();
        let (a, b, c, d) = tokio::join!(
            bounded.score("1", &l),
            bounded.score("2", &l),
            bounded.score("3", &l),
            bounded.score("4", &l),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());
        assert_eq!(inner.peak.load(Ordering::SeqCst), 2);
    }

    /// Shape of the ONNX scorer: one session behind a std Mutex, worked on
    /// from the blocking pool.
    struct SessionLockScorer {
        session: Arc<std::sync::Mutex<()>>,
        work: Duration,
        ran: Arc<AtomicUsize>,
        skipped: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TopicScorer for SessionLockScorer {
        async fn score(&self, _text: &str, labels: &[String]) -> Result<LabelScores> {
            let session = Arc::clone(&self.session);
            let ran = Arc::clone(&self.ran);
            let skipped = Arc::clone(&self.skipped);
            let work = self.work;
            let labels = labels.to_vec();

            spawn_abandonable(move |caller| {
                let _session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;
                if caller.is_gone() {
                    skipped.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("abandoned");
                }
                ran.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(work);
                Ok(labels.into_iter().map(|l| (l, 0.5)).collect())
            })
            .await
        }

        fn model_name(&self) -> &str {
            "session-lock"
        }
    }

    #[tokio::test]
    async fn test_timed_out_calls_do_not_queue_work_for_later_requests() {
        let inner = Arc::new(SessionLockScorer {
            session: Arc::new(std::sync::Mutex::new(())),
            work: Duration::from_millis(200),
            ran: Arc::new(AtomicUsize::new(0)),
            skipped: Arc::new(AtomicUsize::new(0)),
        });
        let impatient = BoundedScorer::new(inner.clone(), 1, Duration::from_millis(50));

        for _ in 0..5 {
            let err = impatient.score("text", &labels()).await.unwrap_err();
            assert!(err.to_string().contains("timed out"));
        }

        // Let whatever inference is still in flight finish
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(inner.ran.load(Ordering::SeqCst) <= 2);
        assert!(inner.skipped.load(Ordering::SeqCst) >= 3);

        let patient = BoundedScorer::new(inner.clone(), 1, Duration::from_secs(2));
        let start = Instant::now();
        let scores = patient.score("text", &labels()).await.unwrap();
        let elapsed = start.elapsed();
        assert_eq!(scores["a"], 0.5);
        assert!(
            elapsed < Duration::from_millis(400),
            "waited behind abandoned work: {:?}",
            elapsed
        );
    }
}
