// Client-side rate limiter for the hosted inference API.
//
// Free inference tiers throttle aggressively, so the remote scorer can be
// told to space its requests out. One request is let through per interval;
// callers that arrive early sleep until their slot.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{Duration, Instant};

/// Enforces a maximum request rate across all clones.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    /// Minimum time between requests
    interval: Duration,
    /// Earliest time the next request may go out
    next_slot: Option<Instant>,
}

/// A reserved slot. Dropped before its time comes (the caller timed out),
/// it hands the slot back if nobody has queued behind it.
struct Reservation<'a> {
    limiter: &'a RateLimiter,
    slot: Instant,
    used: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.used {
            return;
        }
        let mut inner = self.limiter.lock();
        if inner.next_slot == Some(self.slot + inner.interval) {
            inner.next_slot = Some(self.slot);
        }
    }
}

impl RateLimiter {
    /// Allow `requests_per_second` requests per second. Must be positive.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                next_slot: None,
            })),
        }
    }

    /// Wait until a request is allowed, then return.
    ///
    /// The slot is reserved while holding the lock and the sleep happens
    /// after releasing it, so concurrent callers queue up one interval apart.
    /// Cancelling the wait gives the slot back when it was the last one taken.
    pub async fn acquire(&self) {
        let slot = {
            let mut inner = self.lock();
            let now = Instant::now();
            let slot = match inner.next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            inner.next_slot = Some(slot + inner.interval);
            slot
        };

        let mut reservation = Reservation {
            limiter: self,
            slot,
            used: false,
        };
        tokio::time::sleep_until(slot).await;
        reservation.used = true;
    }

    // Never held across an await, and nothing inside can panic
    fn lock(&self) -> std::sync::MutexGuard<'_, RateLimiterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
