//! Inter-request delay enforcement
//!
//! The VK API allows roughly three calls per second per token. A `Throttle`
//! remembers when the previous call went out and makes the next caller wait
//! until the minimum delay has elapsed. The wait happens before a request, so
//! nothing waits after the final page of a sequence.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks the last request time for one API caller
#[derive(Debug, Clone)]
pub struct Throttle {
    min_delay: Duration,
    last_request_time: Option<Instant>,
    request_count: u64,
}

impl Throttle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request_time: None,
            request_count: 0,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_delay {
            Some(self.min_delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was made
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Sleeps until a request is allowed, then records it
    pub async fn acquire(&mut self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Throttling next API call for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.record_request(Instant::now());
    }

    /// Number of requests recorded so far
    pub fn request_count(&self) -> u64 {
        self.request_count
    }
}
