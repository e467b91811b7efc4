//! Sliding-window rate limiter for a single outbound API client

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::clock::Clock;

/// Tracks request timestamps inside a trailing window.
///
/// A request is allowed only while fewer than `max_requests` timestamps
/// fall inside the window. Callers that are denied treat it as "no data"
/// instead of waiting.
pub struct RateLimiter {
    max_requests: usize,
    time_window: Duration,
    clock: Arc<dyn Clock>,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            time_window,
            clock,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    fn prune(&self, requests: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = requests.front() {
            if now.saturating_duration_since(*oldest) >= self.time_window {
                requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether another request fits in the current window
    pub fn can_make_request(&self) -> bool {
        let now = self.clock.now();
        let mut requests = self.requests.lock();
        self.prune(&mut requests, now);
        requests.len() < self.max_requests
    }

    /// Record a request the caller has committed to making
    pub fn record_request(&self) {
        let now = self.clock.now();
        self.requests.lock().push_back(now);
    }

    /// Check and record under one lock
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut requests = self.requests.lock();
        self.prune(&mut requests, now);

        if requests.len() >= self.max_requests {
            debug!(
                "Rate limit reached ({} requests in {:?})",
                requests.len(),
                self.time_window
            );
            return false;
        }

        requests.push_back(now);
        true
    }

    /// Requests currently counted against the window
    pub fn in_flight(&self) -> usize {
        let now = self.clock.now();
        let mut requests = self.requests.lock();
        self.prune(&mut requests, now);
        requests.len()
    }
}
