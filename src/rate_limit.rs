//! In-memory rate limiting for image uploads.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<IpAddr, VecDeque<Instant>>`.
//! One limit is enforced: at most `limit` uploads per client address within
//! `window` (10 per 10 minutes by default). Rejected attempts are not
//! recorded, so a client that keeps retrying is released as soon as its
//! oldest accepted upload leaves the window.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_UPLOAD_RATE_LIMIT, DEFAULT_UPLOAD_RATE_WINDOW_SECS};

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Upload too many times, slow down.")]
pub struct RateLimitError {
    pub limit: usize,
    pub window_secs: u64,
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<IpAddr, VecDeque<Instant>>>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), limit, window }
    }

    /// Check the client's window, then record the request.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] when the client already used its quota.
    pub fn check_and_record(&self, client: IpAddr) -> Result<(), RateLimitError> {
        self.check_and_record_at(client, Instant::now())
    }

    /// Internal: check + record with explicit timestamp (for testing).
    fn check_and_record_at(&self, client: IpAddr, now: Instant) -> Result<(), RateLimitError> {
        let mut clients = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // Drop idle clients so the map does not grow without bound.
        clients.retain(|_, deque| {
            prune_window(deque, now, self.window);
            !deque.is_empty()
        });

        let deque = clients.entry(client).or_default();
        if deque.len() >= self.limit {
            return Err(RateLimitError { limit: self.limit, window_secs: self.window.as_secs() });
        }
        deque.push_back(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_RATE_LIMIT, Duration::from_secs(DEFAULT_UPLOAD_RATE_WINDOW_SECS))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) >= window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
