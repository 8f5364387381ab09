//! Sliding-window rate limiter.
//!
//! One instance per process, owned by the application state and shared by
//! reference — never a module-level global. A single coarse mutex guards the
//! whole table: the only cost of contention here is soft over/under-admission
//! under a racing burst, never corruption, and the critical section is a
//! prune-and-push over a short vec.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-identity sliding-window request counter.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Configured request ceiling per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit or reject one request for `identity`.
    ///
    /// Prunes timestamps older than the window, rejects when the pruned
    /// count has reached the ceiling, and records the admission otherwise.
    pub fn admit(&self, identity: &str) -> bool {
        let now = Instant::now();
        let mut table = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let hits = table.entry(identity.to_string()).or_default();
        hits.retain(|t| now.duration_since(*t) < self.window);
        if hits.len() >= self.limit {
            return false;
        }
        hits.push(now);
        true
    }
}
