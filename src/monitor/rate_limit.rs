//! Sliding-window access counter keyed by hashed actor id.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Accesses between opportunistic sweeps of idle keys
pub const PRUNE_EVERY: u64 = 256;

/// Per-key sliding window of access timestamps.
///
/// Only allowed accesses are stored, so a key holds at most `threshold`
/// timestamps. Keys idle for a whole window are swept every
/// [`PRUNE_EVERY`] accesses.
///
/// Not synchronized: the owner serializes access.
#[derive(Debug)]
pub struct SlidingWindow {
    window: Duration,
    threshold: usize,
    hits: HashMap<String, VecDeque<Instant>>,
    calls: u64,
}

impl SlidingWindow {
    /// Allow `threshold` accesses per key within `window`
    pub fn new(threshold: usize, window: Duration) -> Self {
        Self {
            window,
            threshold,
            hits: HashMap::new(),
            calls: 0,
        }
    }

    /// Record an access for `key` now
    pub fn hit(&mut self, key: &str) -> WindowDecision {
        self.hit_at(key, Instant::now())
    }

    /// Record an access for `key` at `now`. The access itself counts; a
    /// count above the threshold is denied and not stored.
    pub fn hit_at(&mut self, key: &str, now: Instant) -> WindowDecision {
        self.calls = self.calls.wrapping_add(1);
        if self.calls % PRUNE_EVERY == 0 {
            self.prune(now);
        }

        let window = self.window;
        let times = self.hits.entry(key.to_string()).or_default();
        while let Some(&oldest) = times.front() {
            if now.saturating_duration_since(oldest) >= window {
                times.pop_front();
            } else {
                break;
            }
        }

        if times.len() >= self.threshold {
            return WindowDecision::Denied {
                count: times.len() + 1,
            };
        }
        times.push_back(now);
        WindowDecision::Allowed { count: times.len() }
    }

    /// Drop keys with no access inside the window
    pub fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.hits.retain(|_, times| {
            times
                .back()
                .is_some_and(|&last| now.saturating_duration_since(last) < window)
        });
    }

    /// Timestamps held for `key`
    pub fn held(&self, key: &str) -> usize {
        self.hits.get(key).map_or(0, VecDeque::len)
    }

    /// Number of tracked keys
    pub fn tracked(&self) -> usize {
        self.hits.len()
    }
}

/// Outcome of a window check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Within the threshold
    Allowed {
        /// Accesses in the window, including this one
        count: usize,
    },
    /// Over the threshold
    Denied {
        /// Accesses in the window, including this one
        count: usize,
    },
}

impl WindowDecision {
    /// Check if this decision allows the access
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Accesses in the window, including this one
    pub fn count(&self) -> usize {
        match self {
            Self::Allowed { count } | Self::Denied { count } => *count,
        }
    }
}
