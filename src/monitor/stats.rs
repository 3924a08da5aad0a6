//! Security statistics tracking.
//!
//! Counters only ever increase; there is no reset.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::security::{Severity, ThreatCategory};

/// Thread-safe security counters
#[derive(Debug)]
pub struct SecurityStats {
    /// Inputs classified
    total_checked: AtomicU64,
    /// Inputs with at least one match
    blocked: AtomicU64,
    /// Injection-family matches
    injection_attempts: AtomicU64,
    /// `DATA_LEAK` matches
    data_leak_attempts: AtomicU64,
    /// Sensitive field access and Critical leaks
    sensitive_exposures: AtomicU64,
    /// Denied accesses and logged rate limit hits
    rate_limit_hits: AtomicU64,
    /// One counter per [`ThreatCategory`]
    per_category: [AtomicU64; ThreatCategory::ALL.len()],
    /// Start time
    started_at: Instant,
}

impl Default for SecurityStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            total_checked: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            injection_attempts: AtomicU64::new(0),
            data_leak_attempts: AtomicU64::new(0),
            sensitive_exposures: AtomicU64::new(0),
            rate_limit_hits: AtomicU64::new(0),
            per_category: std::array::from_fn(|_| AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    /// Record a classified input
    pub fn record_checked(&self) {
        self.total_checked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an input that produced matches
    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one match
    pub fn record_match(&self, category: ThreatCategory, severity: Severity) {
        self.per_category[category.index()].fetch_add(1, Ordering::Relaxed);

        if category.is_injection() {
            self.injection_attempts.fetch_add(1, Ordering::Relaxed);
        }
        if category == ThreatCategory::DataLeak {
            self.data_leak_attempts.fetch_add(1, Ordering::Relaxed);
        }
        let exposed = category == ThreatCategory::SensitiveFieldAccess
            || (category == ThreatCategory::DataLeak && severity == Severity::Critical);
        if exposed {
            self.sensitive_exposures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a rate limit hit
    pub fn record_rate_limit_hit(&self) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        self.per_category[ThreatCategory::RateLimitExceeded.index()]
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Get total checked
    pub fn total_checked(&self) -> u64 {
        self.total_checked.load(Ordering::Relaxed)
    }

    /// Get blocked count
    pub fn blocked(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    /// Get injection attempts
    pub fn injection_attempts(&self) -> u64 {
        self.injection_attempts.load(Ordering::Relaxed)
    }

    /// Get data leak attempts
    pub fn data_leak_attempts(&self) -> u64 {
        self.data_leak_attempts.load(Ordering::Relaxed)
    }

    /// Get sensitive exposures
    pub fn sensitive_exposures(&self) -> u64 {
        self.sensitive_exposures.load(Ordering::Relaxed)
    }

    /// Get rate limit hits
    pub fn rate_limit_hits(&self) -> u64 {
        self.rate_limit_hits.load(Ordering::Relaxed)
    }

    /// Get the counter for one category
    pub fn category_count(&self, category: ThreatCategory) -> u64 {
        self.per_category[category.index()].load(Ordering::Relaxed)
    }

    /// Share of checks that were blocked, leaked, or rate limited
    pub fn risk_ratio(&self) -> f64 {
        let incidents = self.blocked() + self.data_leak_attempts() + self.rate_limit_hits();
        incidents as f64 / self.total_checked().max(1) as f64
    }

    /// Get summary as JSON-compatible struct
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            total_checked: self.total_checked(),
            blocked: self.blocked(),
            injection_attempts: self.injection_attempts(),
            data_leak_attempts: self.data_leak_attempts(),
            sensitive_exposures: self.sensitive_exposures(),
            rate_limit_hits: self.rate_limit_hits(),
            per_category: ThreatCategory::ALL
                .iter()
                .map(|c| (*c, self.category_count(*c)))
                .filter(|(_, n)| *n > 0)
                .collect(),
            risk_ratio: self.risk_ratio(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}

/// Statistics summary for serialization.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatsSummary {
    /// Inputs classified.
    pub total_checked: u64,
    /// Inputs with at least one match.
    pub blocked: u64,
    /// Injection-family matches.
    pub injection_attempts: u64,
    /// Data leak matches.
    pub data_leak_attempts: u64,
    /// Sensitive field access and Critical leaks.
    pub sensitive_exposures: u64,
    /// Rate limit hits.
    pub rate_limit_hits: u64,
    /// Nonzero per-category counters.
    pub per_category: BTreeMap<ThreatCategory, u64>,
    /// (blocked + leaks + rate limit hits) / checked.
    pub risk_ratio: f64,
    /// Monitor uptime in seconds.
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_recording() {
        let stats = SecurityStats::new();

        stats.record_checked();
        stats.record_checked();
        stats.record_blocked();
        stats.record_match(ThreatCategory::SqlInjection, Severity::High);
        stats.record_match(ThreatCategory::BulkDataAccess, Severity::Medium);

        assert_eq!(stats.total_checked(), 2);
        assert_eq!(stats.blocked(), 1);
        assert_eq!(stats.injection_attempts(), 1);
        assert_eq!(stats.sensitive_exposures(), 0);
        assert_eq!(stats.category_count(ThreatCategory::BulkDataAccess), 1);
    }

    #[test]
    fn test_sensitive_exposures() {
        let stats = SecurityStats::new();

        stats.record_match(ThreatCategory::DataLeak, Severity::High);
        assert_eq!(stats.sensitive_exposures(), 0);
        assert_eq!(stats.data_leak_attempts(), 1);

        stats.record_match(ThreatCategory::DataLeak, Severity::Critical);
        stats.record_match(ThreatCategory::SensitiveFieldAccess, Severity::Critical);
        assert_eq!(stats.sensitive_exposures(), 2);
    }

    #[test]
    fn test_risk_ratio() {
        let stats = SecurityStats::new();
        assert_eq!(stats.risk_ratio(), 0.0);

        for _ in 0..10 {
            stats.record_checked();
        }
        stats.record_blocked();
        stats.record_rate_limit_hit();

        assert!((stats.risk_ratio() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary() {
        let stats = SecurityStats::new();
        stats.record_checked();
        stats.record_rate_limit_hit();

        let summary = stats.summary();
        assert_eq!(summary.total_checked, 1);
        assert_eq!(summary.rate_limit_hits, 1);
        assert_eq!(
            summary.per_category.get(&ThreatCategory::RateLimitExceeded),
            Some(&1)
        );
        assert_eq!(summary.per_category.len(), 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["per_category"]["RATE_LIMIT_EXCEEDED"], 1);
    }
}
