//! Event and risk aggregator.
//!
//! The [`Monitor`] owns the only mutable state in the crate:
//!
//! - **Counters** ([`SecurityStats`]): lock-free atomics, monotonic.
//! - **Event log**: a capped deque behind one mutex. Beyond
//!   `max_events` the oldest event is dropped; reports read only the last
//!   `report_events` entries.
//! - **Rate limiter** ([`SlidingWindow`]): keyed by hashed actor id, behind
//!   its own mutex. Holds at most `rate_limit_threshold` timestamps per actor
//!   and sweeps idle actors as accesses arrive.
//!
//! Raw actor ids never reach the log, the events, or tracing output.
//!
//! # Example
//!
//! ```
//! use inguard::config::MonitorConfig;
//! use inguard::monitor::Monitor;
//!
//! let monitor = Monitor::new(MonitorConfig::default());
//! let verdict = monitor.record_access("user-1", "users", "read");
//! assert!(verdict.allowed);
//! ```

pub mod event;
pub mod rate_limit;
pub mod report;
pub mod stats;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::config::MonitorConfig;
use crate::security::{PatternMatch, Severity, ThreatCategory};
pub use event::{contain, hash_actor_id, SecurityEvent};
pub use rate_limit::{SlidingWindow, WindowDecision};
pub use report::{Compliance, Priority, Recommendation, Report, ReportSummary, RiskLevel};
pub use stats::{SecurityStats, StatsSummary};

/// Outcome of a check or access, returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Whether the caller should proceed
    pub allowed: bool,
    /// Category of the first match, when denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ThreatCategory>,
    /// Id of the first event recorded for this outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl Verdict {
    /// An allow verdict
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            event_id: None,
        }
    }

    /// A deny verdict
    pub fn deny(reason: ThreatCategory, event_id: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            event_id: Some(event_id),
        }
    }
}

/// Event and risk aggregator. Share it behind an `Arc`.
#[derive(Debug)]
pub struct Monitor {
    config: MonitorConfig,
    stats: SecurityStats,
    events: Mutex<VecDeque<SecurityEvent>>,
    limiter: Mutex<SlidingWindow>,
}

impl Monitor {
    /// Create a monitor
    pub fn new(config: MonitorConfig) -> Self {
        let limiter = SlidingWindow::new(
            config.rate_limit_threshold,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        Self {
            events: Mutex::new(VecDeque::with_capacity(config.max_events.min(1024))),
            limiter: Mutex::new(limiter),
            stats: SecurityStats::new(),
            config,
        }
    }

    /// Counters
    pub fn stats(&self) -> &SecurityStats {
        &self.stats
    }

    /// Record a classification outcome for `actor_id`.
    ///
    /// Every match becomes one event. The verdict denies on any match and
    /// carries the first match's category.
    pub fn record_check(&self, actor_id: &str, matches: &[PatternMatch], context: &Value) -> Verdict {
        self.stats.record_checked();
        if matches.is_empty() {
            return Verdict::allow();
        }
        self.stats.record_blocked();

        let actor_hash = hash_actor_id(actor_id);
        let mut first_id = None;
        for m in matches {
            self.stats.record_match(m.category, m.severity);
            let event = SecurityEvent::new(&actor_hash, m.category, m.severity, &m.evidence, context);
            if first_id.is_none() {
                first_id = Some(event.id.clone());
            }
            self.push_event(event);
        }

        Verdict {
            allowed: false,
            reason: matches.first().map(|m| m.category),
            event_id: first_id,
        }
    }

    /// Record an access by `actor_id`. Denies once the actor exceeds the
    /// rate limit within the window.
    pub fn record_access(&self, actor_id: &str, resource: &str, operation: &str) -> Verdict {
        self.record_access_at(actor_id, resource, operation, Instant::now())
    }

    /// [`Monitor::record_access`] at an explicit instant
    pub fn record_access_at(
        &self,
        actor_id: &str,
        resource: &str,
        operation: &str,
        now: Instant,
    ) -> Verdict {
        let actor_hash = hash_actor_id(actor_id);
        let decision = lock(&self.limiter).hit_at(&actor_hash, now);
        if decision.is_allowed() {
            return Verdict::allow();
        }

        self.stats.record_rate_limit_hit();
        let event = SecurityEvent::new(
            actor_hash,
            ThreatCategory::RateLimitExceeded,
            Severity::High,
            &format!("{} accesses within {}s", decision.count(), self.config.rate_limit_window_secs),
            &json!({ "resource": resource, "operation": operation }),
        );
        let id = event.id.clone();
        self.push_event(event);
        Verdict::deny(ThreatCategory::RateLimitExceeded, id)
    }

    /// Note a rate limit hit reported by a log line from `source`
    pub fn record_logged_rate_limit(&self, source: &str, line: &str) -> String {
        self.stats.record_rate_limit_hit();
        let event = SecurityEvent::new(
            hash_actor_id(source),
            ThreatCategory::RateLimitExceeded,
            Severity::Medium,
            line,
            &Value::Null,
        );
        let id = event.id.clone();
        self.push_event(event);
        id
    }

    /// Build a report over the current counters and the recent event window
    pub fn report(&self) -> Report {
        let (recent, recorded) = {
            let events = lock(&self.events);
            let skip = events.len().saturating_sub(self.config.report_events);
            (events.iter().skip(skip).cloned().collect(), events.len())
        };
        Report::build(self.stats.summary(), recent, recorded)
    }

    /// Number of events currently held
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Forget actors with no access inside the window now, without waiting
    /// for the limiter's periodic sweep
    pub fn prune_idle_actors(&self) {
        lock(&self.limiter).prune(Instant::now());
    }

    /// Number of actors the rate limiter currently tracks
    pub fn tracked_actors(&self) -> usize {
        lock(&self.limiter).tracked()
    }

    fn push_event(&self, event: SecurityEvent) {
        if event.severity == Severity::Critical {
            error!(
                event_id = %event.id,
                category = %event.category,
                severity = %event.severity,
                actor = %event.actor_hash,
                evidence = %event.evidence,
                "critical security event"
            );
        } else {
            warn!(
                event_id = %event.id,
                category = %event.category,
                severity = %event.severity,
                actor = %event.actor_hash,
                "security event"
            );
        }

        let mut events = lock(&self.events);
        events.push_back(event);
        while events.len() > self.config.max_events {
            events.pop_front();
        }
    }
}

/// Lock a mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Classifier;

    fn monitor() -> Monitor {
        Monitor::new(MonitorConfig::default())
    }

    #[test]
    fn test_record_clean_check() {
        let monitor = monitor();
        let verdict = monitor.record_check("u", &[], &Value::Null);
        assert_eq!(verdict, Verdict::allow());
        assert_eq!(monitor.stats().total_checked(), 1);
        assert_eq!(monitor.stats().blocked(), 0);
        assert_eq!(monitor.event_count(), 0);
    }

    #[test]
    fn test_record_check_with_matches() {
        let monitor = monitor();
        let classifier = Classifier::new().unwrap();
        let matches = classifier.classify("' OR 1=1; drop table users --");

        let verdict = monitor.record_check("u", &matches, &Value::Null);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, Some(ThreatCategory::SqlInjection));
        assert!(verdict.event_id.unwrap().starts_with("sec_"));
        assert_eq!(monitor.event_count(), matches.len());
        assert_eq!(monitor.stats().blocked(), 1);
    }

    #[test]
    fn test_event_log_capped() {
        let config = MonitorConfig {
            max_events: 3,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::new(config);
        let classifier = Classifier::new().unwrap();
        let matches = classifier.classify("${x}");

        for _ in 0..5 {
            monitor.record_check("u", &matches, &Value::Null);
        }
        assert_eq!(monitor.event_count(), 3);
        assert_eq!(monitor.stats().total_checked(), 5);
    }

    #[test]
    fn test_rate_limit_boundary() {
        let monitor = monitor();
        let now = Instant::now();

        for _ in 0..50 {
            assert!(monitor.record_access_at("alice", "users", "read", now).allowed);
        }
        let verdict = monitor.record_access_at("alice", "users", "read", now);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, Some(ThreatCategory::RateLimitExceeded));
        assert_eq!(monitor.stats().rate_limit_hits(), 1);

        // Another actor is unaffected
        assert!(monitor.record_access_at("bob", "users", "read", now).allowed);
    }

    #[test]
    fn test_idle_actors_swept_by_accesses() {
        let config = MonitorConfig {
            rate_limit_window_secs: 10,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::new(config);
        let start = Instant::now();

        for i in 0..40 {
            monitor.record_access_at(&format!("actor-{i}"), "users", "read", start);
        }
        assert_eq!(monitor.tracked_actors(), 40);

        let later = start + Duration::from_secs(60);
        for _ in 0..rate_limit::PRUNE_EVERY {
            monitor.record_access_at("busy", "users", "read", later);
        }
        assert_eq!(monitor.tracked_actors(), 1);
    }

    #[test]
    fn test_prune_idle_actors() {
        let config = MonitorConfig {
            rate_limit_window_secs: 0,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::new(config);
        monitor.record_access("alice", "users", "read");
        assert_eq!(monitor.tracked_actors(), 1);

        monitor.prune_idle_actors();
        assert_eq!(monitor.tracked_actors(), 0);
    }

    #[test]
    fn test_logged_rate_limit() {
        let monitor = monitor();
        let id = monitor.record_logged_rate_limit("nginx", "WARN rate limit exceeded for 10.0.0.1");
        assert!(id.starts_with("sec_"));
        assert_eq!(monitor.stats().rate_limit_hits(), 1);

        let report = monitor.report();
        let event = &report.recent_events[0];
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.actor_hash, hash_actor_id("nginx"));
        assert!(!report.compliance.no_unauthorized_access);
    }

    #[test]
    fn test_report_window() {
        let config = MonitorConfig {
            report_events: 2,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::new(config);
        let classifier = Classifier::new().unwrap();
        let matches = classifier.classify("union select 1");
        assert_eq!(matches.len(), 1);

        for _ in 0..4 {
            monitor.record_check("u", &matches, &Value::Null);
        }
        let report = monitor.report();
        assert_eq!(report.recent_events.len(), 2);
        assert!(report.compliance.audit_trail_nonempty);
        assert_eq!(report.summary.stats.injection_attempts, 4);
        assert_eq!(report.summary.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_actor_id_not_stored() {
        let monitor = monitor();
        let classifier = Classifier::new().unwrap();
        let matches = classifier.classify("<script>");
        monitor.record_check("alice@example.com", &matches, &json!({"user": "x"}));

        let json = serde_json::to_string(&monitor.report()).unwrap();
        assert!(!json.contains("alice@example.com"));
        assert!(json.contains(&hash_actor_id("alice@example.com")));
    }
}
