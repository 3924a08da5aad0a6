//! Security reports: risk level, recommendations and compliance snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::event::SecurityEvent;
use super::stats::StatsSummary;

/// Aggregate risk, derived from counters on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Nothing notable
    Low,
    /// Occasional incidents or any leak attempt
    Medium,
    /// Frequent incidents or repeated injection
    High,
    /// Sensitive exposure or incident ratio above 10%
    Critical,
}

impl RiskLevel {
    /// Derive the risk level from a stats snapshot
    pub fn assess(stats: &StatsSummary) -> Self {
        let ratio = stats.risk_ratio;
        if stats.sensitive_exposures > 0 || ratio > 0.1 {
            RiskLevel::Critical
        } else if ratio > 0.05 || stats.injection_attempts > 10 {
            RiskLevel::High
        } else if ratio > 0.01 || stats.data_leak_attempts > 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// No action needed
    Info,
    /// Plan a fix
    Medium,
    /// Fix soon
    High,
    /// Fix now
    Critical,
}

/// A follow-up action derived from the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Recommendation type, e.g. `INJECTION_PROTECTION`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Human-readable action
    pub message: &'static str,
    /// Priority
    pub priority: Priority,
}

/// Build recommendations, one per nonzero incident counter
pub fn recommendations(stats: &StatsSummary) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if stats.injection_attempts > 0 {
        recs.push(Recommendation {
            kind: "INJECTION_PROTECTION",
            message: "Use parameterized queries and validate all input.",
            priority: Priority::High,
        });
    }
    if stats.sensitive_exposures > 0 {
        recs.push(Recommendation {
            kind: "DATA_ENCRYPTION",
            message: "Encrypt sensitive data and classify stored fields.",
            priority: Priority::Critical,
        });
    }
    if stats.data_leak_attempts > 0 {
        recs.push(Recommendation {
            kind: "ACCESS_CONTROL",
            message: "Tighten access control and add data loss prevention.",
            priority: Priority::High,
        });
    }
    if stats.rate_limit_hits > 0 {
        recs.push(Recommendation {
            kind: "AUTHENTICATION",
            message: "Add multi-factor authentication and session monitoring.",
            priority: Priority::Medium,
        });
    }

    if recs.is_empty() {
        recs.push(Recommendation {
            kind: "STATUS",
            message: "All security checks passed. Monitoring is running normally.",
            priority: Priority::Info,
        });
    }

    recs
}

/// Compliance snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compliance {
    /// No sensitive field was exposed
    pub no_sensitive_exposure: bool,
    /// No data leak was attempted
    pub no_leak_attempts: bool,
    /// No actor exceeded the access rate
    pub no_unauthorized_access: bool,
    /// At least one event was recorded
    pub audit_trail_nonempty: bool,
    /// Follow-up notes
    pub notes: Vec<&'static str>,
}

impl Compliance {
    /// Snapshot compliance from counters and the event log size
    pub fn check(stats: &StatsSummary, events_recorded: usize) -> Self {
        let notes = if stats.sensitive_exposures > 0 {
            vec!["Implement data encryption", "Review data access policies"]
        } else {
            vec!["Continue current security practices"]
        };

        Self {
            no_sensitive_exposure: stats.sensitive_exposures == 0,
            no_leak_attempts: stats.data_leak_attempts == 0,
            no_unauthorized_access: stats.rate_limit_hits == 0,
            audit_trail_nonempty: events_recorded > 0,
            notes,
        }
    }
}

/// Summary section of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Counter snapshot
    #[serde(flatten)]
    pub stats: StatsSummary,
    /// Derived risk level
    pub risk_level: RiskLevel,
}

/// Full security report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Generation time
    pub generated_at: DateTime<Utc>,
    /// Signature catalog version
    pub catalog_version: &'static str,
    /// Counters and risk level
    pub summary: ReportSummary,
    /// Most recent events, oldest first
    pub recent_events: Vec<SecurityEvent>,
    /// Follow-up actions
    pub recommendations: Vec<Recommendation>,
    /// Compliance snapshot
    pub compliance: Compliance,
}

impl Report {
    /// Assemble a report from a stats snapshot and the recent event window
    pub fn build(
        stats: StatsSummary,
        recent_events: Vec<SecurityEvent>,
        events_recorded: usize,
    ) -> Self {
        let risk_level = RiskLevel::assess(&stats);
        let recommendations = recommendations(&stats);
        let compliance = Compliance::check(&stats, events_recorded);

        Self {
            generated_at: Utc::now(),
            catalog_version: crate::security::CATALOG_VERSION,
            summary: ReportSummary { stats, risk_level },
            recent_events,
            recommendations,
            compliance,
        }
    }
}
