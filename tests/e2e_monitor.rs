//! End-to-end tests for the monitor through the `Guard` facade.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use inguard::{Config, Guard, MonitorConfig, RiskLevel, ThreatCategory};
use serde_json::json;

fn guard() -> Guard {
    Guard::new(Config::default()).unwrap()
}

#[test]
fn test_rate_limit_denies_51st_access() {
    let guard = guard();
    let now = Instant::now();

    for i in 0..50 {
        let verdict = guard
            .monitor()
            .record_access_at("actor-1", "orders", "read", now);
        assert!(verdict.allowed, "access {} denied", i + 1);
    }

    let verdict = guard
        .monitor()
        .record_access_at("actor-1", "orders", "read", now);
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, Some(ThreatCategory::RateLimitExceeded));

    let report = guard.report();
    assert_eq!(report.summary.stats.rate_limit_hits, 1);
    assert!(!report.compliance.no_unauthorized_access);
}

#[test]
fn test_structured_secret_never_stored() {
    let guard = guard();
    let verdict = guard
        .check_value("actor-2", &json!({"password": "secret123"}))
        .unwrap();
    assert!(!verdict.allowed);

    let report = guard.report();
    let categories: Vec<_> = report.recent_events.iter().map(|e| e.category).collect();
    assert!(
        categories.contains(&ThreatCategory::SensitiveFieldAccess)
            || categories.contains(&ThreatCategory::DataLeak)
    );
    for event in &report.recent_events {
        let context = serde_json::to_string(&event.context).unwrap();
        assert!(!context.contains("secret123"));
        assert!(!event.evidence.contains("secret123"));
    }

    assert_eq!(report.summary.risk_level, RiskLevel::Critical);
    assert!(!report.compliance.no_sensitive_exposure);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.kind == "DATA_ENCRYPTION"));
}

#[test]
fn test_clean_traffic_is_low_risk() {
    let guard = guard();
    for i in 0..20 {
        let text = format!("order {i} shipped");
        assert!(guard.check_text("actor-3", &text, &json!({})).unwrap().allowed);
    }

    let report = guard.report();
    assert_eq!(report.summary.risk_level, RiskLevel::Low);
    assert!(report.recent_events.is_empty());
    assert!(!report.compliance.audit_trail_nonempty);
    assert_eq!(report.recommendations[0].kind, "STATUS");
}

#[test]
fn test_concurrent_checks() {
    let guard = Arc::new(guard());

    thread::scope(|s| {
        for t in 0..8 {
            let guard = Arc::clone(&guard);
            s.spawn(move || {
                for i in 0..50 {
                    let actor = format!("actor-{t}");
                    let text = if i % 5 == 0 {
                        "1 union select name from accounts"
                    } else {
                        "hello"
                    };
                    guard.check_text(&actor, text, &json!({"i": i})).unwrap();
                }
            });
        }
    });

    let stats = guard.monitor().stats();
    assert_eq!(stats.total_checked(), 400);
    assert_eq!(stats.blocked(), 80);
    assert_eq!(stats.injection_attempts(), 80);
    assert_eq!(guard.monitor().event_count(), 80);
}

#[test]
fn test_concurrent_rate_limit_is_per_actor() {
    let guard = Arc::new(guard());
    let now = Instant::now();

    thread::scope(|s| {
        for t in 0..4 {
            let guard = Arc::clone(&guard);
            s.spawn(move || {
                let actor = format!("actor-{t}");
                for _ in 0..60 {
                    guard
                        .monitor()
                        .record_access_at(&actor, "files", "list", now);
                }
            });
        }
    });

    // 10 denials per actor
    assert_eq!(guard.monitor().stats().rate_limit_hits(), 40);
}

#[test]
fn test_event_log_bounded() {
    let config = Config {
        monitor: MonitorConfig {
            max_events: 10,
            report_events: 5,
            ..MonitorConfig::default()
        },
        ..Config::default()
    };
    let guard = Guard::new(config).unwrap();

    for _ in 0..30 {
        guard.check_text("a", "${jndi:ldap://x/y}", &json!({})).unwrap();
    }

    assert_eq!(guard.monitor().event_count(), 10);
    assert_eq!(guard.report().recent_events.len(), 5);
}

#[test]
fn test_audit_log_lines() {
    let guard = guard();
    let lines = [
        "2024-05-01T10:00:00Z INFO GET /health 200",
        "2024-05-01T10:00:01Z INFO GET /search?q=${jndi:ldap://a/b} 200",
        "2024-05-01T10:00:02Z WARN rate limit exceeded for 10.1.2.3",
        "2024-05-01T10:00:03Z INFO GET /?q=<script>alert(1)</script> 400",
    ];

    let suspicious = lines
        .iter()
        .filter(|line| guard.analyze_log_entry(line))
        .count();
    assert_eq!(suspicious, 2);

    let report = guard.report();
    assert_eq!(report.summary.stats.total_checked, 4);
    assert_eq!(report.summary.stats.rate_limit_hits, 1);
    // Contained evidence never carries raw markup
    for event in &report.recent_events {
        assert!(!event.evidence.contains('<'));
    }
}
