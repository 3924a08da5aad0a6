//! Collaborator-facing entry point.
//!
//! A [`Guard`] owns the configuration, a [`Classifier`] and a [`Monitor`].
//! Construction verifies the built-in tables once, so every later call is
//! infallible apart from input validation.
//!
//! ```
//! use inguard::{Config, Guard};
//! use serde_json::json;
//!
//! let guard = Guard::new(Config::default()).unwrap();
//!
//! let verdict = guard.check_text("user-1", "'; DROP TABLE users; --", &json!({})).unwrap();
//! assert!(!verdict.allowed);
//!
//! let clean = guard.sanitize("<b>hello</b>");
//! assert_eq!(clean, "&lt;b&gt;hello&lt;&#x2F;b&gt;");
//! ```

use serde_json::Value;
use tracing::debug;

use crate::config::{Config, SanitizeConfig};
use crate::error::{Result, ValidationError};
use crate::monitor::{Monitor, Report, Verdict};
use crate::sanitize;
use crate::security::{Classifier, OutputScan, PatternMatch};
use crate::validate;

/// Source name used for log lines with no explicit origin
pub const DEFAULT_LOG_SOURCE: &str = "log";

/// Sanitizer, classifier and monitor behind one handle.
///
/// `Guard` is `Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Guard {
    config: Config,
    classifier: Classifier,
    monitor: Monitor,
}

impl Guard {
    /// Create a guard. Fails if a built-in rewrite or signature table is
    /// broken.
    pub fn new(config: Config) -> Result<Self> {
        sanitize::self_check()?;
        let classifier = Classifier::new()?;
        debug!(
            rules = classifier.catalog().len(),
            max_length = config.sanitize.max_length,
            "guard ready"
        );

        Ok(Self {
            monitor: Monitor::new(config.monitor.clone()),
            classifier,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Event and risk aggregator
    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Classifier
    pub fn classifier(&self) -> Classifier {
        self.classifier
    }

    /// Sanitize with the configured settings
    pub fn sanitize(&self, text: &str) -> String {
        sanitize::sanitize(text, &self.config.sanitize)
    }

    /// Sanitize with per-call settings
    pub fn sanitize_with(&self, text: &str, config: &SanitizeConfig) -> String {
        sanitize::sanitize(text, config)
    }

    /// Classify free text without recording anything
    pub fn classify(&self, text: &str) -> Vec<PatternMatch> {
        self.classifier.classify(text)
    }

    /// Classify a structured value without recording anything
    pub fn classify_structured(&self, value: &Value) -> Vec<PatternMatch> {
        self.classifier.classify_structured(value)
    }

    /// Scan an outgoing value without recording anything
    pub fn scan_output(&self, value: &Value) -> OutputScan {
        self.classifier.scan_output(value)
    }

    /// See [`validate::validate_url`]
    pub fn validate_url(&self, input: &str) -> Result<url::Url> {
        Ok(validate::validate_url(input)?)
    }

    /// See [`validate::validate_email`]
    pub fn validate_email(&self, input: &str) -> Result<String> {
        Ok(validate::validate_email(input)?)
    }

    /// Classify `text` on behalf of `actor_id` and record the outcome.
    ///
    /// `context` is stored, redacted, on every event this check creates.
    pub fn check_text(&self, actor_id: &str, text: &str, context: &Value) -> Result<Verdict> {
        self.ensure_scan_size(text.len())?;
        let matches = self.classifier.classify(text);
        Ok(self.monitor.record_check(actor_id, &matches, context))
    }

    /// Classify a structured value on behalf of `actor_id` and record the
    /// outcome. The value itself is the event context.
    pub fn check_value(&self, actor_id: &str, value: &Value) -> Result<Verdict> {
        self.ensure_scan_size(serde_json::to_string(value)?.len())?;
        let matches = self.classifier.classify_structured(value);
        Ok(self.monitor.record_check(actor_id, &matches, value))
    }

    /// Scan an outgoing value for `actor_id`, record any leak, and return
    /// the verdict with the redacted copy.
    pub fn check_output(&self, actor_id: &str, value: &Value) -> Result<(Verdict, Value)> {
        self.ensure_scan_size(serde_json::to_string(value)?.len())?;
        let scan = self.classifier.scan_output(value);
        let verdict = self
            .monitor
            .record_check(actor_id, &scan.matches, &Value::Null);
        Ok((verdict, scan.redacted))
    }

    /// Record an access; denies once the actor exceeds the rate limit
    pub fn record_access(&self, actor_id: &str, resource: &str, operation: &str) -> Verdict {
        self.monitor.record_access(actor_id, resource, operation)
    }

    /// Analyze one log line. Returns `true` if it carries an injection
    /// marker.
    pub fn analyze_log_entry(&self, line: &str) -> bool {
        self.analyze_log_entry_from(DEFAULT_LOG_SOURCE, line)
    }

    /// [`Guard::analyze_log_entry`], attributing events to `source`
    pub fn analyze_log_entry_from(&self, source: &str, line: &str) -> bool {
        if let Some(hit) = self.classifier.classify_log_line(line) {
            self.monitor
                .record_check(source, std::slice::from_ref(&hit), &Value::Null);
            return true;
        }

        self.monitor.record_check(source, &[], &Value::Null);
        if line.to_lowercase().contains("rate limit exceeded") {
            self.monitor.record_logged_rate_limit(source, line);
        }
        false
    }

    /// Build a report
    pub fn report(&self) -> Report {
        self.monitor.report()
    }

    fn ensure_scan_size(&self, len: usize) -> Result<()> {
        let max = self.config.monitor.max_scan_size;
        if len > max {
            return Err(ValidationError::InputTooLong { len, max }.into());
        }
        Ok(())
    }
}
