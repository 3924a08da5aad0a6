//! Security event records.
//!
//! Everything stored in an event has been contained first: actor ids are
//! hashed, evidence is normalized, rewritten, credential values masked and
//! truncated, and context values under credential keys are redacted.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::SanitizeConfig;
use crate::normalize::normalize;
use crate::sanitize::sanitize;
use crate::security::{is_forbidden_field, redact, Severity, ThreatCategory};

/// Longest evidence kept on an event (chars)
pub const MAX_EVIDENCE_LEN: usize = 200;

/// Hex chars kept from the actor digest
const ACTOR_HASH_LEN: usize = 16;

lazy_static! {
    /// `key=` / `key:` with surrounding spaces
    static ref KEY_SEPARATOR: Option<Regex> = Regex::new(r"(?i)([a-z0-9_\-]+)\s*[:=]\s*").ok();
    /// A value at the start of the haystack, optionally quoted
    static ref VALUE: Option<Regex> = Regex::new(r#"^(?:"[^"]*"|'[^']*'|[^\s,;&]+)"#).ok();
}

/// A classified security event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityEvent {
    /// Unique event id (`sec_<uuid>`)
    pub id: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Hashed actor id, see [`hash_actor_id`]
    pub actor_hash: String,
    /// Threat category
    pub category: ThreatCategory,
    /// Severity
    pub severity: Severity,
    /// Contained evidence, at most [`MAX_EVIDENCE_LEN`] chars
    pub evidence: String,
    /// Redacted caller context
    pub context: Map<String, Value>,
}

impl SecurityEvent {
    /// Create an event, containing `evidence` and redacting `context`
    pub fn new(
        actor_hash: impl Into<String>,
        category: ThreatCategory,
        severity: Severity,
        evidence: &str,
        context: &Value,
    ) -> Self {
        let context = match redact(context) {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            },
        };

        Self {
            id: format!("sec_{}", Uuid::new_v4().simple()),
            timestamp: Utc::now(),
            actor_hash: actor_hash.into(),
            category,
            severity,
            evidence: contain(evidence),
            context,
        }
    }
}

/// One-way, fixed-length digest of an actor id
pub fn hash_actor_id(actor_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(actor_id.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..ACTOR_HASH_LEN].to_string()
}

/// Make untrusted text safe to store and log: canonicalize look-alikes,
/// mask credential values, then rewrite through the sanitizer capped at
/// [`MAX_EVIDENCE_LEN`] chars.
pub fn contain(text: &str) -> String {
    let config = SanitizeConfig::default().with_max_length(MAX_EVIDENCE_LEN);
    // Masking matches ASCII keys, so fullwidth `ｐａｓｓｗｏｒｄ＝` must fold first
    sanitize(&mask_credentials(&normalize(text)), &config)
}

/// Replace the value of `key=value` pairs whose key is a credential field
pub fn mask_credentials(text: &str) -> String {
    let (Some(key_separator), Some(value)) = (KEY_SEPARATOR.as_ref(), VALUE.as_ref()) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for caps in key_separator.captures_iter(text) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // Inside a value already masked
        if whole.start() < cursor || !is_forbidden_field(key.as_str()) {
            continue;
        }
        let Some(found) = value.find(&text[whole.end()..]) else {
            continue;
        };
        out.push_str(&text[cursor..whole.end()]);
        out.push_str("***");
        cursor = whole.end() + found.end();
    }
    out.push_str(&text[cursor..]);
    out
}
