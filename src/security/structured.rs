//! Structured (JSON) input and output scanning.
//!
//! Values are flattened to a lowercase `key value ...` string for the text
//! signatures. Object keys are additionally checked against credential field
//! names, and values held under such keys are tracked so that no match ever
//! echoes them as evidence.

use std::ops::Range;

use serde::Serialize;
use serde_json::{Map, Value};

use super::classifier::{prepare, Classifier, PatternMatch, MAX_EVIDENCE_CHARS, REDACTED};
use super::patterns::{is_forbidden_field, LeakKind, Severity, ThreatCategory};

/// Object key names that mark a leaked credential.
///
/// Keys are split into words (`_`, `-`, camelCase). `suffixes` match any
/// word-aligned tail of the key (`access_token`, `userPassword`); `exact`
/// names are too generic for that and must be the whole key.
struct LeakKey {
    kind: LeakKind,
    suffixes: &'static [&'static str],
    exact: &'static [&'static str],
}

const LEAK_KEYS: &[LeakKey] = &[
    LeakKey {
        kind: LeakKind::Password,
        suffixes: &["password", "passwd", "pwd"],
        exact: &[],
    },
    LeakKey {
        kind: LeakKind::Token,
        suffixes: &["token", "jwt", "authorization", "bearer"],
        exact: &["auth"],
    },
    LeakKey {
        kind: LeakKind::ApiKey,
        suffixes: &["apikey", "accesskey"],
        exact: &["key"],
    },
    LeakKey {
        kind: LeakKind::Secret,
        suffixes: &["secret", "privatekey"],
        exact: &["private"],
    },
    LeakKey {
        kind: LeakKind::Hash,
        suffixes: &["hash"],
        exact: &["encrypted"],
    },
];

/// Flattened form of a JSON value
#[derive(Debug, Clone, Default)]
pub struct FlatText {
    /// Space-separated keys and scalar values, normalized and lowercased
    pub text: String,
    secret_spans: Vec<Range<usize>>,
}

impl FlatText {
    /// Byte ranges of `text` holding values of credential fields
    pub fn secret_spans(&self) -> &[Range<usize>] {
        &self.secret_spans
    }

    fn push(&mut self, piece: &str, secret: bool) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        let start = self.text.len();
        self.text.push_str(&prepare(piece));
        if secret {
            self.secret_spans.push(start..self.text.len());
        }
    }
}

/// Flatten `value` into matchable text
pub fn flatten(value: &Value) -> FlatText {
    let mut flat = FlatText::default();
    flatten_into(value, false, &mut flat);
    flat
}

fn flatten_into(value: &Value, secret: bool, flat: &mut FlatText) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flat.push(key, false);
                flatten_into(child, secret || is_forbidden_field(key), flat);
            }
        },
        Value::Array(items) => {
            for item in items {
                flatten_into(item, secret, flat);
            }
        },
        Value::String(s) => flat.push(s, secret),
        Value::Number(n) => flat.push(&n.to_string(), secret),
        Value::Bool(b) => flat.push(if *b { "true" } else { "false" }, secret),
        Value::Null => flat.push("null", secret),
    }
}

/// Result of scanning an outgoing value
#[derive(Debug, Clone, Serialize)]
pub struct OutputScan {
    /// `DATA_LEAK` matches, one per leak kind
    pub matches: Vec<PatternMatch>,
    /// Copy of the value with credential fields replaced by [`REDACTED`]
    pub redacted: Value,
}

impl OutputScan {
    /// True if nothing leaked
    pub fn is_clean(&self) -> bool {
        self.matches.is_empty()
    }
}

impl Classifier {
    /// Classify a structured value: text signatures over the flattened form,
    /// credential field names, and leaked data.
    pub fn classify_structured(&self, value: &Value) -> Vec<PatternMatch> {
        let flat = flatten(value);
        let mut matches = Vec::new();
        self.scan_text(&flat.text, flat.secret_spans(), &mut matches);

        if !matches
            .iter()
            .any(|m| m.category == ThreatCategory::SensitiveFieldAccess)
        {
            if let Some(key) = first_forbidden_key(value) {
                matches.push(PatternMatch {
                    rule_id: "sensitive_field_key",
                    category: ThreatCategory::SensitiveFieldAccess,
                    severity: Severity::Critical,
                    leak: None,
                    evidence: prepare(key).chars().take(MAX_EVIDENCE_CHARS).collect(),
                });
            }
        }

        self.collect_leaks(value, &flat, &mut matches);
        matches
    }

    /// Scan an outgoing value for leaked credentials and personal data
    pub fn scan_output(&self, value: &Value) -> OutputScan {
        let flat = flatten(value);
        let mut matches = Vec::new();
        self.collect_leaks(value, &flat, &mut matches);
        OutputScan {
            matches,
            redacted: redact(value),
        }
    }

    fn collect_leaks(&self, value: &Value, flat: &FlatText, out: &mut Vec<PatternMatch>) {
        let mut kinds = Vec::new();
        key_leaks(value, &mut kinds);
        for (kind, key) in kinds {
            if out.iter().any(|m| m.leak == Some(kind)) {
                continue;
            }
            out.push(PatternMatch {
                rule_id: "leak_field",
                category: ThreatCategory::DataLeak,
                severity: kind.severity(),
                leak: Some(kind),
                evidence: prepare(&key).chars().take(MAX_EVIDENCE_CHARS).collect(),
            });
        }
        self.scan_leaks(&flat.text, out);
    }
}

/// Deep copy of `value` with every credential field's value replaced
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_forbidden_field(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn first_forbidden_key(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => map.iter().find_map(|(k, v)| {
            if is_forbidden_field(k) {
                Some(k.as_str())
            } else {
                first_forbidden_key(v)
            }
        }),
        Value::Array(items) => items.iter().find_map(first_forbidden_key),
        _ => None,
    }
}

/// Collect (kind, key) for every object key naming a credential that holds a
/// non-empty string
fn key_leaks(value: &Value, out: &mut Vec<(LeakKind, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if matches!(child, Value::String(s) if !s.is_empty()) {
                    for kind in leak_kinds(key) {
                        out.push((kind, key.clone()));
                    }
                }
                key_leaks(child, out);
            }
        },
        Value::Array(items) => {
            for item in items {
                key_leaks(item, out);
            }
        },
        _ => {},
    }
}

/// Leak kinds named by an object key
fn leak_kinds(key: &str) -> Vec<LeakKind> {
    let words = key_words(key);
    let folded = words.concat();
    LEAK_KEYS
        .iter()
        .filter(|leak| {
            leak.exact.contains(&folded.as_str())
                || (0..words.len()).any(|i| leak.suffixes.contains(&words[i..].concat().as_str()))
        })
        .map(|leak| leak.kind)
        .collect()
}

/// Lowercase words of a key, split on non-alphanumerics and camelCase humps
fn key_words(key: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
