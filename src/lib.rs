//! # Inguard - Input Sanitization and Threat Detection
//!
//! Defense-in-depth handling of untrusted strings: canonicalize look-alike
//! characters, rewrite dangerous constructs until nothing changes, classify
//! what was attempted, and keep a tamper-safe record of it.
//!
//! ## Features
//!
//! - **Unicode normalization**: fullwidth forms, Cyrillic homographs, smart quotes and whitespace variants fold to ASCII
//! - **Multi-pass rewriting**: script tags, scripting schemes, inline handlers, CSS expressions and data URLs, repeated to a fixed point
//! - **Threat classification**: SQL/NoSQL/command/template-lookup injection, XSS, sensitive field access, bulk reads, privileged operations, data leaks
//! - **Output scanning**: leaked credentials and personal data with a redacted copy
//! - **Monitoring**: hashed actors, contained evidence, sliding-window rate limiting, risk reports
//!
//! ## Architecture
//!
//! ```text
//!            untrusted text / JSON
//!                     |
//!         +-----------+-----------+
//!         v                       v
//!   [normalize] --> [sanitize]  [classify] --> PatternMatch*
//!                     |                            |
//!                     v                            v
//!                safe string                  [Monitor] --> Verdict
//!                                                  |
//!                                                  v
//!                                               Report
//! ```
//!
//! The sanitizer and classifier are pure functions over `'static` tables
//! compiled once. All mutable state lives in the [`Monitor`].
//!
//! ### Rewriter Stages
//!
//! Every pass applies, in order:
//!
//! | Stage          | Rewrites                                      | Replacement          |
//! |----------------|-----------------------------------------------|----------------------|
//! | normalize      | look-alike code points                        | ASCII                |
//! | encode         | `& < > " ' /` (unless `allow_html`)           | HTML entities        |
//! | scripting      | `javascript:`, `eval(`, `function(` (spaced, encoded) | `blocked:` / `blocked(` |
//! | script_tags    | `<script>` pairs and stray tags               | `&lt;blocked&gt;...` |
//! | event_handlers | `on<event>=`                                  | `blocked=`           |
//! | css            | scripted `style=` and `@import`               | `style=blocked`      |
//! | data_urls      | `data:text/html`, base64 payloads             | `data:text/plain`    |
//!
//! Passes repeat until one leaves the string unchanged or `max_passes` is
//! reached. Output never exceeds `max_length` chars.
//!
//! ## Quick Start
//!
//! ### Sanitizing
//!
//! ```
//! use inguard::{sanitize, SanitizeConfig};
//!
//! let config = SanitizeConfig::default();
//! let out = sanitize("<SCRIPT>alert(1)</SCRIPT>", &config);
//! assert!(!out.to_lowercase().contains("<script"));
//! ```
//!
//! ### Checking and Reporting
//!
//! ```
//! use inguard::{Config, Guard, RiskLevel};
//! use serde_json::json;
//!
//! let guard = Guard::new(Config::default()).unwrap();
//!
//! let verdict = guard
//!     .check_value("user-7", &json!({"q": "{\"$where\": \"sleep(1000)\"}"}))
//!     .unwrap();
//! assert!(!verdict.allowed);
//!
//! let report = guard.report();
//! assert_eq!(report.summary.risk_level, RiskLevel::Critical);
//! ```
//!
//! ### Validating
//!
//! ```
//! use inguard::{validate_email, validate_url, ValidationError};
//!
//! assert!(validate_url("https://example.com/a").is_ok());
//! assert_eq!(
//!     validate_url("https://pаypal.com").unwrap_err(),
//!     ValidationError::HomographDomain
//! );
//! assert!(validate_email("someone@example.org").is_ok());
//! ```
//!
//! ## Modules
//!
//! - [`normalize`]: Unicode canonicalization
//! - [`sanitize`]: multi-pass rewriter
//! - [`security`]: signature catalog and classifier
//! - [`validate`]: URL and email validators
//! - [`monitor`]: events, counters, rate limiting, reports
//! - [`guard`]: the [`Guard`] facade
//! - [`config`]: TOML/env configuration
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod guard;
pub mod monitor;
pub mod normalize;
pub mod sanitize;
pub mod security;
pub mod validate;

// Re-exports for convenience
pub use config::{Config, MonitorConfig, SanitizeConfig};
pub use error::{GuardError, Result, ValidationError};
pub use guard::Guard;
pub use monitor::{Monitor, Report, RiskLevel, SecurityEvent, Verdict};
pub use normalize::normalize;
pub use sanitize::sanitize;
pub use security::{Classifier, PatternMatch, Severity, ThreatCategory};
pub use validate::{validate_email, validate_url};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
