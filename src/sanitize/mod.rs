//! Multi-pass rewriter.
//!
//! [`sanitize`] canonicalizes untrusted text and neutralizes scripting
//! vectors by running the same pipeline repeatedly until the string stops
//! changing:
//!
//! ```text
//! trim -> truncate(max_length)
//!      -> loop (<= max_passes) {
//!             normalize
//!             encode_entities        (unless allow_html)
//!             scripting -> script_tags -> event_handlers -> css -> data_urls
//!         } until unchanged
//!      -> collapse &amp;amp;X chains (once)
//!      -> truncate(max_length), drop partial trailing entity, trim
//! ```
//!
//! The pass budget is the only bound on work: an input that keeps changing
//! is returned partially rewritten after `max_passes` passes.
//!
//! # Example
//!
//! ```
//! use inguard::sanitize::{sanitize, SanitizeConfig};
//!
//! let out = sanitize("<script>alert(1)</script>", &SanitizeConfig::default());
//! assert!(!out.to_lowercase().contains("<script"));
//! ```

pub mod matcher;
pub mod stages;

use tracing::{debug, error};

pub use crate::config::SanitizeConfig;
use crate::error::{GuardError, Result};
use crate::normalize::normalize;
use stages::{encode_entities, RewriteRules};

/// Sanitize `input` according to `config`. Total: never fails.
pub fn sanitize(input: &str, config: &SanitizeConfig) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // DoS bound: cut before any pass runs
    let truncated = truncate_chars(trimmed, config.max_length);

    let rules = match stages::rules() {
        Ok(rules) => rules,
        Err(reason) => {
            error!(reason, "rewrite table unavailable, escaping only");
            return clamp_length(encode_entities(&normalize(truncated)), config.max_length);
        },
    };

    let budget = config.max_passes.max(1);
    let mut current = truncated.to_string();
    let mut converged = false;

    for _ in 0..budget {
        let next = run_pass(&current, rules, config.allow_html);
        if next == current {
            converged = true;
            break;
        }
        current = next;
    }

    if !converged {
        debug!(
            max_passes = budget,
            len = current.len(),
            "sanitize stopped at pass cap before reaching a fixed point"
        );
    }

    let collapsed = rules.collapse_double_escapes(&current);
    clamp_length(collapsed, config.max_length)
}

/// Verify the rewrite table compiled. Called once at startup.
pub fn self_check() -> Result<()> {
    stages::rules().map(|_| ()).map_err(|reason| {
        error!(reason, "rewrite table failed to compile");
        GuardError::Configuration(format!("rewrite table failed to compile: {reason}"))
    })
}

fn run_pass(input: &str, rules: &RewriteRules, allow_html: bool) -> String {
    let mut text = normalize(input);
    if !allow_html {
        text = encode_entities(&text);
    }
    for stage in &rules.stages {
        text = stage.apply(&text);
    }
    text
}

fn truncate_chars(input: &str, max: usize) -> &str {
    match input.char_indices().nth(max) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Enforce the length bound after encoding has expanded the text.
fn clamp_length(text: String, max: usize) -> String {
    let cut = truncate_chars(&text, max);
    if cut.len() == text.len() {
        return text.trim().to_string();
    }

    let mut cut = cut.to_string();
    // A cut entity would decode to garbage
    if let Some(amp) = cut.rfind('&') {
        if !cut[amp..].contains(';') {
            cut.truncate(amp);
        }
    }
    cut.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_empty_input() {
        let config = SanitizeConfig::default();
        assert_eq!(sanitize("", &config), "");
        assert_eq!(sanitize("   \t\n", &config), "");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let config = SanitizeConfig::default();
        assert_eq!(sanitize("  hello world  ", &config), "hello world");
    }

    #[test]
    fn test_script_tag_neutralized() {
        let out = sanitize("<script>alert(1)</script>", &SanitizeConfig::default());
        assert!(!strip_whitespace(&out).to_lowercase().contains("<script"));
        assert_eq!(out, stages::BLOCKED_SCRIPT_PAIR);
    }

    #[test]
    fn test_spaced_javascript_scheme() {
        let out = sanitize("j a v a s c r i p t:alert(1)", &SanitizeConfig::default());
        assert!(!strip_whitespace(&out).to_lowercase().contains("javascript:"));
    }

    #[test]
    fn test_fullwidth_script_tag() {
        let out = sanitize("\u{FF1C}script\u{FF1E}x", &SanitizeConfig::default());
        assert!(!out.to_lowercase().contains("script"));
    }

    #[test]
    fn test_pre_encoded_entity_not_unescaped() {
        let out = sanitize("&lt;script&gt;", &SanitizeConfig::default());
        assert!(!out.to_lowercase().contains("script"));
        let out = sanitize("&amp;lt;script", &SanitizeConfig::default());
        assert!(!out.to_lowercase().contains("script"));
    }

    #[test]
    fn test_allow_html_keeps_markup() {
        let config = SanitizeConfig::default().allow_html(true);
        assert_eq!(sanitize("<b>bold</b>", &config), "<b>bold</b>");
        assert_eq!(
            sanitize("<b onclick=go()>x</b>", &config),
            "<b blocked=go()>x</b>"
        );
    }

    #[test]
    fn test_length_bound_after_expansion() {
        let config = SanitizeConfig::default().with_max_length(8);
        assert_eq!(sanitize("<<<<<", &config), "&lt;&lt;");

        // Partial trailing entity is dropped
        let config = SanitizeConfig::default().with_max_length(7);
        assert_eq!(sanitize("<<<<<", &config), "&lt;");
    }

    #[test]
    fn test_length_bound_plain() {
        let config = SanitizeConfig::default().with_max_length(5);
        assert_eq!(sanitize("abcdefgh", &config), "abcde");
        assert_eq!(sanitize("ééééééé", &config).chars().count(), 5);
    }

    #[test]
    fn test_zero_passes_still_runs_once() {
        let config = SanitizeConfig::default().with_max_passes(0);
        assert_eq!(sanitize("<b>", &config), "&lt;b&gt;");
    }

    #[test]
    fn test_idempotent_on_corpus() {
        let config = SanitizeConfig::default();
        for input in [
            "<script>alert(1)</script>",
            "<img src=x onerror=alert(1)>",
            "&amp;amp;lt;script&amp;gt;",
            "javascript&#58;alert(1)",
            "data:text/html,<b>x</b>",
            "AT&T said \"hi\" / 'bye'",
            "style=\"background:url(javascript:x)\"",
            "раураl\u{00A0}login",
        ] {
            let once = sanitize(input, &config);
            assert_eq!(sanitize(&once, &config), once, "input: {input}");
        }
    }

    #[test]
    fn test_self_check() {
        assert!(self_check().is_ok());
    }

    #[test]
    fn test_clamp_keeps_complete_entity() {
        assert_eq!(clamp_length("a&amp;b".to_string(), 6), "a&amp;");
        assert_eq!(clamp_length("a&amp;b".to_string(), 4), "a");
    }
}
