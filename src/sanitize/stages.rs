//! Ordered rewrite stages for the multi-pass sanitizer.
//!
//! Every stage is a list of (matcher, replacement) rules applied left to
//! right. Replacements are inert placeholders that no rule matches again, so
//! a stage applied to its own output is a no-op.
//!
//! All matchers are linear-time (`regex` has no backtracking) and the input is
//! already truncated, so unbounded spans such as `.*?` are safe here.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::matcher::{close_angle, encoded_char, gap, obfuscated, open_angle, slash, spaced};

/// Placeholder for a defused `javascript:` scheme
pub const BLOCKED_SCHEME: &str = "blocked:";
/// Placeholder for a defused `eval(`/`Function(`/`expression(` call
pub const BLOCKED_CALL: &str = "blocked(";
/// Placeholder for a defused `on<event>=` handler
pub const BLOCKED_HANDLER: &str = "blocked=";
/// Placeholder for a defused `<script>...</script>` pair
pub const BLOCKED_SCRIPT_PAIR: &str = "&lt;blocked&gt;&lt;&#x2F;blocked&gt;";
/// Placeholder for an unmatched `</script` fragment
pub const BLOCKED_SCRIPT_CLOSE: &str = "&lt;&#x2F;blocked";
/// Placeholder for an unmatched `<script` fragment
pub const BLOCKED_SCRIPT_OPEN: &str = "&lt;blocked";
/// Placeholder for a defused inline style
pub const BLOCKED_STYLE: &str = "style=blocked";
/// Placeholder for a defused `@import`
pub const BLOCKED_IMPORT: &str = "@import blocked";
/// Inert MIME type for dangerous data URLs
pub const INERT_DATA_URL: &str = "data:text/plain";
/// Inert replacement for a base64 data URL carrying script content
pub const INERT_BASE64_DATA_URL: &str = "data:text/plain;base64,blocked";

/// Entities emitted by [`encode_entities`]. A `&` that already starts one of
/// these is left alone, which keeps the encoder idempotent.
const EMITTED_ENTITIES: &[&str] = &["amp;", "lt;", "gt;", "quot;", "#x27;", "#x2F;"];

/// Pre-encoded entity sequences re-escaped after encoding.
const DOUBLE_ENTITY_GUARD: &[(&str, &str)] = &[
    ("&amp;lt;", "&amp;amp;lt;"),
    ("&amp;gt;", "&amp;amp;gt;"),
    ("&amp;quot;", "&amp;amp;quot;"),
    ("&amp;#x27;", "&amp;amp;#x27;"),
    ("&amp;#x2F;", "&amp;amp;#x2F;"),
];

/// Decodes like a browser: padding optional, non-zero trailing bits ignored
const FORGIVING_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Markers that identify script content inside a decoded data URL payload.
const SCRIPT_MARKERS: &[&str] = &["script", "onerror", "onload", "eval("];

enum Replacement {
    Literal(&'static str),
    ScriptPayload,
}

struct Rule {
    regex: Regex,
    replacement: Replacement,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            replacement: Replacement::Literal(replacement),
        })
    }

    fn apply(&self, input: &str) -> String {
        match self.replacement {
            Replacement::Literal(rep) => self.regex.replace_all(input, rep).into_owned(),
            Replacement::ScriptPayload => self
                .regex
                .replace_all(input, |caps: &Captures<'_>| defuse_payload(caps))
                .into_owned(),
        }
    }
}

/// A named group of rewrite rules
pub struct Stage {
    /// Stage name (for tracing)
    pub name: &'static str,
    rules: Vec<Rule>,
}

impl Stage {
    /// Apply every rule of this stage in order
    pub fn apply(&self, input: &str) -> String {
        let mut text = input.to_string();
        for rule in &self.rules {
            text = rule.apply(&text);
        }
        text
    }
}

/// Compiled rewrite table
pub struct RewriteRules {
    /// Defusing stages in application order
    pub stages: Vec<Stage>,
    double_escape: Regex,
}

impl RewriteRules {
    /// Collapse `&amp;amp;...X;` chains to `&X;` in a single pass
    pub fn collapse_double_escapes(&self, input: &str) -> String {
        self.double_escape.replace_all(input, "&${1}").into_owned()
    }
}

lazy_static! {
    static ref RULES: Result<RewriteRules, String> = build().map_err(|e| e.to_string());
}

/// The process-wide rewrite table, or the reason it failed to compile
pub fn rules() -> Result<&'static RewriteRules, &'static str> {
    RULES.as_ref().map_err(String::as_str)
}

fn build() -> Result<RewriteRules, regex::Error> {
    let g = gap();
    let (open, close, slash) = (open_angle(), close_angle(), slash());
    let script = spaced("script");
    let equals = r"(?:=|&(?:amp;)*#[xX]0*3[dD];?|&(?:amp;)*#0*61;?)";

    let scripting = Stage {
        name: "scripting",
        rules: vec![
            Rule::new(&format!("(?i){}", obfuscated("javascript:")), BLOCKED_SCHEME)?,
            Rule::new(&format!("(?i){}", obfuscated("eval(")), BLOCKED_CALL)?,
            Rule::new(&format!("(?i){}", obfuscated("expression(")), BLOCKED_CALL)?,
            Rule::new(&format!("(?i){}", obfuscated("function(")), BLOCKED_CALL)?,
        ],
    };

    let script_tags = Stage {
        name: "script_tags",
        rules: vec![
            Rule::new(
                &format!(
                    "(?is){open}{g}{script}.*?{close}.*?{open}{g}{slash}{g}{script}{g}{close}"
                ),
                BLOCKED_SCRIPT_PAIR,
            )?,
            Rule::new(
                &format!("(?i){open}{g}{slash}{g}{script}"),
                BLOCKED_SCRIPT_CLOSE,
            )?,
            Rule::new(&format!("(?i){open}{g}{script}"), BLOCKED_SCRIPT_OPEN)?,
        ],
    };

    let event_handlers = Stage {
        name: "event_handlers",
        rules: vec![Rule::new(
            &format!(
                "(?i)(^|[^a-z0-9_]){o}{g}{n}{g}[a-z]{{1,20}}{g}{equals}",
                o = encoded_char('o'),
                n = encoded_char('n'),
            ),
            "${1}blocked=",
        )?],
    };

    let css = Stage {
        name: "css",
        rules: vec![
            Rule::new(
                &format!("(?i)style{g}{equals}{g}[^>]*?javascript"),
                BLOCKED_STYLE,
            )?,
            Rule::new(
                &format!("(?i)style{g}{equals}{g}[^>]*?expression"),
                BLOCKED_STYLE,
            )?,
            Rule::new(r"(?i)@import[^;]*?javascript", BLOCKED_IMPORT)?,
        ],
    };

    let data_urls = Stage {
        name: "data_urls",
        rules: vec![
            Rule::new(
                &format!(
                    "(?i)data{g}:{g}(?:text{slash}html|application{slash}javascript|text{slash}javascript)"
                ),
                INERT_DATA_URL,
            )?,
            Rule {
                regex: Regex::new(&format!(
                    "(?is)data{g}:{g}[^,]{{0,80}}?;{g}base64{g},{g}((?:[a-z0-9+=]|{slash})+)"
                ))?,
                replacement: Replacement::ScriptPayload,
            },
        ],
    };

    Ok(RewriteRules {
        stages: vec![scripting, script_tags, event_handlers, css, data_urls],
        double_escape: Regex::new(r"&(?:amp;)+(amp;|lt;|gt;|quot;|#x27;|#x2F;)")?,
    })
}

/// HTML-entity-encode `& < > " ' /`, ampersand first.
///
/// A `&` that already begins an entity this function emits is kept as is.
/// Pre-encoded dangerous entities (`&amp;lt;` and friends) are then escaped
/// once more so they cannot surface as markup after a single decode.
pub fn encode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);

    for (idx, c) in input.char_indices() {
        match c {
            '&' => {
                let rest = &input[idx + 1..];
                if EMITTED_ENTITIES.iter().any(|e| rest.starts_with(e)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            },
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }

    DOUBLE_ENTITY_GUARD
        .iter()
        .fold(out, |acc, (from, to)| acc.replace(from, to))
}

fn defuse_payload(caps: &Captures<'_>) -> String {
    let whole = &caps[0];
    let payload = caps.get(1).map_or("", |m| m.as_str());

    if carries_script(payload) {
        INERT_BASE64_DATA_URL.to_string()
    } else {
        whole.to_string()
    }
}

/// True if a base64 payload (possibly entity-encoded) decodes to script content.
fn carries_script(payload: &str) -> bool {
    let lowered = payload.to_ascii_lowercase();
    if SCRIPT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return true;
    }

    let decoded = decode_lenient(payload).to_ascii_lowercase();
    SCRIPT_MARKERS.iter().any(|m| decoded.contains(m))
}

fn decode_lenient(payload: &str) -> String {
    let mut clean: String = payload
        .replace("&#x2F;", "/")
        .replace("&#x2f;", "/")
        .replace("&#47;", "/")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '/')
        .collect();

    // A single dangling sextet cannot encode a byte
    if clean.len() % 4 == 1 {
        clean.pop();
    }

    FORGIVING_BASE64
        .decode(clean.as_bytes())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
