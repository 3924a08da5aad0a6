//! Builders for evasion-tolerant keyword matchers.
//!
//! Each dangerous keyword is compiled from a plain word into a regular
//! expression that also accepts the common ways of disguising it:
//!
//! - **Interleaved gaps**: any run of whitespace or zero-width characters
//!   between two letters (`j a v a`, `j\u{200B}ava`).
//! - **Per-character encoding**: each character may independently appear raw,
//!   as a hex entity (`&#x6A;`), a decimal entity (`&#106;`), or a unicode
//!   escape (`\u006A`). Mixed forms such as `j&#97;v&#97;script:` are covered.
//!
//! Building the expressions from words keeps every rule auditable: the
//! tolerance policy lives in [`gap`] and [`encoded_char`] rather than being
//! repeated by hand in each pattern.

/// Characters tolerated between two letters of a keyword.
const GAP_CLASS: &str = r"[\s\x{200B}-\x{200D}\x{2060}\x{FEFF}]";

/// Entity prefix tolerating any depth of `&amp;` re-encoding.
const ENTITY_PREFIX: &str = "&(?:amp;)*";

/// Regex fragment matching an optional run of gap characters.
pub fn gap() -> String {
    format!("{GAP_CLASS}*")
}

/// Regex fragment for `c` in raw, entity, or escape form.
///
/// Letters accept both cases in every form.
pub fn encoded_char(c: char) -> String {
    let mut forms = vec![regex::escape(&c.to_string())];
    let mut codes = vec![u32::from(c)];
    if c.is_ascii_alphabetic() {
        let other = if c.is_ascii_lowercase() {
            c.to_ascii_uppercase()
        } else {
            c.to_ascii_lowercase()
        };
        codes.push(u32::from(other));
    }

    for code in codes {
        forms.push(format!("{ENTITY_PREFIX}#[xX]0*{code:x};?"));
        forms.push(format!("{ENTITY_PREFIX}#0*{code};?"));
        forms.push(format!(r"\\[uU]0*{code:x}"));
    }

    format!("(?:{})", forms.join("|"))
}

/// Keyword tolerant of gaps only (no per-character encoding).
pub fn spaced(word: &str) -> String {
    join_with_gaps(word.chars().map(|c| regex::escape(&c.to_string())))
}

/// Keyword tolerant of gaps and per-character encoding.
pub fn obfuscated(word: &str) -> String {
    join_with_gaps(word.chars().map(encoded_char))
}

/// Regex fragment for `<` in raw or entity form.
pub fn open_angle() -> &'static str {
    r"(?:<|&(?:amp;)*lt;|&(?:amp;)*#[xX]0*3[cC];?|&(?:amp;)*#0*60;?)"
}

/// Regex fragment for `>` in raw or entity form.
pub fn close_angle() -> &'static str {
    r"(?:>|&(?:amp;)*gt;|&(?:amp;)*#[xX]0*3[eE];?|&(?:amp;)*#0*62;?)"
}

/// Regex fragment for `/` in raw or entity form.
pub fn slash() -> &'static str {
    r"(?:/|&(?:amp;)*#[xX]0*2[fF];?|&(?:amp;)*#0*47;?)"
}

fn join_with_gaps(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(&gap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn compile(body: &str) -> Regex {
        Regex::new(&format!("(?i){body}")).unwrap()
    }

    #[test]
    fn test_spaced_matches_interleaved_whitespace() {
        let re = compile(&spaced("javascript:"));
        assert!(re.is_match("javascript:"));
        assert!(re.is_match("j a v a s c r i p t :"));
        assert!(re.is_match("JaVa\u{200B}ScRiPt:"));
        assert!(!re.is_match("java-script:"));
    }

    #[test]
    fn test_obfuscated_matches_encodings() {
        let re = compile(&obfuscated("javascript:"));
        assert!(re.is_match("&#x6A;&#x61;&#x76;&#x61;&#x73;&#x63;&#x72;&#x69;&#x70;&#x74;&#x3A;"));
        assert!(re.is_match("&#106;&#97;&#118;&#97;&#115;&#99;&#114;&#105;&#112;&#116;&#58;"));
        assert!(re.is_match(r"\u006A\u0061\u0076\u0061\u0073\u0063\u0072\u0069\u0070\u0074\u003A"));
        assert!(re.is_match("j&#97;v&#97;script:"));
        assert!(re.is_match("java&#115;cript:"));
        assert!(re.is_match("&#x4A;avascript:"));
    }

    #[test]
    fn test_obfuscated_escapes_metacharacters() {
        let re = compile(&obfuscated("eval("));
        assert!(re.is_match("eval("));
        assert!(re.is_match("e v a l ("));
        assert!(re.is_match("eval&#40;"));
        assert!(!re.is_match("evals"));
    }

    #[test]
    fn test_structural_fragments() {
        let re = compile(&format!("{}{}{}", open_angle(), slash(), close_angle()));
        assert!(re.is_match("</>"));
        assert!(re.is_match("&lt;&#x2F;&gt;"));
        assert!(re.is_match("&#60;&#47;&#62;"));
        assert!(re.is_match("&amp;amp;lt;&amp;#x2F;&amp;gt;"));
    }
}
