//! Unicode canonicalization against homograph and encoding evasion.
//!
//! Attackers can smuggle characters past an ASCII-only filter by using code
//! points that *look* like the ones the filter expects. [`normalize`] maps
//! those look-alikes back to ASCII so every downstream pattern matches on a
//! single canonical alphabet.
//!
//! # Rules
//!
//! Applied in a fixed order, each a pure per-character rewrite:
//!
//! | Step | Input                                   | Output        |
//! |------|-----------------------------------------|---------------|
//! | 1    | Unicode whitespace variants             | ASCII space   |
//! | 2    | Smart quotes, apostrophe look-alikes    | `'` and `"`   |
//! | 3    | Punctuation homographs                  | `.` and `/`   |
//! | 4    | Fullwidth forms U+FF01–U+FF5E           | ASCII 0x21–0x7E |
//! | 5    | Cyrillic а е о р с х у (and uppercase)  | Latin letters |
//!
//! Every rule maps into ASCII, which no rule rewrites again, so
//! `normalize(normalize(x)) == normalize(x)`.
//!
//! # Usage
//!
//! ```
//! use inguard::normalize::normalize;
//!
//! assert_eq!(normalize("ｊａｖａｓｃｒｉｐｔ"), "javascript");
//! assert_eq!(normalize("\u{201C}hi\u{201D}"), "\"hi\"");
//! assert_eq!(normalize("раураl"), "paypal");
//! ```

pub mod tables;

use tables::{
    CYRILLIC, FULLWIDTH_FIRST, FULLWIDTH_LAST, FULLWIDTH_OFFSET, PUNCTUATION, QUOTES, WHITESPACE,
};

/// Canonicalize `input`. Total: always returns a string, possibly unchanged.
pub fn normalize(input: &str) -> String {
    input.chars().map(normalize_char).collect()
}

/// Canonicalize a single code point.
pub fn normalize_char(c: char) -> char {
    if c.is_ascii() {
        return c;
    }

    if let Some(&mapped) = WHITESPACE.get(&c) {
        return mapped;
    }
    if let Some(&mapped) = QUOTES.get(&c) {
        return mapped;
    }
    if let Some(&mapped) = PUNCTUATION.get(&c) {
        return mapped;
    }

    let code = u32::from(c);
    if (FULLWIDTH_FIRST..=FULLWIDTH_LAST).contains(&code) {
        if let Some(ascii) = char::from_u32(code - FULLWIDTH_OFFSET) {
            return ascii;
        }
    }

    CYRILLIC.get(&c).copied().unwrap_or(c)
}

/// True if `c` lies in the Cyrillic (U+0400–U+04FF) or Greek (U+0370–U+03FF) blocks.
pub fn is_homograph_script(c: char) -> bool {
    matches!(u32::from(c), 0x0370..=0x03FF | 0x0400..=0x04FF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_variants() {
        assert_eq!(normalize("a\u{00A0}b\u{2003}c\u{3000}d"), "a b c d");
        assert_eq!(normalize("x\u{2028}\u{2029}y"), "x  y");
    }

    #[test]
    fn test_quotes() {
        assert_eq!(normalize("\u{2018}x\u{2019}"), "'x'");
        assert_eq!(normalize("\u{201C}x\u{201D}"), "\"x\"");
        assert_eq!(normalize("it\u{02BC}s"), "it's");
    }

    #[test]
    fn test_punctuation_homographs() {
        assert_eq!(normalize("evil\u{3002}com\u{2215}x"), "evil.com/x");
        assert_eq!(normalize("a\u{2044}b"), "a/b");
    }

    #[test]
    fn test_fullwidth() {
        assert_eq!(normalize("\u{FF1C}script\u{FF1E}"), "<script>");
        assert_eq!(normalize("\u{FF0F}"), "/");
        // Halfwidth forms outside the ASCII mirror are left alone
        assert_eq!(normalize("\u{FF61}"), "\u{FF61}");
    }

    #[test]
    fn test_cyrillic_lookalikes() {
        assert_eq!(normalize("ехесutе"), "execute");
        assert_eq!(normalize("СОРУ"), "COPY");
        // Letters with no Latin twin survive
        assert_eq!(normalize("ф"), "ф");
    }

    #[test]
    fn test_idempotent() {
        let input = "\u{FF53}\u{00A0}с\u{201C}\u{3002}ф";
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_homograph_script() {
        assert!(is_homograph_script('ф'));
        assert!(is_homograph_script('α'));
        assert!(!is_homograph_script('ö'));
        assert!(!is_homograph_script('a'));
    }
}
