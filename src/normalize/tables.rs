//! Code point tables for canonicalization.
//!
//! Each table maps a look-alike code point to the ASCII character it renders
//! as. Tables are disjoint and every target is ASCII, so applying them once is
//! enough for a stable result.

use phf::phf_map;

/// Unicode whitespace variants (→ ASCII space)
pub static WHITESPACE: phf::Map<char, char> = phf_map! {
    '\u{00A0}' => ' ', // no-break space
    '\u{1680}' => ' ', // ogham space mark
    '\u{2000}' => ' ', // en quad
    '\u{2001}' => ' ', // em quad
    '\u{2002}' => ' ', // en space
    '\u{2003}' => ' ', // em space
    '\u{2004}' => ' ', // three-per-em space
    '\u{2005}' => ' ', // four-per-em space
    '\u{2006}' => ' ', // six-per-em space
    '\u{2007}' => ' ', // figure space
    '\u{2008}' => ' ', // punctuation space
    '\u{2009}' => ' ', // thin space
    '\u{200A}' => ' ', // hair space
    '\u{2028}' => ' ', // line separator
    '\u{2029}' => ' ', // paragraph separator
    '\u{202F}' => ' ', // narrow no-break space
    '\u{205F}' => ' ', // medium mathematical space
    '\u{3000}' => ' ', // ideographic space
};

/// Smart quotes and quote/apostrophe look-alikes
pub static QUOTES: phf::Map<char, char> = phf_map! {
    '\u{2018}' => '\'', // left single quotation mark
    '\u{2019}' => '\'', // right single quotation mark
    '\u{02BC}' => '\'', // modifier letter apostrophe
    '\u{02C8}' => '\'', // modifier letter vertical line
    '\u{0301}' => '\'', // combining acute accent
    '\u{2032}' => '\'', // prime
    '\u{201C}' => '"',  // left double quotation mark
    '\u{201D}' => '"',  // right double quotation mark
    '\u{02EE}' => '"',  // modifier letter double apostrophe
    '\u{030B}' => '"',  // combining double acute accent
    '\u{030E}' => '"',  // combining double vertical line above
    '\u{0344}' => '"',  // combining greek dialytika tonos
};

/// Punctuation homographs rendering as `.` or `/`
pub static PUNCTUATION: phf::Map<char, char> = phf_map! {
    '\u{037E}' => '.', // greek question mark
    '\u{061F}' => '.', // arabic question mark
    '\u{1944}' => '.', // limbu exclamation mark
    '\u{1945}' => '.', // limbu question mark
    '\u{2E2E}' => '.', // reversed question mark
    '\u{2E3A}' => '.', // two-em dash
    '\u{2E3B}' => '.', // three-em dash
    '\u{3002}' => '.', // ideographic full stop
    '\u{2044}' => '/', // fraction slash
    '\u{2215}' => '/', // division slash
};

/// Cyrillic letters that render like Latin ones
pub static CYRILLIC: phf::Map<char, char> = phf_map! {
    'а' => 'a',
    'е' => 'e',
    'о' => 'o',
    'р' => 'p',
    'с' => 'c',
    'х' => 'x',
    'у' => 'y',
    'А' => 'A',
    'Е' => 'E',
    'О' => 'O',
    'Р' => 'P',
    'С' => 'C',
    'Х' => 'X',
    'У' => 'Y',
};

/// First fullwidth form mapped back to ASCII (`！`)
pub const FULLWIDTH_FIRST: u32 = 0xFF01;

/// Last fullwidth form mapped back to ASCII (`～`)
pub const FULLWIDTH_LAST: u32 = 0xFF5E;

/// Distance between a fullwidth form and its ASCII counterpart
pub const FULLWIDTH_OFFSET: u32 = 0xFEE0;
