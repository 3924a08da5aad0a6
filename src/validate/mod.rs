//! URL and email validation.
//!
//! Both validators are strict allowlists layered over the sanitizer: they
//! either return a cleaned value or a [`ValidationError`] naming the first
//! check that failed. Checks run in a fixed order so the reported reason is
//! deterministic.

use url::Url;

use crate::config::SanitizeConfig;
use crate::error::ValidationError;
use crate::normalize::{is_homograph_script, normalize};
use crate::sanitize::sanitize;

/// Longest accepted email address (RFC 5321 path limit)
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Characters never allowed in a URL
const URL_DANGEROUS: &[char] = &['<', '>', '"', '\'', '`', '{', '}', '|', '\\', '^', '[', ']'];

/// Characters never allowed in a sanitized email
const EMAIL_DANGEROUS: &[char] = &['<', '>', '\'', '"', ';', '&', '(', ')', '{', '}', '[', ']', '\\'];

/// Slash look-alikes folded to `/` before the scheme check
const SLASH_VARIANTS: &[char] = &['\u{2044}', '\u{2215}', '\u{FF0F}'];

/// Validate a URL.
///
/// Accepts `https://` URLs and `http://localhost` only. The returned URL is
/// lowercased.
///
/// ```
/// use inguard::validate::validate_url;
/// use inguard::ValidationError;
///
/// assert!(validate_url("https://example.com/a").is_ok());
/// assert_eq!(
///     validate_url("http://example.com"),
///     Err(ValidationError::UnsupportedScheme)
/// );
/// ```
pub fn validate_url(input: &str) -> Result<Url, ValidationError> {
    let clean: String = input
        .trim()
        .chars()
        .map(|c| if SLASH_VARIANTS.contains(&c) { '/' } else { c })
        .flat_map(char::to_lowercase)
        .collect();

    if !has_allowed_scheme(&clean) {
        return Err(ValidationError::UnsupportedScheme);
    }

    if clean
        .chars()
        .any(|c| URL_DANGEROUS.contains(&c) || is_gap(c))
    {
        return Err(ValidationError::DangerousCharacters);
    }

    // Checked before normalization, which would fold look-alikes to Latin
    let domain = clean.split('/').nth(2).unwrap_or("");
    if domain.chars().any(is_homograph_script) {
        return Err(ValidationError::HomographDomain);
    }

    if normalize(&clean).contains("javascript:") {
        return Err(ValidationError::JavascriptScheme);
    }

    let url = Url::parse(&clean)?;
    // The prefix check above can be fooled by userinfo (`http://localhost:80@evil.com`)
    if !is_allowed_origin(&url) {
        return Err(ValidationError::UnsupportedScheme);
    }
    Ok(url)
}

/// Validate an email address. Returns the sanitized address.
///
/// ```
/// use inguard::validate::validate_email;
/// use inguard::ValidationError;
///
/// assert_eq!(validate_email("bob@example.com").unwrap(), "bob@example.com");
/// assert_eq!(
///     validate_email("a@böse.рф"),
///     Err(ValidationError::HomographDomain)
/// );
/// ```
pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let config = SanitizeConfig::default()
        .with_max_length(MAX_EMAIL_LENGTH)
        .allow_html(false);
    let clean = sanitize(input, &config);

    let parts: Vec<&str> = clean.split('@').collect();
    let [local, domain] = parts.as_slice() else {
        return Err(ValidationError::MalformedEmail);
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::MalformedEmail);
    }

    if clean.contains(EMAIL_DANGEROUS) {
        return Err(ValidationError::DangerousCharacters);
    }

    // The sanitizer folds Cyrillic look-alikes, so the raw domain is checked too
    let raw_domain = input.rsplit('@').next().unwrap_or("");
    if domain.chars().any(is_homograph_script) || raw_domain.chars().any(is_homograph_script) {
        return Err(ValidationError::HomographDomain);
    }

    Ok(clean)
}

fn has_allowed_scheme(url: &str) -> bool {
    if url.starts_with("https://") {
        return true;
    }
    match url.strip_prefix("http://localhost") {
        Some(rest) => rest.is_empty() || rest.starts_with(':') || rest.starts_with('/'),
        None => false,
    }
}

/// `https`, or plain `http` to localhost without credentials
fn is_allowed_origin(url: &Url) -> bool {
    match url.scheme() {
        "https" => true,
        "http" => {
            url.host_str() == Some("localhost")
                && url.username().is_empty()
                && url.password().is_none()
        },
        _ => false,
    }
}

/// Whitespace or zero-width character
fn is_gap(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}
