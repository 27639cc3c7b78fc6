//! Domain name syntax validation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a domain name in its textual form.
pub const MAX_DOMAIN_LEN: usize = 253;

/// Two or more dot-separated labels, each 1-63 alphanumerics with interior hyphens.
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$",
    )
    .unwrap()
});

/// Check whether `domain` is a syntactically valid domain name.
///
/// Never fails; anything outside the grammar is simply `false`.
///
/// # Examples
/// ```
/// use k2geosite::is_valid_domain;
///
/// assert!(is_valid_domain("example.com"));
/// assert!(!is_valid_domain("-bad.com"));
/// assert!(!is_valid_domain("exa_mple.com"));
/// ```
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    DOMAIN_PATTERN.is_match(domain)
}

/// Trim and lower-case a candidate domain.
pub fn normalize_domain(line: &str) -> String {
    line.trim().to_lowercase()
}
