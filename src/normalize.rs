//! URL normalization and domain validation
//!
//! This module is the URL-syntax service used by URL-kind fields and the
//! generator configuration. It decides whether an input string is already
//! a usable absolute URL and whether a host name is a plausible domain.

use url::Url;

/// Normalize an input string into an absolute http(s) URL.
///
/// Returns `None` when the input is not parseable as an absolute URL,
/// uses a non-web scheme, or carries a host that fails
/// [`is_valid_domain`]. Already-normal absolute URLs come back unchanged.
pub fn normalize(input: &str) -> Option<Url> {
    let url = Url::parse(input).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    match url.host_str() {
        Some(host) if is_valid_domain(host) => Some(url),
        _ => None,
    }
}

/// Check whether a host string is a plausible DNS domain name.
///
/// Accepts dotted labels of letters, digits and hyphens (no leading or
/// trailing hyphen), with an alphabetic top-level label of at least two
/// characters. Punycode (`xn--`) labels pass the same shape check, so
/// IDN hosts already encoded by the `url` crate are accepted.
pub fn is_valid_domain(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    // Top-level label must be alphabetic (or punycode) and at least 2 chars.
    let tld = labels[labels.len() - 1];
    tld.len() >= 2 && (tld.chars().all(|c| c.is_ascii_alphabetic()) || tld.starts_with("xn--"))
}
