//! Public Suffix List checks for the `Domain` attribute of `Set-Cookie`.
//!
//! A response may only scope a cookie to its own host or a parent of it,
//! and never to a public suffix such as `com` or `co.uk`.

use psl::{List, Psl};

/// True when `domain` is itself a public suffix ("com", "github.io").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    List.suffix(domain.as_bytes())
        .map(|suffix| suffix.as_bytes() == domain.as_bytes())
        .unwrap_or(false)
}

/// Whether a response from `request_host` may set a cookie for `cookie_domain`.
///
/// A leading dot on the cookie domain is ignored.
pub fn is_valid_cookie_domain(cookie_domain: &str, request_host: &str) -> bool {
    let domain = cookie_domain
        .strip_prefix('.')
        .unwrap_or(cookie_domain)
        .to_ascii_lowercase();
    let host = request_host.to_ascii_lowercase();

    if domain.is_empty() || is_public_suffix(&domain) {
        return false;
    }

    host == domain
        || (host.len() > domain.len()
            && host.ends_with(&domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_suffixes() {
        assert!(is_public_suffix("com"));
        assert!(is_public_suffix("CO.UK"));
        assert!(is_public_suffix("github.io"));
        assert!(!is_public_suffix("example.com"));
        assert!(!is_public_suffix(""));
    }

    #[test]
    fn test_cookie_domain_accepted() {
        assert!(is_valid_cookie_domain("example.com", "example.com"));
        assert!(is_valid_cookie_domain(".example.com", "www.example.com"));
        assert!(is_valid_cookie_domain("Example.COM", "a.b.example.com"));
    }

    #[test]
    fn test_cookie_domain_rejected() {
        assert!(!is_valid_cookie_domain("com", "example.com"));
        assert!(!is_valid_cookie_domain(".co.uk", "shop.example.co.uk"));
        assert!(!is_valid_cookie_domain("other.com", "example.com"));
        assert!(!is_valid_cookie_domain("ample.com", "example.com"));
        assert!(!is_valid_cookie_domain(".", "example.com"));
    }
}
