//! Effective URI: the bucket key of the cookie index.
//!
//! A request or Set-Cookie URI is reduced to `scheme://host[:port]`; path,
//! query, fragment and userinfo are discarded and the host is lowercased.
//! Default ports are elided, so `http://a.example:80/x` and
//! `http://A.example/y?q` share one key.

use crate::base::storeerror::StoreError;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectiveUri {
    serialized: String,
    host: String,
}

impl EffectiveUri {
    /// Normalize `url`. URLs without a host cannot be keyed.
    pub fn from_url(url: &Url) -> Result<Self, StoreError> {
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => {
                return Err(StoreError::invalid_argument(format!(
                    "URI has no host: {}",
                    url
                )))
            }
        };

        let scheme = url.scheme().to_ascii_lowercase();
        let serialized = match url.port() {
            Some(port) => format!("{}://{}:{}", scheme, host, port),
            None => format!("{}://{}", scheme, host),
        };

        Ok(Self { serialized, host })
    }

    /// Parse a persisted key back into an effective URI.
    ///
    /// Keys are re-normalized, so a key written by an older encoder that kept
    /// a path still lands in the right bucket.
    pub fn parse(key: &str) -> Result<Self, StoreError> {
        let url = Url::parse(key).map_err(|_| StoreError::invalid_uri(key))?;
        Self::from_url(&url).map_err(|_| StoreError::invalid_uri(key))
    }

    /// Canonical string form, used as the backing-store key.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Lowercased host, without port.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for EffectiveUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eff(s: &str) -> EffectiveUri {
        EffectiveUri::from_url(&Url::parse(s).unwrap()).unwrap()
    }

    #[test]
    fn test_path_query_fragment_discarded() {
        assert_eq!(
            eff("https://example.com/a/b?q=1#frag"),
            eff("https://example.com/other")
        );
        assert_eq!(eff("https://example.com/a").as_str(), "https://example.com");
    }

    #[test]
    fn test_host_downcased() {
        assert_eq!(eff("http://WWW.Example.COM/").as_str(), "http://www.example.com");
        assert_eq!(eff("foo://Host.Example/").host(), "host.example");
    }

    #[test]
    fn test_port_kept_unless_default() {
        assert_eq!(eff("http://example.com:80/").as_str(), "http://example.com");
        assert_eq!(eff("http://example.com:8080/").as_str(), "http://example.com:8080");
        assert_ne!(eff("http://example.com:8080/"), eff("http://example.com/"));
    }

    #[test]
    fn test_scheme_distinguishes() {
        assert_ne!(eff("http://example.com/"), eff("https://example.com/"));
    }

    #[test]
    fn test_ipv6_host() {
        assert_eq!(eff("http://[::1]:8080/x").as_str(), "http://[::1]:8080");
    }

    #[test]
    fn test_no_host_rejected() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert!(matches!(
            EffectiveUri::from_url(&url),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_roundtrips_canonical_form() {
        let key = eff("https://Example.com:8443/path").to_string();
        assert_eq!(EffectiveUri::parse(&key).unwrap().as_str(), key);
        assert!(matches!(
            EffectiveUri::parse("not a uri"),
            Err(StoreError::InvalidUri { .. })
        ));
    }
}
