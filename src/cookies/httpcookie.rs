use crate::base::storeerror::StoreError;
use time::OffsetDateTime;
use url::Url;

/// `max_age` of a session cookie: no expiry.
pub const MAX_AGE_UNSPECIFIED: i64 = -1;

/// Attribute names that may not be used as cookie names.
const RESERVED_NAMES: &[&str] = &[
    "comment",
    "commenturl",
    "discard",
    "domain",
    "expires",
    "httponly",
    "max-age",
    "path",
    "port",
    "secure",
    "version",
];

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Identity of a cookie for replace/remove purposes.
///
/// Name and domain compare case-insensitively, path case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
}

/// An HTTP cookie.
///
/// `PartialEq` compares every field including `creation_time`; use
/// [`HttpCookie::same_identity`] for the (name, domain, path) identity the
/// stores use when replacing and removing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCookie {
    name: String,
    value: String,
    domain: String,
    path: String,
    http_only: bool,
    secure: bool,
    discard: bool,
    max_age: i64,
    creation_time: i64,
    version: i32,
}

impl HttpCookie {
    /// Create a cookie stamped with the current time.
    ///
    /// Fails when `name` is empty, is not an HTTP token, starts with `$` or
    /// collides with a cookie attribute name.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            name,
            value: value.into(),
            domain: String::new(),
            path: String::new(),
            http_only: false,
            secure: false,
            discard: false,
            max_age: MAX_AGE_UNSPECIFIED,
            creation_time: now_millis(),
            version: 1,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Domain attribute, lowercased. Empty means host-only.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Path attribute. Empty means every path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn discard(&self) -> bool {
        self.discard
    }

    /// Lifetime in seconds from creation; [`MAX_AGE_UNSPECIFIED`] for session cookies.
    pub fn max_age(&self) -> i64 {
        self.max_age
    }

    /// Creation time in epoch milliseconds. Fixed at construction.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = domain.into().to_ascii_lowercase();
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn set_http_only(&mut self, http_only: bool) {
        self.http_only = http_only;
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn set_discard(&mut self, discard: bool) {
        self.discard = discard;
    }

    pub fn set_max_age(&mut self, max_age: i64) {
        self.max_age = max_age;
    }

    /// Only versions 0 (Netscape) and 1 (RFC 2965) exist.
    pub fn set_version(&mut self, version: i32) -> Result<(), StoreError> {
        if version != 0 && version != 1 {
            return Err(StoreError::invalid_argument(format!(
                "cookie version must be 0 or 1, got {}",
                version
            )));
        }
        self.version = version;
        Ok(())
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.set_domain(domain);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.set_path(path);
        self
    }

    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Overwrite the creation timestamp.
    ///
    /// Reserved for restoring persisted records, which must keep the
    /// original timestamp instead of the construction time.
    pub(crate) fn restore_creation_time(&mut self, creation_time: i64) {
        self.creation_time = creation_time;
    }

    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.to_ascii_lowercase(),
            domain: self.domain.to_ascii_lowercase(),
            path: self.path.clone(),
        }
    }

    /// True if both cookies share (name, domain, path).
    pub fn same_identity(&self, other: &HttpCookie) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.domain.eq_ignore_ascii_case(&other.domain)
            && self.path == other.path
    }

    /// Whether the cookie has outlived `max_age` at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        if self.max_age < 0 {
            return false;
        }
        self.creation_time
            .saturating_add(self.max_age.saturating_mul(1000))
            < now_ms
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    /// Build a cookie from a `Set-Cookie` header received for `url`.
    ///
    /// `Max-Age` wins over `Expires`; a past `Expires` yields `max_age == 0`,
    /// which the stores treat as a deletion. When `check_public_suffix` is set
    /// a `Domain` attribute naming a public suffix, or one the request host
    /// does not belong to, is rejected.
    pub fn from_set_cookie(
        url: &Url,
        header: &str,
        check_public_suffix: bool,
    ) -> Result<Self, StoreError> {
        let parsed = cookie::Cookie::parse(header).map_err(|e| {
            StoreError::invalid_argument(format!("unparseable Set-Cookie header: {}", e))
        })?;
        let host = url.host_str().unwrap_or("");

        let mut cookie = HttpCookie::new(parsed.name(), parsed.value())?;
        cookie.version = 0;

        if let Some(domain) = parsed.domain() {
            let domain = domain.trim_start_matches('.').to_ascii_lowercase();
            if check_public_suffix && !crate::cookies::psl::is_valid_cookie_domain(&domain, host) {
                return Err(StoreError::invalid_argument(format!(
                    "cookie domain {} is not valid for host {}",
                    domain, host
                )));
            }
            cookie.domain = domain;
        }

        cookie.path = match parsed.path() {
            Some(path) if path.starts_with('/') => path.to_string(),
            _ => default_path(url.path()).to_string(),
        };

        if let Some(max_age) = parsed.max_age() {
            cookie.max_age = max_age.whole_seconds().max(0);
        } else if let Some(expires) = parsed.expires().and_then(|e| e.datetime()) {
            let delta = (expires - OffsetDateTime::now_utc()).whole_seconds();
            cookie.max_age = delta.max(0);
        }

        cookie.secure = parsed.secure().unwrap_or(false);
        cookie.http_only = parsed.http_only().unwrap_or(false);

        Ok(cookie)
    }
}

/// Default-path of a request path per RFC 6265 5.1.4.
fn default_path(request_path: &str) -> &str {
    if !request_path.starts_with('/') {
        return "/";
    }
    match request_path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &request_path[..idx],
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidCookieName {
        name: name.to_string(),
    };

    if name.is_empty() || name.starts_with('$') {
        return Err(invalid());
    }
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(invalid());
    }
    let is_token = name.bytes().all(|b| {
        b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
    });
    if !is_token {
        return Err(invalid());
    }
    Ok(())
}
