use crate::base::storeerror::StoreError;
use crate::cookies::effectiveuri::EffectiveUri;
use crate::cookies::httpcookie::{now_millis, HttpCookie};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use url::Url;

/// In-memory cookie index.
///
/// Cookies are bucketed by the [`EffectiveUri`] they were added under.
/// Within a bucket a cookie is unique by (name, domain, path); an empty
/// bucket is dropped rather than kept as an empty list. Cookies added
/// without a URI live in a separate unbound list that is only reachable
/// through domain matching.
///
/// Each bucket update is atomic. Operations that span buckets (`get`,
/// `get_cookies`, `remove_all`) are not isolated from concurrent writers;
/// [`PersistentCookieStore`](crate::cookies::persistentstore::PersistentCookieStore)
/// serializes all of them behind its store lock.
#[derive(Default)]
pub struct MemoryCookieStore {
    buckets: DashMap<EffectiveUri, Vec<HttpCookie>>,
    unbound: Mutex<Vec<HttpCookie>>,
}

/// Result of a read that pruned expired cookies on the way.
pub(crate) struct PrunedRead {
    pub cookies: Vec<HttpCookie>,
    /// Buckets that lost at least one cookie.
    pub pruned: Vec<EffectiveUri>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn unbound(&self) -> std::sync::MutexGuard<'_, Vec<HttpCookie>> {
        self.unbound.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set `cookie` for `uri`.
    ///
    /// A cookie with the same identity in the bucket is replaced. A cookie
    /// with `max_age == 0` deletes its identity instead of being stored.
    pub fn add(&self, uri: Option<&Url>, cookie: HttpCookie) -> Result<(), StoreError> {
        match uri {
            Some(url) => {
                let key = EffectiveUri::from_url(url)?;
                self.add_to_bucket(&key, cookie);
            }
            None => {
                let mut unbound = self.unbound();
                unbound.retain(|c| !c.same_identity(&cookie));
                if cookie.max_age() != 0 {
                    unbound.push(cookie);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn add_to_bucket(&self, key: &EffectiveUri, cookie: HttpCookie) {
        match self.buckets.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let bucket = entry.get_mut();
                bucket.retain(|c| !c.same_identity(&cookie));
                if cookie.max_age() != 0 {
                    bucket.push(cookie);
                }
                if bucket.is_empty() {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                if cookie.max_age() != 0 {
                    entry.insert(vec![cookie]);
                }
            }
        }
    }

    /// Remove the cookie sharing `cookie`'s identity from `uri`'s bucket.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&self, uri: Option<&Url>, cookie: &HttpCookie) -> Result<bool, StoreError> {
        match uri {
            Some(url) => {
                let key = EffectiveUri::from_url(url)?;
                Ok(self.remove_from_bucket(&key, cookie))
            }
            None => {
                let mut unbound = self.unbound();
                let before = unbound.len();
                unbound.retain(|c| !c.same_identity(cookie));
                Ok(unbound.len() != before)
            }
        }
    }

    pub(crate) fn remove_from_bucket(&self, key: &EffectiveUri, cookie: &HttpCookie) -> bool {
        match self.buckets.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let bucket = entry.get_mut();
                let before = bucket.len();
                bucket.retain(|c| !c.same_identity(cookie));
                let removed = bucket.len() != before;
                if bucket.is_empty() {
                    entry.remove();
                }
                removed
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Drop every cookie. Always succeeds.
    pub fn remove_all(&self) -> bool {
        self.buckets.clear();
        self.unbound().clear();
        true
    }

    /// Cookies applicable to a request for `url`.
    ///
    /// Secure cookies are only returned for `https`/`wss`. Expired cookies
    /// met on the way are pruned from the index.
    pub fn get(&self, url: &Url) -> Vec<HttpCookie> {
        self.get_pruning(url).cookies
    }

    pub(crate) fn get_pruning(&self, url: &Url) -> PrunedRead {
        let mut read = PrunedRead {
            cookies: Vec::new(),
            pruned: Vec::new(),
        };
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return read,
        };
        let own_key = EffectiveUri::from_url(url).ok();
        let now = now_millis();

        // Own bucket first so its cookies win identity collisions.
        if let Some(key) = &own_key {
            if let Some(mut bucket) = self.buckets.get_mut(key) {
                if prune_expired(bucket.value_mut(), now) {
                    read.pruned.push(key.clone());
                }
                collect_matching(&mut read.cookies, bucket.value(), Some(key.host()), &host, url);
            }
        }

        for mut bucket in self.buckets.iter_mut() {
            if own_key.as_ref() == Some(bucket.key()) {
                continue;
            }
            if prune_expired(bucket.value_mut(), now) {
                read.pruned.push(bucket.key().clone());
            }
            collect_matching(
                &mut read.cookies,
                bucket.value(),
                Some(bucket.key().host()),
                &host,
                url,
            );
        }

        {
            let mut unbound = self.unbound();
            prune_expired(&mut unbound, now);
            collect_matching(&mut read.cookies, &unbound, None, &host, url);
        }

        self.drop_empty(&read.pruned);
        read
    }

    /// `Cookie` request header for `url`, if any cookie applies.
    ///
    /// Longer paths come first, then older cookies.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        render_cookie_header(self.get(url))
    }

    /// Snapshot of every unexpired cookie, bound or not.
    pub fn get_cookies(&self) -> Vec<HttpCookie> {
        self.get_cookies_pruning().cookies
    }

    pub(crate) fn get_cookies_pruning(&self) -> PrunedRead {
        let now = now_millis();
        let mut read = PrunedRead {
            cookies: Vec::new(),
            pruned: Vec::new(),
        };

        for mut bucket in self.buckets.iter_mut() {
            if prune_expired(bucket.value_mut(), now) {
                read.pruned.push(bucket.key().clone());
            }
            read.cookies.extend(bucket.value().iter().cloned());
        }

        {
            let mut unbound = self.unbound();
            prune_expired(&mut unbound, now);
            read.cookies.extend(unbound.iter().cloned());
        }

        self.drop_empty(&read.pruned);
        read
    }

    /// Keys of all current buckets, sorted.
    pub fn get_uris(&self) -> Vec<EffectiveUri> {
        let mut uris: Vec<EffectiveUri> = self.buckets.iter().map(|e| e.key().clone()).collect();
        uris.sort();
        uris
    }

    /// Copy of one bucket.
    pub fn bucket(&self, key: &EffectiveUri) -> Option<Vec<HttpCookie>> {
        self.buckets.get(key).map(|b| b.value().clone())
    }

    /// Copy of every bucket, keyed and ordered by effective URI.
    pub fn buckets(&self) -> BTreeMap<EffectiveUri, Vec<HttpCookie>> {
        self.buckets
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Install a restored bucket as-is, bypassing identity merging.
    pub(crate) fn install_bucket(&self, key: EffectiveUri, cookies: Vec<HttpCookie>) {
        if cookies.is_empty() {
            self.buckets.remove(&key);
        } else {
            self.buckets.insert(key, cookies);
        }
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.buckets.iter().map(|e| e.value().len()).sum::<usize>() + self.unbound().len()
    }

    /// Parse a `Set-Cookie` header received from `url` and add the result.
    pub fn parse_and_save_cookie(&self, url: &Url, cookie_line: &str) -> Result<(), StoreError> {
        let cookie = HttpCookie::from_set_cookie(url, cookie_line, true)?;
        self.add(Some(url), cookie)
    }

    fn drop_empty(&self, keys: &[EffectiveUri]) {
        for key in keys {
            self.buckets.remove_if(key, |_, bucket| bucket.is_empty());
        }
    }

    /// Check if cookie domain matches request host.
    ///
    /// Version 0 cookies use Netscape suffix matching: a leading dot is
    /// ignored and any subdomain matches. Version 1 cookies follow RFC 2965:
    /// the domain needs an embedded dot and only one extra label is allowed.
    pub fn domain_matches(cookie_domain: &str, request_host: &str, version: i32) -> bool {
        if cookie_domain.is_empty() || request_host.is_empty() {
            return false;
        }
        let domain = cookie_domain.to_ascii_lowercase();
        let host = request_host.to_ascii_lowercase();

        if version == 0 {
            let domain = domain.trim_start_matches('.');
            if host == domain {
                return true;
            }
            return host.len() > domain.len()
                && host.ends_with(domain)
                && host.as_bytes()[host.len() - domain.len() - 1] == b'.';
        }

        let is_local = domain == ".local";
        let mut embedded_dot = domain.find('.');
        if embedded_dot == Some(0) {
            embedded_dot = domain[1..].find('.').map(|i| i + 1);
        }
        let trailing_only = embedded_dot.is_none() || embedded_dot == Some(domain.len() - 1);
        if !is_local && trailing_only {
            return false;
        }

        if !host.contains('.') && (is_local || domain == format!("{}.local", host)) {
            return true;
        }

        match host.len() as isize - domain.len() as isize {
            0 => host == domain,
            diff if diff > 0 => {
                let (prefix, suffix) = host.split_at(diff as usize);
                !prefix.contains('.') && suffix == domain
            }
            -1 => domain.starts_with('.') && host == domain[1..],
            _ => false,
        }
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching; an empty cookie path matches all.
    pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if cookie_path.is_empty() || request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            if cookie_path.ends_with('/') {
                return true;
            }
            return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
        }

        false
    }
}

/// Drop expired cookies; returns whether any were dropped.
fn prune_expired(cookies: &mut Vec<HttpCookie>, now: i64) -> bool {
    let before = cookies.len();
    cookies.retain(|c| !c.is_expired_at(now));
    cookies.len() != before
}

/// Append the cookies of one bucket that apply to `host`/`url`, skipping
/// identities already collected.
fn collect_matching(
    out: &mut Vec<HttpCookie>,
    bucket: &[HttpCookie],
    bucket_host: Option<&str>,
    host: &str,
    url: &Url,
) {
    let secure_scheme = matches!(url.scheme(), "https" | "wss");
    for cookie in bucket {
        if cookie.secure() && !secure_scheme {
            continue;
        }
        let domain_ok = if cookie.domain().is_empty() {
            bucket_host == Some(host)
        } else {
            MemoryCookieStore::domain_matches(cookie.domain(), host, cookie.version())
        };
        if !domain_ok || !MemoryCookieStore::path_matches(cookie.path(), url.path()) {
            continue;
        }
        if out.iter().any(|c| c.same_identity(cookie)) {
            continue;
        }
        out.push(cookie.clone());
    }
}

pub(crate) fn render_cookie_header(mut cookies: Vec<HttpCookie>) -> Option<String> {
    // Sort by path length (longest first) then creation time
    cookies.sort_by(|a, b| {
        b.path()
            .len()
            .cmp(&a.path().len())
            .then_with(|| a.creation_time().cmp(&b.creation_time()))
    });

    if cookies.is_empty() {
        return None;
    }

    Some(
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
