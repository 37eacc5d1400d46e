use crate::base::loadreport::{LoadEntryError, LoadReport};
use crate::base::storeerror::StoreError;
use crate::cookies::codec;
use crate::cookies::config::CookieStoreConfig;
use crate::cookies::effectiveuri::EffectiveUri;
use crate::cookies::httpcookie::{now_millis, HttpCookie};
use crate::cookies::locks::{acquire, lock_for};
use crate::cookies::memorystore::{render_cookie_header, MemoryCookieStore};
use crate::storage::{EditBatch, KeyValueStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use url::Url;

/// Cookie store mirrored to a [`KeyValueStore`] namespace.
///
/// Wraps a [`MemoryCookieStore`] and keeps the backend in step with it:
/// every bucket touched by a mutation is re-encoded and committed under its
/// effective URI, and a bucket that became empty has its key removed.
///
/// All operations, reads included, run under the lock shared by every store
/// with the same [`name`](CookieStoreConfig::name).
///
/// When a commit fails the index keeps the change and the call returns
/// [`StoreError::Persistence`]; for `remove` the error carries the boolean
/// the index produced.
pub struct PersistentCookieStore {
    index: MemoryCookieStore,
    backend: Arc<dyn KeyValueStore>,
    config: CookieStoreConfig,
    lock: Arc<Mutex<()>>,
    load_report: LoadReport,
}

impl PersistentCookieStore {
    /// Open the store and restore every entry of its namespace.
    ///
    /// Entries with a malformed key or value are skipped and listed in
    /// [`load_report`](Self::load_report). Only a failure to enumerate the
    /// namespace at all is returned as an error.
    pub fn open(
        backend: Arc<dyn KeyValueStore>,
        config: CookieStoreConfig,
    ) -> Result<Self, StoreError> {
        let mut store = Self {
            index: MemoryCookieStore::new(),
            backend,
            lock: lock_for(&config.name),
            config,
            load_report: LoadReport::default(),
        };
        store.load()?;
        Ok(store)
    }

    /// Open a store named `name` with default settings.
    pub fn open_named(
        backend: Arc<dyn KeyValueStore>,
        name: impl Into<String>,
    ) -> Result<Self, StoreError> {
        Self::open(backend, CookieStoreConfig::new().name(name))
    }

    fn load(&mut self) -> Result<(), StoreError> {
        let lock = self.lock.clone();
        let _guard = acquire(&lock);

        let entries = self.backend.get_all(&self.config.name)?;
        let now = now_millis();
        let mut report = LoadReport::default();
        let mut cleanup = EditBatch::new();
        let mut rewritten = BTreeSet::new();

        for (key, value) in entries {
            let uri = match EffectiveUri::parse(&key) {
                Ok(uri) => uri,
                Err(error) => {
                    tracing::warn!(store = %self.config.name, key = %key, error = %error, "skipping cookie entry with malformed key");
                    report.failures.push(LoadEntryError::MalformedKey { key, error });
                    continue;
                }
            };

            let mut cookies = match codec::decode(&value) {
                Ok(cookies) => cookies,
                Err(error) => {
                    tracing::warn!(store = %self.config.name, key = %key, error = %error, "skipping undecodable cookie entry");
                    report.failures.push(LoadEntryError::MalformedValue { key, error });
                    continue;
                }
            };

            let mut rewrite = false;
            if self.config.drop_expired_on_load {
                let before = cookies.len();
                cookies.retain(|c| !c.is_expired_at(now));
                rewrite = cookies.len() != before;
            }

            if cookies.is_empty() {
                report.empty_entries += 1;
                cleanup = cleanup.remove(key);
                continue;
            }

            // Non-canonical keys are folded into the canonical one; a later
            // entry for the same bucket replaces an earlier one.
            if uri.as_str() != key {
                cleanup = cleanup.remove(key);
                rewrite = true;
            }
            if rewrite {
                rewritten.insert(uri.clone());
            }

            if let Some(previous) = self.index.bucket(&uri) {
                report.buckets_loaded -= 1;
                report.cookies_loaded -= previous.len();
            }
            report.buckets_loaded += 1;
            report.cookies_loaded += cookies.len();
            self.index.install_bucket(uri, cookies);
        }

        // Written from the bucket that ended up installed, after every
        // removal staged above.
        for uri in &rewritten {
            if let Some(cookies) = self.index.bucket(uri) {
                if let Ok(blob) = codec::encode(&cookies) {
                    cleanup = cleanup.put(uri.as_str(), blob);
                }
            }
        }

        if !cleanup.is_empty() {
            if let Err(e) = self.backend.commit(&self.config.name, cleanup) {
                tracing::warn!(store = %self.config.name, error = %e, "failed to drop stale cookie entries");
            }
        }

        tracing::debug!(
            store = %self.config.name,
            buckets = report.buckets_loaded,
            cookies = report.cookies_loaded,
            failures = report.failures.len(),
            "cookie store loaded"
        );
        self.load_report = report;
        Ok(())
    }

    /// Store name, which is also the backend namespace.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CookieStoreConfig {
        &self.config
    }

    /// What happened while the store was loaded.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Set `cookie` for `uri` and persist the affected bucket.
    ///
    /// With `uri == None` the cookie is kept unbound and nothing is written.
    pub fn add(&self, uri: Option<&Url>, cookie: HttpCookie) -> Result<(), StoreError> {
        let _guard = acquire(&self.lock);

        let Some(url) = uri else {
            return self.index.add(None, cookie);
        };
        let key = EffectiveUri::from_url(url)?;
        tracing::trace!(store = %self.config.name, uri = %key, cookie = %cookie.name(), "add cookie");
        self.index.add_to_bucket(&key, cookie);

        self.sync_buckets(std::slice::from_ref(&key))
            .map_err(|e| StoreError::not_durable(None, e))
    }

    /// Remove the cookie sharing `cookie`'s identity from `uri`'s bucket.
    ///
    /// Returns whether the index held such a cookie. If the backend commit
    /// fails the answer is carried in [`StoreError::index_removed`].
    pub fn remove(&self, uri: Option<&Url>, cookie: &HttpCookie) -> Result<bool, StoreError> {
        let _guard = acquire(&self.lock);

        let Some(url) = uri else {
            return self.index.remove(None, cookie);
        };
        let key = EffectiveUri::from_url(url)?;
        let removed = self.index.remove_from_bucket(&key, cookie);
        tracing::trace!(store = %self.config.name, uri = %key, cookie = %cookie.name(), removed, "remove cookie");

        self.sync_buckets(std::slice::from_ref(&key))
            .map_err(|e| StoreError::not_durable(Some(removed), e))?;
        Ok(removed)
    }

    /// Drop every cookie and clear the namespace in one commit.
    pub fn remove_all(&self) -> Result<bool, StoreError> {
        let _guard = acquire(&self.lock);

        let removed = self.index.remove_all();
        self.backend
            .commit(&self.config.name, EditBatch::new().clear())
            .map_err(|e| {
                tracing::error!(store = %self.config.name, error = %e, "failed to clear cookie namespace");
                StoreError::not_durable(None, e)
            })?;
        tracing::debug!(store = %self.config.name, "cookie store cleared");
        Ok(removed)
    }

    /// Cookies applicable to a request for `url`.
    pub fn get(&self, url: &Url) -> Vec<HttpCookie> {
        let _guard = acquire(&self.lock);

        let read = self.index.get_pruning(url);
        self.write_back(&read.pruned);
        read.cookies
    }

    /// Snapshot of every unexpired cookie.
    pub fn get_cookies(&self) -> Vec<HttpCookie> {
        let _guard = acquire(&self.lock);

        let read = self.index.get_cookies_pruning();
        self.write_back(&read.pruned);
        read.cookies
    }

    /// Keys of all current buckets, sorted.
    pub fn get_uris(&self) -> Vec<EffectiveUri> {
        let _guard = acquire(&self.lock);
        self.index.get_uris()
    }

    /// Copy of every bucket, keyed by effective URI.
    pub fn buckets(&self) -> BTreeMap<EffectiveUri, Vec<HttpCookie>> {
        let _guard = acquire(&self.lock);
        self.index.buckets()
    }

    /// `Cookie` request header for `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        render_cookie_header(self.get(url))
    }

    /// Parse a `Set-Cookie` header received from `url`, then [`add`](Self::add) it.
    pub fn store_response_cookie(&self, url: &Url, header: &str) -> Result<(), StoreError> {
        let cookie =
            HttpCookie::from_set_cookie(url, header, self.config.validate_public_suffix)?;
        self.add(Some(url), cookie)
    }

    pub fn total_cookie_count(&self) -> usize {
        let _guard = acquire(&self.lock);
        self.index.total_cookie_count()
    }

    /// Rewrite (or delete) the backend entry of each bucket in `keys`.
    ///
    /// Caller must hold the store lock.
    fn sync_buckets(&self, keys: &[EffectiveUri]) -> Result<(), StoreError> {
        let mut batch = EditBatch::new();
        for key in keys {
            batch = match self.index.bucket(key) {
                Some(cookies) => batch.put(key.as_str(), codec::encode(&cookies)?),
                None => batch.remove(key.as_str()),
            };
        }

        self.backend.commit(&self.config.name, batch).map_err(|e| {
            tracing::error!(store = %self.config.name, error = %e, "cookie commit failed");
            e
        })
    }

    fn write_back(&self, pruned: &[EffectiveUri]) {
        if !self.config.persist_pruned || pruned.is_empty() {
            return;
        }
        if let Err(e) = self.sync_buckets(pruned) {
            tracing::warn!(store = %self.config.name, buckets = pruned.len(), error = %e, "expired cookies pruned from index only");
        }
    }
}
