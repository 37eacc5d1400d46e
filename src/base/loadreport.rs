use crate::base::storeerror::StoreError;

/// Why a single backing-store entry was skipped during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEntryError {
    /// The key is not a URI with a host.
    MalformedKey { key: String, error: StoreError },
    /// The value could not be decoded into a cookie list.
    MalformedValue { key: String, error: StoreError },
}

impl LoadEntryError {
    /// The backing-store key of the skipped entry.
    pub fn key(&self) -> &str {
        match self {
            LoadEntryError::MalformedKey { key, .. } | LoadEntryError::MalformedValue { key, .. } => {
                key
            }
        }
    }

    pub fn error(&self) -> &StoreError {
        match self {
            LoadEntryError::MalformedKey { error, .. }
            | LoadEntryError::MalformedValue { error, .. } => error,
        }
    }
}

/// Outcome of restoring a store from its backing namespace.
///
/// Loading never aborts on a bad entry; each one is recorded here and the
/// rest of the namespace is still restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of buckets installed into the index.
    pub buckets_loaded: usize,
    /// Number of cookies across those buckets.
    pub cookies_loaded: usize,
    /// Entries decoded as an empty list and therefore not installed.
    pub empty_entries: usize,
    /// Entries that failed to parse.
    pub failures: Vec<LoadEntryError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Keys of the entries that failed to load, in enumeration order.
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(LoadEntryError::key).collect()
    }
}
