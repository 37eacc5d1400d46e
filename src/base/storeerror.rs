use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    // Argument Errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("Invalid URI: {uri}")]
    InvalidUri { uri: String },
    #[error("Invalid cookie name: {name:?}")]
    InvalidCookieName { name: String },

    // Codec Errors
    #[error("Cookie record decode failed: {reason}")]
    Decode { reason: String },
    #[error("Cookie record encode failed: {reason}")]
    Encode { reason: String },

    // Backing Store Errors
    /// The index was updated but the change did not reach the backing store.
    ///
    /// `index_removed` carries the result `remove` would have returned, so
    /// callers keep the index-level answer even when the commit failed.
    #[error("Backing store commit failed: {reason}")]
    Persistence {
        index_removed: Option<bool>,
        reason: String,
    },
    #[error("Backing store unavailable: {reason}")]
    Backend { reason: String },
    #[error("Backing store is locked")]
    BackendLocked,
}

impl StoreError {
    pub fn as_i32(&self) -> i32 {
        match self {
            StoreError::InvalidArgument { .. } => -1,
            StoreError::InvalidUri { .. } => -2,
            StoreError::InvalidCookieName { .. } => -3,

            StoreError::Decode { .. } => -100,
            StoreError::Encode { .. } => -101,

            StoreError::Persistence { .. } => -200,
            StoreError::Backend { .. } => -201,
            StoreError::BackendLocked => -202,
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        StoreError::InvalidUri { uri: uri.into() }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        StoreError::Decode {
            reason: reason.into(),
        }
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        StoreError::Backend {
            reason: reason.into(),
        }
    }

    /// Wrap a backend failure that happened after the index was mutated.
    pub fn not_durable(index_removed: Option<bool>, cause: StoreError) -> Self {
        StoreError::Persistence {
            index_removed,
            reason: cause.to_string(),
        }
    }

    /// True for failures that left the index updated but the backing store behind.
    pub fn is_persistence(&self) -> bool {
        matches!(self, StoreError::Persistence { .. })
    }

    /// The `remove` result carried by a persistence failure, if any.
    pub fn index_removed(&self) -> Option<bool> {
        match self {
            StoreError::Persistence { index_removed, .. } => *index_removed,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Encode {
                reason: err.to_string(),
            }
        } else {
            StoreError::Decode {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ffi::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ffi::ErrorCode::DatabaseLocked =>
            {
                StoreError::BackendLocked
            }
            _ => StoreError::Backend {
                reason: err.to_string(),
            },
        }
    }
}
