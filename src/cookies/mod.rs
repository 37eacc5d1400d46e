//! Cookie storage with durable mirroring.
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`HttpCookie`](httpcookie::HttpCookie) | Single cookie, identity by (name, domain, path) |
//! | [`EffectiveUri`](effectiveuri::EffectiveUri) | `scheme://host[:port]` bucket key |
//! | [`MemoryCookieStore`](memorystore::MemoryCookieStore) | In-memory index, domain/path matching |
//! | [`PersistentCookieStore`](persistentstore::PersistentCookieStore) | Index mirrored to a [`KeyValueStore`](crate::storage::KeyValueStore) |
//! | [`codec`] | JSON bucket format |
//! | [`psl`] | Public suffix checks for `Set-Cookie` domains |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cookiestore::cookies::PersistentCookieStore;
//! use cookiestore::storage::memory::MemoryKeyValueStore;
//! use url::Url;
//!
//! let backend = Arc::new(MemoryKeyValueStore::new());
//! let store = PersistentCookieStore::open_named(backend.clone(), "doc-example")?;
//!
//! let url = Url::parse("https://www.example.com/account").unwrap();
//! store.store_response_cookie(&url, "sid=abc; Path=/; Max-Age=3600")?;
//! assert_eq!(store.cookie_header(&url).as_deref(), Some("sid=abc"));
//!
//! // A second store over the same namespace sees the same cookies.
//! let reopened = PersistentCookieStore::open_named(backend, "doc-example")?;
//! assert_eq!(reopened.total_cookie_count(), 1);
//! # Ok::<(), cookiestore::base::storeerror::StoreError>(())
//! ```

pub mod codec;
pub mod config;
pub mod effectiveuri;
pub mod httpcookie;
pub mod locks;
pub mod memorystore;
pub mod persistentstore;
pub mod psl;

pub use config::CookieStoreConfig;
pub use effectiveuri::EffectiveUri;
pub use httpcookie::HttpCookie;
pub use memorystore::MemoryCookieStore;
pub use persistentstore::PersistentCookieStore;
