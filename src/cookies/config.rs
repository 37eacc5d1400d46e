//! Cookie store configuration.

/// Namespace used when no name is configured.
pub const DEFAULT_STORE_NAME: &str = "cookies";

/// Configuration for [`PersistentCookieStore`](crate::cookies::persistentstore::PersistentCookieStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieStoreConfig {
    /// Backing-store namespace; also selects the shared store lock.
    pub name: String,
    /// Skip cookies that are already expired while loading.
    pub drop_expired_on_load: bool,
    /// Write back buckets that shrank through expiry on the read path.
    pub persist_pruned: bool,
    /// Reject `Set-Cookie` domains that are public suffixes.
    pub validate_public_suffix: bool,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            drop_expired_on_load: false,
            persist_pruned: true,
            validate_public_suffix: true,
        }
    }
}

impl CookieStoreConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Drop expired cookies at load time instead of restoring them verbatim.
    pub fn drop_expired_on_load(mut self, drop: bool) -> Self {
        self.drop_expired_on_load = drop;
        self
    }

    /// Enable or disable read-path write-back.
    pub fn persist_pruned(mut self, persist: bool) -> Self {
        self.persist_pruned = persist;
        self
    }

    /// Enable or disable public suffix validation.
    pub fn validate_public_suffix(mut self, validate: bool) -> Self {
        self.validate_public_suffix = validate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CookieStoreConfig::default();
        assert_eq!(config.name, "cookies");
        assert!(!config.drop_expired_on_load);
        assert!(config.persist_pruned);
        assert!(config.validate_public_suffix);
    }

    #[test]
    fn test_builder_pattern() {
        let config = CookieStoreConfig::new()
            .name("session-jar")
            .drop_expired_on_load(true)
            .persist_pruned(false);

        assert_eq!(config.name, "session-jar");
        assert!(config.drop_expired_on_load);
        assert!(!config.persist_pruned);
        assert!(config.validate_public_suffix);
    }
}
