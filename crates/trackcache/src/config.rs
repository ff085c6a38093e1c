//! Cache configuration

use serde::{Deserialize, Serialize};

/// What a successful save does with entries that were marked deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedPolicy {
    /// Reset them to unmodified and keep them cached. They show up in
    /// fetch results again unless the caller also clears the cache.
    #[default]
    Retain,
    /// Drop them from the cache so the next fetch asks the backing store
    Evict,
}

/// Settings shared by the read-only and tracking caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Label attached to log events
    pub name: String,

    /// Number of entries to reserve room for up front
    pub initial_capacity: usize,

    /// Handling of deleted entries after a successful save
    pub deleted_policy: DeletedPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "cache".to_string(),
            initial_capacity: 0,
            deleted_policy: DeletedPolicy::Retain,
        }
    }
}

impl CacheConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reserve room for `capacity` entries
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Choose what save does with deleted entries
    pub fn with_deleted_policy(mut self, policy: DeletedPolicy) -> Self {
        self.deleted_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.name, "cache");
        assert_eq!(config.initial_capacity, 0);
        assert_eq!(config.deleted_policy, DeletedPolicy::Retain);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{ "deleted_policy": "evict" }"#).unwrap();
        assert_eq!(config.deleted_policy, DeletedPolicy::Evict);
        assert_eq!(config.name, "cache");
    }

    #[test]
    fn test_builder_setters() {
        let config = CacheConfig::new()
            .with_name("users")
            .with_initial_capacity(64)
            .with_deleted_policy(DeletedPolicy::Evict);
        assert_eq!(config.name, "users");
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.deleted_policy, DeletedPolicy::Evict);
    }
}
