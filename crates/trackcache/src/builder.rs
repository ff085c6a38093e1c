//! Builder shared by the read-only and tracking caches

use std::fmt::Debug;
use std::hash::Hash;

use crate::config::{CacheConfig, DeletedPolicy};
use crate::error::{Error, Result};
use crate::key::{KeyExtractor, KeyProperty};
use crate::read_only::ReadOnlyCache;
use crate::source::{Cacheable, ReadSource};
use crate::tracking::TrackingCache;

/// Collects a key extractor and settings, then builds a cache over a source
pub struct CacheBuilder<K, V> {
    keys: Option<Result<KeyExtractor<K, V>>>,
    config: CacheConfig,
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self { keys: None, config: CacheConfig::default() }
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Empty builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Key values with a closure
    pub fn key_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        self.keys = Some(Ok(KeyExtractor::new(f)));
        self
    }

    /// Key values with an existing extractor
    pub fn keys(mut self, keys: KeyExtractor<K, V>) -> Self {
        self.keys = Some(Ok(keys));
        self
    }

    /// Key values by a named property. An unknown name makes `build` fail.
    pub fn key_property(mut self, name: &str) -> Self
    where
        V: KeyProperty<K> + 'static,
        K: 'static,
    {
        self.keys = Some(KeyExtractor::from_property(name));
        self
    }

    /// Replace all settings
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the log label
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Choose what save does with deleted entries
    pub fn deleted_policy(mut self, policy: DeletedPolicy) -> Self {
        self.config.deleted_policy = policy;
        self
    }

    /// Build a read-only cache over `source`
    pub fn build_read_only<S>(self, source: S) -> Result<ReadOnlyCache<K, V>>
    where
        S: ReadSource<K, V> + 'static,
    {
        let (keys, config) = self.finish()?;
        Ok(ReadOnlyCache::new(keys, source, config))
    }

    /// Build a tracking cache over `store`
    pub fn build<S>(self, store: S) -> Result<TrackingCache<K, V>>
    where
        S: Cacheable<K, V> + 'static,
    {
        let (keys, config) = self.finish()?;
        Ok(TrackingCache::new(keys, store, config))
    }

    fn finish(self) -> Result<(KeyExtractor<K, V>, CacheConfig)> {
        let keys = self.keys.ok_or_else(|| Error::validation("key"))??;
        Ok((keys, self.config))
    }
}
