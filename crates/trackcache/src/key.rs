//! Key extraction: maps a cached value to the key it is stored under

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Values that can expose one of their fields as a cache key by name.
///
/// Implement this to build a [`KeyExtractor`] from a property name
/// (e.g. one read from configuration) instead of a closure.
pub trait KeyProperty<K> {
    /// Accessor for the property called `name`, or `None` if there is no
    /// such property
    fn key_accessor(name: &str) -> Option<fn(&Self) -> K>;
}

/// Function from a value to its cache key, fixed at construction
pub struct KeyExtractor<K, V> {
    f: Arc<dyn Fn(&V) -> K + Send + Sync>,
}

impl<K, V> KeyExtractor<K, V> {
    /// Wrap a key function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Resolve a key accessor from a property name.
    ///
    /// The name is checked once, here. An unknown property is a
    /// configuration error and no extractor is produced.
    pub fn from_property(name: &str) -> Result<Self>
    where
        V: KeyProperty<K> + 'static,
        K: 'static,
    {
        if name.is_empty() {
            return Err(Error::validation("key_property_name"));
        }
        let accessor = V::key_accessor(name).ok_or_else(|| {
            Error::Configuration(format!(
                "the property ({}) does not exist on the type ({})",
                name,
                short_type_name::<V>()
            ))
        })?;

        Ok(Self::new(accessor))
    }

    /// Derive the key for `value`
    pub fn key_of(&self, value: &V) -> K {
        (self.f)(value)
    }
}

impl<K, V> Clone for KeyExtractor<K, V> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<K, V> fmt::Debug for KeyExtractor<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyExtractor").finish_non_exhaustive()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
