//! TrackingCache: a read-through cache that records local changes and
//! commits them in one batch
//!
//! | state      | add          | update         | delete          |
//! |------------|--------------|----------------|-----------------|
//! | absent     | -> Added     | InvalidState   | no-op, false    |
//! | Unmodified | DuplicateKey | -> Modified    | -> Deleted      |
//! | Added      | DuplicateKey | stays Added    | removed         |
//! | Modified   | DuplicateKey | stays Modified | -> Deleted      |
//! | Deleted    | DuplicateKey | InvalidState   | stays Deleted   |

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::builder::CacheBuilder;
use crate::config::CacheConfig;
use crate::entry::EntryState;
use crate::error::{Result, SourceError};
use crate::key::KeyExtractor;
use crate::read_only::ReadOnlyCache;
use crate::source::{Cacheable, ChangeSet, Persist};
use crate::stats::CacheStats;

/// Cache with add/update/delete tracking and an explicit [`save`](TrackingCache::save)
pub struct TrackingCache<K, V> {
    reads: ReadOnlyCache<K, V>,
    persist: Arc<dyn Persist<V>>,
}

impl<K, V> TrackingCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create a tracking cache over `store`, keyed by `keys`
    pub fn new<S>(keys: KeyExtractor<K, V>, store: S, config: CacheConfig) -> Self
    where
        S: Cacheable<K, V> + 'static,
    {
        let store = Arc::new(store);
        let persist: Arc<dyn Persist<V>> = store.clone();
        Self {
            reads: ReadOnlyCache::from_boxed(keys, Box::new(store), config),
            persist,
        }
    }

    /// Start building a cache
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    /// Read-only view of this cache
    pub fn as_read_only(&self) -> &ReadOnlyCache<K, V> {
        &self.reads
    }

    /// See [`ReadOnlyCache::fetch`]
    pub fn fetch(&self, key: &K) -> Result<Option<V>> {
        self.reads.fetch(key)
    }

    /// See [`ReadOnlyCache::fetch_with`]
    pub fn fetch_with<F>(&self, key: &K, loader: F) -> Result<Option<V>>
    where
        F: FnOnce(&K) -> std::result::Result<Option<V>, SourceError>,
    {
        self.reads.fetch_with(key, loader)
    }

    /// See [`ReadOnlyCache::fetch_all`]
    pub fn fetch_all(&self) -> Result<Vec<V>> {
        self.reads.fetch_all()
    }

    /// See [`ReadOnlyCache::fetch_all_with`]
    pub fn fetch_all_with<F>(&self, loader: F) -> Result<Vec<V>>
    where
        F: FnOnce() -> std::result::Result<Vec<V>, SourceError>,
    {
        self.reads.fetch_all_with(loader)
    }

    /// Drop every entry, pending changes included
    pub fn clear_all(&self) {
        self.reads.clear_all()
    }

    /// Insert a new value in the `Added` state
    ///
    /// Fails with `DuplicateKey` if its key is already cached, in any state.
    pub fn add(&self, value: V) -> Result<()> {
        self.reads.store().add(value)
    }

    /// Replace a cached value.
    ///
    /// An `Added` entry stays `Added`; anything else becomes `Modified`.
    /// Fails with `InvalidState` if the key is absent or deleted.
    pub fn update(&self, value: V) -> Result<()> {
        self.reads.store().update(value)
    }

    /// Replace the value for `key` with `merge(dto, current)`
    pub fn update_with<D, F>(&self, key: &K, dto: D, merge: F) -> Result<()>
    where
        F: FnOnce(D, &V) -> V,
    {
        self.reads.store().update_with(key, dto, merge)
    }

    /// Update several values at once. If any of them cannot be updated,
    /// none are.
    pub fn update_many<I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
    {
        self.reads.store().update_many(values)
    }

    /// Delete by key.
    ///
    /// # Returns
    /// * `true` - The key was cached (and is now deleted or retracted)
    /// * `false` - The key was not cached
    pub fn delete(&self, key: &K) -> bool {
        self.reads.store().delete(key)
    }

    /// Delete the entry for `value`'s key
    pub fn delete_value(&self, value: &V) -> bool {
        let key = self.reads.keys().key_of(value);
        self.delete(&key)
    }

    /// Changes the next [`save`](TrackingCache::save) would commit
    pub fn pending(&self) -> ChangeSet<V> {
        self.reads.store().pending()
    }

    /// Commit added, deleted and modified entries to the backing store.
    ///
    /// On success every entry is `Unmodified` again; what happens to
    /// deleted entries is set by [`DeletedPolicy`](crate::DeletedPolicy).
    /// On failure nothing changes and `save` can be retried.
    pub fn save(&self) -> Result<()> {
        self.reads.store().save(self.persist.as_ref())
    }

    /// See [`ReadOnlyCache::contains`]
    pub fn contains(&self, key: &K) -> bool {
        self.reads.contains(key)
    }

    /// See [`ReadOnlyCache::state_of`]
    pub fn state_of(&self, key: &K) -> Option<EntryState> {
        self.reads.state_of(key)
    }

    /// Number of entries, including deleted ones awaiting save
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        self.reads.stats()
    }
}
