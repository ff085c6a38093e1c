//! CacheStore: the guarded key -> entry map and its state machine
//!
//! One mutex covers the whole map and the all-loaded flag. Every public
//! operation holds it from start to finish, including calls out to the
//! backing store, so two misses on the same key cannot both load.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use ahash::RandomState;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::{CacheConfig, DeletedPolicy};
use crate::entry::{CacheEntry, EntryState};
use crate::error::{Error, Result, SourceError};
use crate::key::KeyExtractor;
use crate::source::{ChangeSet, Persist};
use crate::stats::CacheStats;

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>, RandomState>,
    all_loaded: bool,
}

/// Key -> entry map with a single guard and an "all loaded" flag
pub(crate) struct CacheStore<K, V> {
    inner: Mutex<Inner<K, V>>,
    keys: KeyExtractor<K, V>,
    stats: CacheStats,
    config: CacheConfig,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub(crate) fn new(keys: KeyExtractor<K, V>, config: CacheConfig) -> Self {
        let entries =
            HashMap::with_capacity_and_hasher(config.initial_capacity, RandomState::new());
        Self {
            inner: Mutex::new(Inner { entries, all_loaded: false }),
            keys,
            stats: CacheStats::new(),
            config,
        }
    }

    pub(crate) fn keys(&self) -> &KeyExtractor<K, V> {
        &self.keys
    }

    pub(crate) fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up `key`, calling `loader` on a miss and caching what it returns
    pub(crate) fn fetch_with<F>(&self, key: &K, loader: F) -> Result<Option<V>>
    where
        F: FnOnce(&K) -> std::result::Result<Option<V>, SourceError>,
    {
        let mut inner = self.inner.lock();

        if let Some(entry) = inner.entries.get(key) {
            self.stats.record_hit();
            return Ok(entry.visible().cloned());
        }

        self.stats.record_miss();
        let loaded = loader(key).map_err(|e| {
            warn!(cache = %self.config.name, ?key, error = %e, "fetch from backing store failed");
            Error::Source(e)
        })?;

        if let Some(value) = &loaded {
            let loaded_key = self.keys.key_of(value);
            if loaded_key != *key {
                warn!(cache = %self.config.name, ?key, ?loaded_key, "backing store returned a value for another key");
                return Err(Error::key_mismatch(key, &loaded_key));
            }

            self.stats.record_load();
            inner.entries.insert(loaded_key, CacheEntry::loaded(value.clone()));
            debug!(cache = %self.config.name, ?key, "loaded from backing store");
        }

        Ok(loaded)
    }

    /// Bulk-load once, then return every visible value
    pub(crate) fn fetch_all_with<F>(&self, loader: F) -> Result<Vec<V>>
    where
        F: FnOnce() -> std::result::Result<Vec<V>, SourceError>,
    {
        let mut inner = self.inner.lock();

        if !inner.all_loaded {
            let values = loader().map_err(|e| {
                warn!(cache = %self.config.name, error = %e, "bulk load from backing store failed");
                Error::Source(e)
            })?;

            let total = values.len();
            let mut merged = 0;
            for value in values {
                let key = self.keys.key_of(&value);
                if let Entry::Vacant(slot) = inner.entries.entry(key) {
                    slot.insert(CacheEntry::loaded(value));
                    merged += 1;
                }
            }

            inner.all_loaded = true;
            self.stats.record_bulk_load();
            debug!(cache = %self.config.name, total, merged, "bulk load merged");
        }

        Ok(inner.entries.values().filter_map(|e| e.visible().cloned()).collect())
    }

    pub(crate) fn clear_all(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.all_loaded = false;
        self.stats.reset();
        debug!(cache = %self.config.name, "cleared");
    }

    pub(crate) fn add(&self, value: V) -> Result<()> {
        let key = self.keys.key_of(&value);
        let mut inner = self.inner.lock();

        match inner.entries.entry(key) {
            Entry::Occupied(slot) => Err(Error::duplicate_key(slot.key())),
            Entry::Vacant(slot) => {
                trace!(cache = %self.config.name, key = ?slot.key(), "added");
                slot.insert(CacheEntry::added(value));
                Ok(())
            }
        }
    }

    pub(crate) fn update(&self, value: V) -> Result<()> {
        let key = self.keys.key_of(&value);
        let mut inner = self.inner.lock();
        let state = Self::update_target(&inner, &key)?;
        self.replace(&mut inner, key, value, state);
        Ok(())
    }

    pub(crate) fn update_with<D, F>(&self, key: &K, dto: D, merge: F) -> Result<()>
    where
        F: FnOnce(D, &V) -> V,
    {
        let mut inner = self.inner.lock();
        let state = Self::update_target(&inner, key)?;
        let value = match inner.entries.get(key) {
            Some(entry) => merge(dto, &entry.value),
            None => return Err(Error::not_cached(key)),
        };
        self.replace(&mut inner, key.clone(), value, state);
        Ok(())
    }

    /// Update several values; nothing changes unless every key is updatable
    pub(crate) fn update_many<I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
    {
        let keyed: Vec<(K, V)> = values
            .into_iter()
            .map(|value| (self.keys.key_of(&value), value))
            .collect();

        let mut inner = self.inner.lock();
        let mut planned = Vec::with_capacity(keyed.len());
        for (key, value) in keyed {
            let state = Self::update_target(&inner, &key)?;
            planned.push((key, value, state));
        }
        for (key, value, state) in planned {
            self.replace(&mut inner, key, value, state);
        }
        Ok(())
    }

    /// Mark `key` deleted, or drop it if it was only ever added locally
    pub(crate) fn delete(&self, key: &K) -> bool {
        let mut inner = self.inner.lock();

        let state = match inner.entries.get(key) {
            None => return false,
            Some(entry) => entry.state,
        };

        if state == EntryState::Added {
            inner.entries.remove(key);
            trace!(cache = %self.config.name, ?key, "added entry retracted");
        } else if let Some(entry) = inner.entries.get_mut(key) {
            entry.state = EntryState::Deleted;
            trace!(cache = %self.config.name, ?key, "marked deleted");
        }
        true
    }

    /// What the next save would hand to the backing store
    pub(crate) fn pending(&self) -> ChangeSet<V> {
        Self::partition(&self.inner.lock())
    }

    /// Commit dirty entries through `persist`, then mark them clean.
    ///
    /// If `persist` fails nothing is reset, so the same changes go out on
    /// the next save.
    pub(crate) fn save<P>(&self, persist: &P) -> Result<()>
    where
        P: Persist<V> + ?Sized,
    {
        let mut inner = self.inner.lock();
        let changes = Self::partition(&inner);

        if let Err(e) = persist.save(&changes) {
            warn!(cache = %self.config.name, error = %e, pending = changes.len(), "save failed");
            return Err(Error::Source(e));
        }

        match self.config.deleted_policy {
            DeletedPolicy::Retain => {}
            DeletedPolicy::Evict => {
                inner.entries.retain(|_, e| e.state != EntryState::Deleted);
            }
        }
        for entry in inner.entries.values_mut() {
            entry.state = EntryState::Unmodified;
        }

        self.stats.record_save();
        debug!(
            cache = %self.config.name,
            added = changes.added.len(),
            deleted = changes.deleted.len(),
            modified = changes.modified.len(),
            "saved"
        );
        Ok(())
    }

    pub(crate) fn state_of(&self, key: &K) -> Option<EntryState> {
        self.inner.lock().entries.get(key).map(|e| e.state)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub(crate) fn is_all_loaded(&self) -> bool {
        self.inner.lock().all_loaded
    }

    fn update_target(inner: &Inner<K, V>, key: &K) -> Result<EntryState> {
        match inner.entries.get(key) {
            None => Err(Error::not_cached(key)),
            Some(entry) => entry.state.on_update().ok_or_else(|| Error::deleted(key)),
        }
    }

    fn replace(&self, inner: &mut Inner<K, V>, key: K, value: V, state: EntryState) {
        trace!(cache = %self.config.name, ?key, ?state, "updated");
        inner.entries.insert(key, CacheEntry { value, state });
    }

    fn partition(inner: &Inner<K, V>) -> ChangeSet<V> {
        let mut changes = ChangeSet::default();
        for entry in inner.entries.values() {
            match entry.state {
                EntryState::Unmodified => {}
                EntryState::Added => changes.added.push(entry.value.clone()),
                EntryState::Deleted => changes.deleted.push(entry.value.clone()),
                EntryState::Modified => changes.modified.push(entry.value.clone()),
            }
        }
        changes
    }
}
