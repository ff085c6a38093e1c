//! Backing-store collaborators consumed by the caches

use std::sync::Arc;

use crate::error::SourceError;

/// Read side of the backing store
pub trait ReadSource<K, V>: Send + Sync {
    /// Load a single value, `None` if the store has no such key
    fn fetch(&self, key: &K) -> Result<Option<V>, SourceError>;

    /// Load every value
    fn fetch_all(&self) -> Result<Vec<V>, SourceError>;
}

/// Write side of the backing store
pub trait Persist<V>: Send + Sync {
    /// Commit one batch of changes
    fn save(&self, changes: &ChangeSet<V>) -> Result<(), SourceError>;
}

/// A backing store that can both load and commit
pub trait Cacheable<K, V>: ReadSource<K, V> + Persist<V> {}

impl<K, V, T> Cacheable<K, V> for T where T: ReadSource<K, V> + Persist<V> {}

impl<K, V, T> ReadSource<K, V> for Arc<T>
where
    T: ReadSource<K, V> + ?Sized,
{
    fn fetch(&self, key: &K) -> Result<Option<V>, SourceError> {
        (**self).fetch(key)
    }

    fn fetch_all(&self) -> Result<Vec<V>, SourceError> {
        (**self).fetch_all()
    }
}

impl<V, T> Persist<V> for Arc<T>
where
    T: Persist<V> + ?Sized,
{
    fn save(&self, changes: &ChangeSet<V>) -> Result<(), SourceError> {
        (**self).save(changes)
    }
}

/// Dirty entries partitioned by state, as handed to [`Persist::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet<V> {
    /// Entries created in the cache
    pub added: Vec<V>,
    /// Entries marked deleted
    pub deleted: Vec<V>,
    /// Entries replaced since they were loaded
    pub modified: Vec<V>,
}

impl<V> Default for ChangeSet<V> {
    fn default() -> Self {
        Self { added: Vec::new(), deleted: Vec::new(), modified: Vec::new() }
    }
}

impl<V> ChangeSet<V> {
    /// Total number of changed values
    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }

    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type FetchFn<K, V> = Box<dyn Fn(&K) -> Result<Option<V>, SourceError> + Send + Sync>;
type FetchAllFn<V> = Box<dyn Fn() -> Result<Vec<V>, SourceError> + Send + Sync>;
type SaveFn<V> = Box<dyn Fn(&ChangeSet<V>) -> Result<(), SourceError> + Send + Sync>;

/// [`ReadSource`] built from two closures
pub struct SourceMapping<K, V> {
    fetch: FetchFn<K, V>,
    fetch_all: FetchAllFn<V>,
}

impl<K, V> SourceMapping<K, V> {
    /// Map `fetch` and `fetch_all` onto the read-source contract
    pub fn new<F, A>(fetch: F, fetch_all: A) -> Self
    where
        F: Fn(&K) -> Result<Option<V>, SourceError> + Send + Sync + 'static,
        A: Fn() -> Result<Vec<V>, SourceError> + Send + Sync + 'static,
    {
        Self { fetch: Box::new(fetch), fetch_all: Box::new(fetch_all) }
    }
}

impl<K, V> ReadSource<K, V> for SourceMapping<K, V> {
    fn fetch(&self, key: &K) -> Result<Option<V>, SourceError> {
        (self.fetch)(key)
    }

    fn fetch_all(&self) -> Result<Vec<V>, SourceError> {
        (self.fetch_all)()
    }
}

/// [`Cacheable`] built from three closures
pub struct CacheableMapping<K, V> {
    read: SourceMapping<K, V>,
    save: SaveFn<V>,
}

impl<K, V> CacheableMapping<K, V> {
    /// Map `fetch`, `fetch_all` and `save` onto the cacheable contract
    pub fn new<F, A, S>(fetch: F, fetch_all: A, save: S) -> Self
    where
        F: Fn(&K) -> Result<Option<V>, SourceError> + Send + Sync + 'static,
        A: Fn() -> Result<Vec<V>, SourceError> + Send + Sync + 'static,
        S: Fn(&ChangeSet<V>) -> Result<(), SourceError> + Send + Sync + 'static,
    {
        Self { read: SourceMapping::new(fetch, fetch_all), save: Box::new(save) }
    }
}

impl<K, V> ReadSource<K, V> for CacheableMapping<K, V> {
    fn fetch(&self, key: &K) -> Result<Option<V>, SourceError> {
        self.read.fetch(key)
    }

    fn fetch_all(&self) -> Result<Vec<V>, SourceError> {
        self.read.fetch_all()
    }
}

impl<K, V> Persist<V> for CacheableMapping<K, V> {
    fn save(&self, changes: &ChangeSet<V>) -> Result<(), SourceError> {
        (self.save)(changes)
    }
}
