//! ReadOnlyCache: cache-aside reads over a [`ReadSource`]

use std::fmt::Debug;
use std::hash::Hash;

use crate::builder::CacheBuilder;
use crate::config::CacheConfig;
use crate::entry::EntryState;
use crate::error::{Result, SourceError};
use crate::key::KeyExtractor;
use crate::source::ReadSource;
use crate::stats::CacheStats;
use crate::store::CacheStore;

/// Read-through cache: consults the store first, loads from the source on a miss
pub struct ReadOnlyCache<K, V> {
    store: CacheStore<K, V>,
    source: Box<dyn ReadSource<K, V>>,
}

impl<K, V> ReadOnlyCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create a cache over `source`, keyed by `keys`
    ///
    /// # Arguments
    /// * `keys` - Maps each value to its cache key
    /// * `source` - Backing store consulted on misses
    /// * `config` - Cache settings
    pub fn new<S>(keys: KeyExtractor<K, V>, source: S, config: CacheConfig) -> Self
    where
        S: ReadSource<K, V> + 'static,
    {
        Self::from_boxed(keys, Box::new(source), config)
    }

    pub(crate) fn from_boxed(
        keys: KeyExtractor<K, V>,
        source: Box<dyn ReadSource<K, V>>,
        config: CacheConfig,
    ) -> Self {
        Self { store: CacheStore::new(keys, config), source }
    }

    /// Start building a cache
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    /// Fetch a value by key
    ///
    /// # Returns
    /// * `Ok(Some(value))` - Cached, or loaded from the source and now cached
    /// * `Ok(None)` - The source has no such key, or the entry is deleted
    pub fn fetch(&self, key: &K) -> Result<Option<V>> {
        let source = &self.source;
        self.store.fetch_with(key, |key| source.fetch(key))
    }

    /// Fetch a value by key, using `loader` instead of the source on a miss
    pub fn fetch_with<F>(&self, key: &K, loader: F) -> Result<Option<V>>
    where
        F: FnOnce(&K) -> std::result::Result<Option<V>, SourceError>,
    {
        self.store.fetch_with(key, loader)
    }

    /// Fetch every value.
    ///
    /// The source's bulk load runs at most once until [`clear_all`]. Values
    /// already cached are kept as they are. Order is unspecified.
    ///
    /// [`clear_all`]: ReadOnlyCache::clear_all
    pub fn fetch_all(&self) -> Result<Vec<V>> {
        let source = &self.source;
        self.store.fetch_all_with(|| source.fetch_all())
    }

    /// Fetch every value, using `loader` for the bulk load if one is needed
    pub fn fetch_all_with<F>(&self, loader: F) -> Result<Vec<V>>
    where
        F: FnOnce() -> std::result::Result<Vec<V>, SourceError>,
    {
        self.store.fetch_all_with(loader)
    }

    /// Drop every entry and forget that a bulk load happened
    pub fn clear_all(&self) {
        self.store.clear_all()
    }

    /// Whether `key` has an entry, deleted or not
    pub fn contains(&self, key: &K) -> bool {
        self.store.state_of(key).is_some()
    }

    /// Lifecycle state of the entry for `key`
    pub fn state_of(&self, key: &K) -> Option<EntryState> {
        self.store.state_of(key)
    }

    /// Number of entries, including deleted ones awaiting save
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a bulk load has happened since the last clear
    pub fn is_all_loaded(&self) -> bool {
        self.store.is_all_loaded()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        self.store.stats()
    }

    /// Settings this cache was built with
    pub fn config(&self) -> &CacheConfig {
        self.store.config()
    }

    /// Key function this cache was built with
    pub fn keys(&self) -> &KeyExtractor<K, V> {
        self.store.keys()
    }

    pub(crate) fn store(&self) -> &CacheStore<K, V> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceMapping;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    fn item(id: u32) -> Item {
        Item { id, name: "item" }
    }

    struct Counted {
        fetches: AtomicUsize,
        bulk: AtomicUsize,
        items: Vec<Item>,
    }

    impl Counted {
        fn new(count: u32) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                bulk: AtomicUsize::new(0),
                items: (0..count).map(item).collect(),
            })
        }
    }

    impl ReadSource<u32, Item> for Counted {
        fn fetch(&self, key: &u32) -> std::result::Result<Option<Item>, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.iter().find(|i| i.id == *key).cloned())
        }

        fn fetch_all(&self) -> std::result::Result<Vec<Item>, SourceError> {
            self.bulk.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    fn cache(source: &Arc<Counted>) -> ReadOnlyCache<u32, Item> {
        ReadOnlyCache::new(
            KeyExtractor::new(|i: &Item| i.id),
            Arc::clone(source),
            CacheConfig::default(),
        )
    }

    fn sorted(mut items: Vec<Item>) -> Vec<u32> {
        items.sort_by_key(|i| i.id);
        items.into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_fetch_not_cached_loads_from_source() {
        let source = Counted::new(3);
        let cache = cache(&source);

        assert_eq!(cache.fetch(&1).unwrap(), Some(item(1)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state_of(&1), Some(EntryState::Unmodified));
    }

    #[test]
    fn test_fetch_twice_loads_once() {
        let source = Counted::new(3);
        let cache = cache(&source);

        cache.fetch(&2).unwrap();
        cache.fetch(&2).unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_fetch_with_second_loader_never_called() {
        let source = Counted::new(0);
        let cache = cache(&source);

        let first = cache
            .fetch_with(&3, |_| Ok(Some(Item { id: 3, name: "a" })))
            .unwrap();
        let second = cache
            .fetch_with(&3, |_| panic!("loader must not run for a cached key"))
            .unwrap();

        assert_eq!(first, Some(Item { id: 3, name: "a" }));
        assert_eq!(second, first);
    }

    #[test]
    fn test_fetch_unknown_key_returns_none() {
        let source = Counted::new(2);
        let cache = cache(&source);

        assert_eq!(cache.fetch(&9).unwrap(), None);
        assert!(!cache.contains(&9));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fetch_all_empty_cache_returns_source_items() {
        let source = Counted::new(5);
        let cache = cache(&source);

        assert_eq!(sorted(cache.fetch_all().unwrap()), vec![0, 1, 2, 3, 4]);
        assert!(cache.is_all_loaded());
    }

    #[test]
    fn test_fetch_all_partially_loaded_keeps_existing_entry() {
        let source = Counted::new(4);
        let cache = cache(&source);

        cache
            .fetch_with(&2, |_| Ok(Some(Item { id: 2, name: "early" })))
            .unwrap();
        let all = cache.fetch_all().unwrap();

        assert_eq!(all.len(), 4);
        let two = all.iter().find(|i| i.id == 2).unwrap();
        assert_eq!(two.name, "early");
    }

    #[test]
    fn test_fetch_all_called_twice_loads_once() {
        let source = Counted::new(3);
        let cache = cache(&source);

        cache.fetch_all().unwrap();
        cache.fetch_all().unwrap();

        assert_eq!(source.bulk.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().bulk_loads(), 1);
    }

    #[test]
    fn test_all_loaded_does_not_block_per_key_loads() {
        let source = Counted::new(2);
        let cache = cache(&source);
        cache.fetch_all().unwrap();

        let late = cache
            .fetch_with(&10, |_| Ok(Some(item(10))))
            .unwrap();
        assert_eq!(late, Some(item(10)));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_clear_all_reloads() {
        let source = Counted::new(3);
        let cache = cache(&source);

        cache.fetch_all().unwrap();
        cache.fetch(&1).unwrap();
        cache.clear_all();

        assert!(cache.is_empty());
        assert!(!cache.is_all_loaded());

        cache.fetch(&1).unwrap();
        cache.fetch_all().unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(source.bulk.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_all_on_empty_cache() {
        let source = Counted::new(0);
        let cache = cache(&source);
        cache.clear_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_source_error_propagates() {
        let cache: ReadOnlyCache<u32, Item> = ReadOnlyCache::new(
            KeyExtractor::new(|i: &Item| i.id),
            SourceMapping::<u32, Item>::new(|_| Err("timeout".into()), || Err("timeout".into())),
            CacheConfig::default(),
        );

        assert!(cache.fetch(&1).is_err());
        assert!(cache.fetch_all().is_err());
        assert!(!cache.is_all_loaded());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_misses_load_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache = Arc::new(ReadOnlyCache::new(
            KeyExtractor::new(|i: &Item| i.id),
            SourceMapping::new(
                move |key: &u32| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    Ok(Some(item(*key)))
                },
                || Ok(Vec::new()),
            ),
            CacheConfig::default(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.fetch(&42).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(item(42)));
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_fetch_all_loads_once() {
        let source = Counted::new(50);
        let cache = Arc::new(cache(&source));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.fetch_all().unwrap().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 50);
        }
        assert_eq!(source.bulk.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().bulk_loads(), 1);
        assert_eq!(cache.len(), 50);
    }
}
