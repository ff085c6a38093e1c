//! Cache entries and their lifecycle state

/// Lifecycle state of a cached value relative to the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Matches the backing store
    Unmodified,
    /// Created in the cache, never persisted
    Added,
    /// Replaced since it was loaded or last saved
    Modified,
    /// Marked for deletion on the next save
    Deleted,
}

impl EntryState {
    /// Whether the entry has changes the next save must persist
    pub fn is_dirty(self) -> bool {
        self != EntryState::Unmodified
    }

    /// State after the value is replaced by an update.
    ///
    /// Returns `None` for `Deleted`: a deleted entry cannot be updated.
    pub fn on_update(self) -> Option<EntryState> {
        match self {
            EntryState::Added => Some(EntryState::Added),
            EntryState::Unmodified | EntryState::Modified => Some(EntryState::Modified),
            EntryState::Deleted => None,
        }
    }
}

/// A value plus its lifecycle state
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    pub(crate) value: V,
    pub(crate) state: EntryState,
}

impl<V> CacheEntry<V> {
    pub(crate) fn loaded(value: V) -> Self {
        Self { value, state: EntryState::Unmodified }
    }

    pub(crate) fn added(value: V) -> Self {
        Self { value, state: EntryState::Added }
    }

    /// Value visible to readers; deleted entries are hidden
    pub(crate) fn visible(&self) -> Option<&V> {
        match self.state {
            EntryState::Deleted => None,
            _ => Some(&self.value),
        }
    }
}
