//! Error types for trackcache

use thiserror::Error;

/// Error raised by a backing-store collaborator (fetch, fetch-all, persist)
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was not supplied
    #[error("the parameter ({parameter}) can not be empty")]
    Validation {
        /// Name of the missing parameter
        parameter: &'static str,
    },

    /// The key accessor could not be resolved at construction
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Add targeted a key that is already cached
    #[error("{0}")]
    DuplicateKey(String),

    /// Update targeted a key that is absent or deleted
    #[error("{0}")]
    InvalidState(String),

    /// The backing store failed
    #[error("backing store error: {0}")]
    Source(#[source] SourceError),
}

impl Error {
    pub(crate) fn validation(parameter: &'static str) -> Self {
        Error::Validation { parameter }
    }

    pub(crate) fn duplicate_key<K: std::fmt::Debug>(key: &K) -> Self {
        Error::DuplicateKey(format!(
            "an item with the key ({:?}) already exists in the cache",
            key
        ))
    }

    pub(crate) fn not_cached<K: std::fmt::Debug>(key: &K) -> Self {
        Error::InvalidState(format!("the item (key: {:?}) is not in the cache", key))
    }

    pub(crate) fn deleted<K: std::fmt::Debug>(key: &K) -> Self {
        Error::InvalidState(format!("the item (key: {:?}) is currently deleted", key))
    }

    pub(crate) fn key_mismatch<K: std::fmt::Debug>(requested: &K, loaded: &K) -> Self {
        Error::InvalidState(format!(
            "the item loaded for the key ({:?}) has the key ({:?})",
            requested, loaded
        ))
    }
}
