//! # trackcache
//!
//! Read-through, write-deferred cache with per-entry dirty tracking.
//!
//! ## Architecture
//! - **CacheStore**: AHash map of entries behind one `parking_lot` mutex
//! - **ReadOnlyCache**: cache-aside loading from a [`ReadSource`]
//! - **TrackingCache**: wraps a read-only cache, records add/update/delete,
//!   and commits the dirty set through [`Persist`] on `save`
//!
//! Every operation holds the store's lock for its whole duration, including
//! calls out to the backing store. Collaborators must not call back into the
//! cache that invoked them.
//!
//! ```
//! use trackcache::{CacheableMapping, ChangeSet, TrackingCache};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct User { id: u32, name: String }
//!
//! let cache = TrackingCache::builder()
//!     .key_fn(|u: &User| u.id)
//!     .build(CacheableMapping::new(
//!         |id: &u32| Ok(Some(User { id: *id, name: "loaded".into() })),
//!         || Ok(Vec::new()),
//!         |changes: &ChangeSet<User>| {
//!             assert_eq!(changes.modified.len(), 1);
//!             Ok(())
//!         },
//!     ))
//!     .unwrap();
//!
//! let mut user = cache.fetch(&1).unwrap().unwrap();
//! user.name = "renamed".into();
//! cache.update(user).unwrap();
//! cache.save().unwrap();
//! ```

#![warn(missing_docs)]

mod builder;
mod config;
mod entry;
mod error;
mod key;
mod read_only;
mod source;
mod stats;
mod store;
mod tracking;

pub use builder::CacheBuilder;
pub use config::{CacheConfig, DeletedPolicy};
pub use entry::EntryState;
pub use error::{Error, Result, SourceError};
pub use key::{KeyExtractor, KeyProperty};
pub use read_only::ReadOnlyCache;
pub use source::{Cacheable, CacheableMapping, ChangeSet, Persist, ReadSource, SourceMapping};
pub use stats::CacheStats;
pub use tracking::TrackingCache;
