//! Entry store abstraction for the Hobix weblog engine.
//!
//! This crate defines the [`Entry`] model and the [`Storage`] trait every
//! storage plugin implements, along with [`StorageError`] for unified error
//! handling across backends.
//!
//! # Backends
//!
//! - `hobix-storage-fs`: one YAML file per entry
//! - [`MockStorage`]: in-memory store for tests (feature `mock`)

mod entry;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use entry::{Entry, EntryFields, EntryId, EntryLink, EntryType, sort_entries};
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{Storage, StorageError, StorageErrorKind, in_listing};
