//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait every storage plugin implements, along with
//! [`StorageError`] for unified error handling across backends.
//!
//! # Id Convention
//!
//! All id and prefix parameters are **entry paths**, not file paths:
//! - `""` - the whole store (prefixes only)
//! - `"hello"` - top-level entry
//! - `"blog"` - categorization directory (prefixes only)
//! - `"blog/weddings/another"` - nested entry
//!
//! Storage implementations handle the mapping from ids to their internal format.

use crate::entry::{Entry, EntryId};

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Entry does not exist.
    NotFound,
    /// Persisting an entry failed; the previous content is still in place.
    Write,
    /// Stored entry could not be decoded.
    Parse,
    /// Malformed entry id.
    InvalidId,
    /// Permission denied.
    PermissionDenied,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Entry id or prefix context (if applicable).
    pub id: Option<String>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            id: None,
            backend: None,
            source: None,
        }
    }

    /// Attach id context.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error for an entry id.
    #[must_use]
    pub fn not_found(id: &EntryId) -> Self {
        Self::new(StorageErrorKind::NotFound).with_id(id.as_str())
    }

    /// Whether this error reports a missing entry.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Create a storage error from an I/O error.
    ///
    /// `writing` selects [`StorageErrorKind::Write`] for failures that are not
    /// more specifically categorized.
    #[must_use]
    pub fn io(err: std::io::Error, id: Option<&str>, writing: bool) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            _ if writing => StorageErrorKind::Write,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(id) = id {
            error = error.with_id(id);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (id: blog/one)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::Write => "Write failed",
            StorageErrorKind::Parse => "Parse error",
            StorageErrorKind::InvalidId => "Invalid entry id",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(id) = &self.id {
            write!(f, " (id: {id})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Storage abstraction for weblog entries.
///
/// Implementations must keep every `save` all-or-nothing: readers observe either
/// the old entry or the new one, never a partial write.
pub trait Storage: Send + Sync {
    /// Load one entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotFound`] if no entry exists at `id`.
    fn load(&self, id: &EntryId) -> Result<Entry, StorageError>;

    /// Create or replace an entry atomically.
    ///
    /// The stored entry takes its id from `id`; `entry.id` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::Write`] on persistence failure.
    fn save(&self, id: &EntryId, entry: &Entry) -> Result<(), StorageError>;

    /// List entries under a categorization prefix.
    ///
    /// Entries come back newest first, ties broken by ascending id. The empty
    /// prefix lists the whole store. With `recursive == false` only entries
    /// directly inside `prefix` are returned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<Entry>, StorageError>;

    /// Delete an entry. Deleting a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the entry exists but cannot be removed.
    fn delete(&self, id: &EntryId) -> Result<(), StorageError>;
}

/// Whether an entry belongs in a `list(prefix, recursive)` result.
pub fn in_listing(id: &EntryId, prefix: &str, recursive: bool) -> bool {
    if recursive {
        id.is_within(prefix)
    } else {
        id.parent() == prefix.trim_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert!(err.id.is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_storage_error_not_found() {
        let id = EntryId::new("blog/one").unwrap();
        let err = StorageError::not_found(&id);

        assert!(err.is_not_found());
        assert_eq!(err.id.as_deref(), Some("blog/one"));
    }

    #[test]
    fn test_storage_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_storage_error_io_write() {
        let io_err = std::io::Error::other("disk full");
        let err = StorageError::io(io_err, Some("a/1"), true);

        assert_eq!(err.kind, StorageErrorKind::Write);
        assert_eq!(err.id.as_deref(), Some("a/1"));
    }

    #[test]
    fn test_storage_error_io_read_other() {
        let io_err = std::io::Error::other("bad sector");
        let err = StorageError::io(io_err, None, false);

        assert_eq!(err.kind, StorageErrorKind::Other);
    }

    #[test]
    fn test_storage_error_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::io(io_err, None, true);

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_storage_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_id("blog/one")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (id: blog/one)"
        );
    }

    #[test]
    fn test_storage_error_display_simple() {
        assert_eq!(
            StorageError::new(StorageErrorKind::InvalidId).to_string(),
            "Invalid entry id"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }

    #[test]
    fn test_listed_recursive_and_direct() {
        let nested = EntryId::new("a/b/c").unwrap();
        let direct = EntryId::new("a/d").unwrap();

        assert!(in_listing(&nested, "a", true));
        assert!(!in_listing(&nested, "a", false));
        assert!(in_listing(&direct, "a", false));
        assert!(in_listing(&direct, "", true));
        assert!(!in_listing(&direct, "", false));
        assert!(in_listing(&EntryId::new("top").unwrap(), "", false));
    }
}
