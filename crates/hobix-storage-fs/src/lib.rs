//! Filesystem entry store for the Hobix weblog engine.
//!
//! This crate provides [`FsStorage`], a filesystem-based implementation of the
//! [`Storage`](hobix_storage::Storage) trait. It handles:
//!
//! - One YAML file per entry (`<entries>/<id>.yaml`), directories as categories
//! - Atomic writes through a temporary file renamed into place
//! - File modification time as a fallback creation timestamp
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use hobix_storage::Storage;
//! use hobix_storage_fs::FsStorage;
//!
//! let storage = FsStorage::new(PathBuf::from("entries"));
//! for entry in storage.list("", true)? {
//!     println!("{}: {}", entry.id, entry.title);
//! }
//! ```

mod scanner;
mod yaml;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hobix_storage::{Entry, EntryId, Storage, StorageError, StorageErrorKind, sort_entries};

use scanner::{EntryRef, Scanner, entry_path};
use yaml::{parse_fields, render_fields};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Name under which this backend is registered.
pub const PLUGIN_NAME: &str = "filesys";

/// Filesystem storage implementation.
///
/// Entries live under a single root directory. Reads never cache: every call
/// goes back to disk, so edits made outside the process are always visible.
#[derive(Debug, Clone)]
pub struct FsStorage {
    /// Root directory for entry files.
    entries_dir: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `entries_dir`.
    ///
    /// The directory does not need to exist yet; it is created on first save.
    #[must_use]
    pub fn new(entries_dir: PathBuf) -> Self {
        Self { entries_dir }
    }

    /// Root directory for entry files.
    #[must_use]
    pub fn entries_dir(&self) -> &Path {
        &self.entries_dir
    }

    /// Read and decode one entry file.
    fn read_entry(&self, entry_ref: &EntryRef) -> Result<Entry, StorageError> {
        let content = fs::read_to_string(&entry_ref.path).map_err(|e| {
            StorageError::io(e, Some(entry_ref.id.as_str()), false).with_backend(BACKEND)
        })?;
        let fields = parse_fields(&content).map_err(|e| {
            StorageError::new(StorageErrorKind::Parse)
                .with_backend(BACKEND)
                .with_id(entry_ref.path.display().to_string())
                .with_source(e)
        })?;
        let fallback = if fields.created.is_some() {
            DateTime::<Utc>::UNIX_EPOCH
        } else {
            file_mtime(&entry_ref.path)
        };
        Ok(fields.into_entry(entry_ref.id.clone(), fallback))
    }
}

/// Modification time of `path`, or the Unix epoch if unavailable.
fn file_mtime(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_or(DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::from)
}

impl Storage for FsStorage {
    fn load(&self, id: &EntryId) -> Result<Entry, StorageError> {
        let path = entry_path(&self.entries_dir, id);
        if !path.is_file() {
            return Err(StorageError::not_found(id).with_backend(BACKEND));
        }
        self.read_entry(&EntryRef {
            id: id.clone(),
            path,
        })
    }

    fn save(&self, id: &EntryId, entry: &Entry) -> Result<(), StorageError> {
        let write_error =
            |e: std::io::Error| StorageError::io(e, Some(id.as_str()), true).with_backend(BACKEND);

        let path = entry_path(&self.entries_dir, id);
        let dir = path.parent().unwrap_or(&self.entries_dir);
        fs::create_dir_all(dir).map_err(write_error)?;

        let content = render_fields(&entry.to_fields()).map_err(|e| {
            StorageError::new(StorageErrorKind::Write)
                .with_backend(BACKEND)
                .with_id(id.as_str())
                .with_source(e)
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(content.as_bytes()).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(&path).map_err(|e| write_error(e.error))?;

        tracing::debug!(id = %id, path = %path.display(), "Saved entry");
        Ok(())
    }

    fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<Entry>, StorageError> {
        let refs = Scanner::new(&self.entries_dir)
            .scan(prefix, recursive)
            .map_err(|e| StorageError::io(e, Some(prefix), false).with_backend(BACKEND))?;

        let mut entries = refs
            .iter()
            .map(|entry_ref| self.read_entry(entry_ref))
            .collect::<Result<Vec<_>, _>>()?;
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn delete(&self, id: &EntryId) -> Result<(), StorageError> {
        match fs::remove_file(entry_path(&self.entries_dir, id)) {
            Ok(()) => {
                tracing::debug!(id = %id, "Deleted entry");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(e, Some(id.as_str()), true).with_backend(BACKEND)),
        }
    }
}
