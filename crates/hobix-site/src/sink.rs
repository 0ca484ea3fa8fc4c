//! Site output sinks.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

/// Error writing a rendered page.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Page path escapes the output root or is empty.
    #[error("invalid page path '{0}'")]
    InvalidPath(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for rendered pages.
///
/// `write` must be atomic: readers see the old bytes or the new bytes, never a
/// mix. Called concurrently from render workers.
pub trait SiteSink: Send + Sync {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), SinkError>;
}

fn check_path(path: &str) -> Result<(), SinkError> {
    let valid = !path.is_empty()
        && !path.starts_with('/')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(SinkError::InvalidPath(path.to_owned()))
    }
}

/// Writes pages below a directory (the htdocs directory).
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SiteSink for FsSink {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), SinkError> {
        check_path(path)?;
        let target = self.root.join(path);
        let io_err = |source| SinkError::Io {
            path: target.clone(),
            source,
        };

        let dir = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.persist(&target).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// In-memory sink. Clones share the same pages.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pages: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written to `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    /// Written page paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Copy of every written page.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.lock().clone()
    }

    /// Total bytes written.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    // Inserts are whole values, so a poisoned map is still usable
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SiteSink for MemorySink {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), SinkError> {
        check_path(path)?;
        self.lock().insert(path.to_owned(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_fs_sink_writes_nested() {
        let tmp = TempDir::new().unwrap();
        let sink = FsSink::new(tmp.path().to_path_buf());

        sink.write("a/b/index.html", b"one").unwrap();
        sink.write("a/b/index.html", b"two").unwrap();

        assert_eq!(fs::read(tmp.path().join("a/b/index.html")).unwrap(), b"two");
        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("a/b")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let tmp = TempDir::new().unwrap();
        let sink = FsSink::new(tmp.path().join("htdocs"));
        for bad in ["", "/etc/passwd", "../x.html", "a//b", "a/./b"] {
            assert!(
                matches!(sink.write(bad, b"x"), Err(SinkError::InvalidPath(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_memory_sink_clones_share_pages() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        clone.write("index.html", b"hi").unwrap();

        assert_eq!(sink.get("index.html"), Some(b"hi".to_vec()));
        assert_eq!(sink.paths(), vec!["index.html".to_owned()]);
        assert_eq!(sink.total_bytes(), 2);
    }

    #[test]
    fn test_memory_sink_survives_poisoned_lock() {
        let sink = MemorySink::new();
        sink.write("index.html", b"before").unwrap();

        let holder = sink.clone();
        let poisoned = std::thread::spawn(move || {
            let _guard = holder.pages.lock().unwrap();
            panic!("renderer crashed while holding the lock");
        })
        .join();
        assert!(poisoned.is_err());
        assert!(sink.pages.is_poisoned());

        sink.write("a.html", b"after").unwrap();
        assert_eq!(sink.get("index.html"), Some(b"before".to_vec()));
        assert_eq!(sink.paths(), vec!["a.html".to_owned(), "index.html".to_owned()]);
    }
}
