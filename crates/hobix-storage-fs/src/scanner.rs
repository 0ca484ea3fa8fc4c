//! Entry discovery by filesystem walking.
//!
//! The scanner only locates entry files and derives their ids; reading and
//! parsing is left to `FsStorage`.

use std::fs;
use std::path::{Path, PathBuf};

use hobix_storage::EntryId;

/// File extension of stored entries.
pub(crate) const ENTRY_EXTENSION: &str = "yaml";

/// Location of one entry file.
#[derive(Debug, Clone)]
pub(crate) struct EntryRef {
    pub id: EntryId,
    pub path: PathBuf,
}

/// Walks the entries directory.
pub(crate) struct Scanner<'a> {
    root: &'a Path,
}

impl<'a> Scanner<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Collect entry files directly inside `prefix`, or anywhere below it when
    /// `recursive` is set.
    ///
    /// A missing directory yields an empty list.
    pub fn scan(&self, prefix: &str, recursive: bool) -> std::io::Result<Vec<EntryRef>> {
        let prefix = prefix.trim_matches('/');
        let dir = if prefix.is_empty() {
            self.root.to_path_buf()
        } else {
            self.root.join(prefix)
        };
        let mut refs = Vec::new();
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => self.scan_directory(&dir, prefix, recursive, &mut refs)?,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(refs)
    }

    fn scan_directory(
        &self,
        dir: &Path,
        id_prefix: &str,
        recursive: bool,
        refs: &mut Vec<EntryRef>,
    ) -> std::io::Result<()> {
        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name().to_string_lossy().into_owned();

            // Skip hidden files/dirs
            if name.starts_with('.') {
                continue;
            }

            let path = dir_entry.path();
            if dir_entry.file_type()?.is_dir() {
                if recursive {
                    let child_prefix = join_id(id_prefix, &name);
                    self.scan_directory(&path, &child_prefix, recursive, refs)?;
                }
                continue;
            }

            let Some(stem) = name.strip_suffix(&format!(".{ENTRY_EXTENSION}")) else {
                continue;
            };
            match EntryId::new(join_id(id_prefix, stem)) {
                Ok(id) => refs.push(EntryRef { id, path }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping entry file"),
            }
        }
        Ok(())
    }
}

/// Append a segment to an id prefix.
fn join_id(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}/{name}")
    }
}

/// File path holding the entry `id`.
pub(crate) fn entry_path(root: &Path, id: &EntryId) -> PathBuf {
    root.join(format!("{id}.{ENTRY_EXTENSION}"))
}
