//! Page manifest: which entries every written page contained.
//!
//! Update passes consult the previous manifest to find pages an entry has
//! left (a retagged entry, an entry pushed out of an index window).
//!
//! # Format
//!
//! ```json
//! {
//!     "pages": {
//!         "index.html": {"template": "index.html.jinja", "category": "index", "entries": ["a/2", "a/1"]}
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use hobix_plugin::PageCategory;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Entries recorded for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Template path the page was rendered from.
    pub template: String,
    pub category: PageCategory,
    /// Entry ids on the page, in page order.
    pub entries: Vec<String>,
}

/// Page id to record map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub pages: BTreeMap<String, PageRecord>,
}

impl Manifest {
    /// Load a manifest.
    ///
    /// A missing, unreadable or corrupt file yields `None`; the next pass
    /// then falls back to the scope-based heuristic.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read page manifest");
                }
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt page manifest");
                None
            }
        }
    }

    /// Write the manifest atomically.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let content = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Whether `page_id` was recorded with `entry` on it.
    #[must_use]
    pub fn contained(&self, page_id: &str, entry: &str) -> bool {
        self.pages
            .get(page_id)
            .is_some_and(|record| record.entries.iter().any(|id| id == entry))
    }

    #[must_use]
    pub fn has_page(&self, page_id: &str) -> bool {
        self.pages.contains_key(page_id)
    }

    /// Record the entries of a written page.
    pub fn record(&mut self, page_id: String, record: PageRecord) {
        self.pages.insert(page_id, record);
    }

    /// Drop every page not in `current`. Returns the dropped page ids.
    pub fn prune<'a>(&mut self, current: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let keep: std::collections::HashSet<&str> = current.into_iter().collect();
        let stale: Vec<String> = self
            .pages
            .keys()
            .filter(|id| !keep.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &stale {
            self.pages.remove(id);
        }
        stale
    }
}
