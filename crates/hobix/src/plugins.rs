//! Built-in plugin catalog.

use std::path::Path;

use hobix_plugin::{PluginCatalog, StorageDescriptor};
use hobix_storage::Storage;
use hobix_storage_fs::FsStorage;

/// Every plugin shipped with the binary.
pub(crate) fn catalog() -> PluginCatalog {
    PluginCatalog {
        outputs: hobix_output::descriptors(),
        publishers: hobix_publish::descriptors(),
        storages: vec![StorageDescriptor {
            name: hobix_storage_fs::PLUGIN_NAME,
            construct: open_filesys,
        }],
    }
}

fn open_filesys(entries_dir: &Path) -> Box<dyn Storage> {
    Box::new(FsStorage::new(entries_dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_catalog_names() {
        let catalog = catalog();
        let outputs: Vec<&str> = catalog.outputs.iter().map(|d| d.name).collect();
        let publishers: Vec<&str> = catalog.publishers.iter().map(|d| d.name).collect();
        assert_eq!(outputs, vec!["jinja", "rss", "atom"]);
        assert_eq!(publishers, vec!["ping", "command"]);
        assert_eq!(catalog.storages[0].name, "filesys");
    }
}
