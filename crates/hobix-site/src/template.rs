//! Template tree loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hobix_plugin::Template;

/// Error reading the template tree.
#[derive(Debug, thiserror::Error)]
#[error("cannot read template tree at {}: {source}", path.display())]
pub struct TemplateError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Read-only, ordered sequence of templates.
pub trait TemplateSource: Send + Sync {
    /// Templates in tree order.
    fn templates(&self) -> Result<Vec<Template>, TemplateError>;
}

impl TemplateSource for Vec<Template> {
    fn templates(&self) -> Result<Vec<Template>, TemplateError> {
        Ok(self.clone())
    }
}

/// Template tree on disk (the skeleton directory).
///
/// Tree order: within a directory, files by name, then subdirectories by
/// name. Hidden files and directories are ignored; files whose names do not
/// parse as templates are skipped with a warning.
#[derive(Debug, Clone)]
pub struct SkelDir {
    root: PathBuf,
    windows: BTreeMap<String, usize>,
}

impl SkelDir {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            windows: BTreeMap::new(),
        }
    }

    /// Window overrides keyed by template path (`"index.html.jinja"`).
    #[must_use]
    pub fn with_windows(mut self, windows: BTreeMap<String, usize>) -> Self {
        self.windows = windows;
        self
    }

    fn walk(&self, dir: &Path, rel: &str, out: &mut Vec<Template>) -> Result<(), TemplateError> {
        let io_err = |source| TemplateError {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for item in fs::read_dir(dir).map_err(io_err)? {
            let item = item.map_err(io_err)?;
            let name = item.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if item.file_type().map_err(io_err)?.is_dir() {
                dirs.push(name);
            } else {
                files.push(name);
            }
        }
        files.sort();
        dirs.sort();

        for name in files {
            let path = if rel.is_empty() {
                name.clone()
            } else {
                format!("{rel}/{name}")
            };
            let file = dir.join(&name);
            let source = match fs::read_to_string(&file) {
                Ok(source) => source,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!(template = %path, "Skipping template that is not UTF-8");
                    continue;
                }
                Err(source) => return Err(TemplateError { path: file, source }),
            };
            match Template::from_path(&path, source) {
                Some(template) => {
                    let template = match self.windows.get(&path) {
                        Some(&window) => template.with_window(window),
                        None => template,
                    };
                    out.push(template);
                }
                None => tracing::warn!(template = %path, "Skipping file with no template category"),
            }
        }

        for name in dirs {
            let child = if rel.is_empty() {
                name.clone()
            } else {
                format!("{rel}/{name}")
            };
            self.walk(&dir.join(&name), &child, out)?;
        }
        Ok(())
    }
}

impl TemplateSource for SkelDir {
    fn templates(&self) -> Result<Vec<Template>, TemplateError> {
        let mut templates = Vec::new();
        self.walk(&self.root, "", &mut templates)?;
        tracing::debug!(count = templates.len(), root = %self.root.display(), "Loaded templates");
        Ok(templates)
    }
}
