//! Rendering inputs shared by the engine and output plugins.

use std::collections::BTreeMap;

use hobix_storage::Entry;
use serde::Serialize;

use crate::category::PageCategory;

/// Weblog description handed to every plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeblogInfo {
    pub title: String,
    /// Public base URL, e.g. `https://example.org/`.
    pub link: String,
    pub tagline: String,
    /// Known authors keyed by login.
    pub authors: BTreeMap<String, Author>,
}

/// Author details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
    pub url: Option<String>,
}

impl WeblogInfo {
    /// Absolute URL of a site path (`"a/1.html"` becomes `https://example.org/a/1.html`).
    #[must_use]
    pub fn page_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.link.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Display name for an author login, falling back to the login.
    #[must_use]
    pub fn author_name<'a>(&'a self, login: &'a str) -> &'a str {
        self.authors.get(login).map_or(login, |a| a.name.as_str())
    }
}

/// A rendering unit loaded from the template tree.
///
/// Template files are named `<category>.<output-ext>.<plugin-ext>`; the
/// directory holding the file is the template's categorization scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Path relative to the template root, `/`-separated.
    pub path: String,
    /// Directory part of `path` (`""` at the root).
    pub dir: String,
    pub category: PageCategory,
    /// File name minus the plugin extension (`index.html`).
    pub output_name: String,
    /// Extension of rendered pages (`html`), if any.
    pub output_ext: Option<String>,
    /// Extension selecting the output plugin (`jinja`).
    pub extension: String,
    /// Raw template body.
    #[serde(skip)]
    pub source: String,
    /// Window override for index and feed templates.
    pub window: Option<usize>,
}

impl Template {
    /// Parse a template from its path relative to the template root.
    ///
    /// Returns `None` when the file name has fewer than two dot-separated parts
    /// or names an unknown category.
    #[must_use]
    pub fn from_path(path: &str, source: String) -> Option<Self> {
        let path = path.trim_start_matches('/');
        let (dir, file_name) = path.rsplit_once('/').unwrap_or(("", path));
        let (output_name, extension) = file_name.rsplit_once('.')?;
        if output_name.is_empty() || extension.is_empty() {
            return None;
        }
        let (category_name, output_ext) = match output_name.split_once('.') {
            Some((name, ext)) => (name, Some(ext.to_owned())),
            None => (output_name, None),
        };
        let category = PageCategory::from_name(category_name)?;

        Some(Self {
            path: path.to_owned(),
            dir: dir.to_owned(),
            category,
            output_name: output_name.to_owned(),
            output_ext,
            extension: extension.to_owned(),
            source,
            window: None,
        })
    }

    /// Set the window override.
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    /// File name of a generated page: `<stem>.<output-ext>`, or `<stem>` when
    /// the template has no output extension.
    #[must_use]
    pub fn page_file(&self, stem: &str) -> String {
        match &self.output_ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_owned(),
        }
    }
}

/// What a page is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageKey {
    /// Windowed aggregate (index and feed pages).
    Index,
    Entry { id: String },
    Section { path: String },
    Tag { name: String },
    Year { year: i32 },
    Month { year: i32, month: u32 },
    Day { year: i32, month: u32, day: u32 },
}

impl PageKey {
    /// Short human-readable label (`"2004/05"`, a tag name, a section path).
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Index => String::new(),
            Self::Entry { id } => id.clone(),
            Self::Section { path } => path.clone(),
            Self::Tag { name } => name.clone(),
            Self::Year { year } => format!("{year:04}"),
            Self::Month { year, month } => format!("{year:04}/{month:02}"),
            Self::Day { year, month, day } => format!("{year:04}/{month:02}/{day:02}"),
        }
    }
}

/// Everything an output plugin sees when rendering one page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub weblog: &'a WeblogInfo,
    pub template: &'a Template,
    /// Output path of the page, relative to the site root.
    pub page_id: &'a str,
    pub key: &'a PageKey,
    /// Entries on the page, newest first.
    pub entries: &'a [&'a Entry],
}

impl PageContext<'_> {
    /// The single entry of an entry page.
    #[must_use]
    pub fn entry(&self) -> Option<&Entry> {
        match self.key {
            PageKey::Entry { .. } => self.entries.first().copied(),
            _ => None,
        }
    }

    /// Page title: the entry title on entry pages, otherwise the weblog title
    /// followed by the page label.
    #[must_use]
    pub fn title(&self) -> String {
        if let Some(entry) = self.entry() {
            return entry.title.clone();
        }
        let label = self.key.label();
        if label.is_empty() {
            self.weblog.title.clone()
        } else {
            format!("{}: {label}", self.weblog.title)
        }
    }
}
