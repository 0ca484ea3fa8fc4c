//! Output mapping: which pages each template produces and which entries feed
//! each page.
//!
//! Output paths, relative to the template directory `d`:
//!
//! | Category  | Path                              |
//! |-----------|-----------------------------------|
//! | `index`   | `d/<output-name>`                 |
//! | `feed`    | `d/<output-name>`                 |
//! | `entry`   | `<entry-id>.<ext>`                |
//! | `section` | `<section>/index.<ext>`           |
//! | `tag`     | `d/tags/<tag>/index.<ext>`        |
//! | `yearly`  | `d/YYYY/index.<ext>`              |
//! | `monthly` | `d/YYYY/MM/index.<ext>`           |
//! | `daily`   | `d/YYYY/MM/DD/index.<ext>`        |
//!
//! Sections are the categorization directories strictly below `d`.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use hobix_plugin::{PageCategory, PageKey, Template};
use hobix_storage::{Entry, EntryId};

use crate::manifest::Manifest;

/// What changed since the last pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeScope {
    /// Re-render every page.
    Full,
    /// One entry was created, edited or deleted.
    Update(EntryId),
}

impl std::fmt::Display for ChangeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Update(id) => write!(f, "update({id})"),
        }
    }
}

/// One page to render: a template applied to an entry subset.
#[derive(Debug, Clone)]
pub struct PageDescriptor<'a> {
    pub template: &'a Template,
    /// Output path relative to the site root.
    pub page_id: String,
    pub key: PageKey,
    /// Entries on the page, newest first (ties by ascending id).
    pub entries: Vec<&'a Entry>,
}

impl PageDescriptor<'_> {
    #[must_use]
    pub fn category(&self) -> PageCategory {
        self.template.category
    }

    #[must_use]
    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.iter().any(|entry| entry.id == *id)
    }

    #[must_use]
    pub fn entry_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.id.as_str().to_owned())
            .collect()
    }
}

/// Maps templates and entries to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMapper {
    /// Entries on an index page without a window override.
    pub index_size: usize,
    /// Entries in a feed without a window override.
    pub feed_size: usize,
}

impl Default for OutputMapper {
    fn default() -> Self {
        Self {
            index_size: 10,
            feed_size: 15,
        }
    }
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_owned()
    } else {
        format!("{dir}/{rest}")
    }
}

fn is_path_segment(tag: &str) -> bool {
    !tag.is_empty() && !tag.starts_with('.') && !tag.contains('/')
}

impl OutputMapper {
    #[must_use]
    pub fn new(index_size: usize, feed_size: usize) -> Self {
        Self {
            index_size,
            feed_size,
        }
    }

    /// Every page the templates produce.
    ///
    /// Pages come in template order, then by page id. When two templates
    /// resolve to the same path, the earlier template keeps it.
    #[must_use]
    pub fn pages<'a>(&self, templates: &'a [Template], entries: &'a [Entry]) -> Vec<PageDescriptor<'a>> {
        let mut sorted: Vec<&Entry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.newest_first(b));

        let mut owners: HashMap<String, &str> = HashMap::new();
        let mut pages = Vec::new();
        for template in templates {
            for page in self.template_pages(template, &sorted) {
                if let Some(owner) = owners.get(&page.page_id) {
                    tracing::warn!(
                        page = %page.page_id,
                        template = %template.path,
                        kept = %owner,
                        "Dropping page already produced by an earlier template"
                    );
                    continue;
                }
                owners.insert(page.page_id.clone(), &template.path);
                pages.push(page);
            }
        }
        pages
    }

    /// Pages to re-render for `scope`.
    ///
    /// A full scope yields every page. An update anchored at entry `e` keeps a
    /// page when its new entry subset contains `e`, or, with a previous
    /// manifest, when the manifest recorded `e` on it or has no record of it.
    /// Without a manifest every aggregate page whose template scope covers `e`
    /// is kept instead.
    #[must_use]
    pub fn affected_pages<'a>(
        &self,
        templates: &'a [Template],
        entries: &'a [Entry],
        scope: &ChangeScope,
        previous: Option<&Manifest>,
    ) -> Vec<PageDescriptor<'a>> {
        select(self.pages(templates, entries), scope, previous)
    }

    #[allow(clippy::too_many_lines)]
    fn template_pages<'a>(&self, template: &'a Template, sorted: &[&'a Entry]) -> Vec<PageDescriptor<'a>> {
        let dir = template.dir.as_str();
        let scoped = sorted.iter().copied().filter(|entry| entry.id.is_within(dir));
        let page = |page_id: String, key: PageKey, entries: Vec<&'a Entry>| PageDescriptor {
            template,
            page_id,
            key,
            entries,
        };

        let mut pages = match template.category {
            PageCategory::Index | PageCategory::Feed => {
                let default = if template.category == PageCategory::Index {
                    self.index_size
                } else {
                    self.feed_size
                };
                let window = template.window.unwrap_or(default);
                vec![page(
                    join(dir, &template.output_name),
                    PageKey::Index,
                    scoped.take(window).collect(),
                )]
            }
            PageCategory::Entry => scoped
                .map(|entry| {
                    page(
                        template.page_file(entry.id.as_str()),
                        PageKey::Entry {
                            id: entry.id.as_str().to_owned(),
                        },
                        vec![entry],
                    )
                })
                .collect(),
            PageCategory::Section => {
                let mut groups: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
                for entry in scoped {
                    for section in entry.id.sections() {
                        if section.len() > dir.len() {
                            groups.entry(section).or_default().push(entry);
                        }
                    }
                }
                groups
                    .into_iter()
                    .map(|(section, entries)| {
                        page(
                            template.page_file(&format!("{section}/index")),
                            PageKey::Section {
                                path: section.to_owned(),
                            },
                            entries,
                        )
                    })
                    .collect()
            }
            PageCategory::Tag => {
                let mut groups: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
                for entry in scoped {
                    for tag in &entry.tags {
                        if is_path_segment(tag) {
                            let list = groups.entry(tag.as_str()).or_default();
                            // Duplicate tags on one entry
                            if !list.last().is_some_and(|last| last.id == entry.id) {
                                list.push(entry);
                            }
                        } else {
                            tracing::debug!(entry = %entry.id, tag = %tag, "Tag is not usable as a path");
                        }
                    }
                }
                groups
                    .into_iter()
                    .map(|(tag, entries)| {
                        page(
                            join(dir, &template.page_file(&format!("tags/{tag}/index"))),
                            PageKey::Tag {
                                name: tag.to_owned(),
                            },
                            entries,
                        )
                    })
                    .collect()
            }
            PageCategory::Yearly => {
                let mut groups: BTreeMap<i32, Vec<&Entry>> = BTreeMap::new();
                for entry in scoped {
                    groups.entry(entry.created.year()).or_default().push(entry);
                }
                groups
                    .into_iter()
                    .map(|(year, entries)| {
                        page(
                            join(dir, &template.page_file(&format!("{year:04}/index"))),
                            PageKey::Year { year },
                            entries,
                        )
                    })
                    .collect()
            }
            PageCategory::Monthly => {
                let mut groups: BTreeMap<(i32, u32), Vec<&Entry>> = BTreeMap::new();
                for entry in scoped {
                    let created = entry.created;
                    groups
                        .entry((created.year(), created.month()))
                        .or_default()
                        .push(entry);
                }
                groups
                    .into_iter()
                    .map(|((year, month), entries)| {
                        page(
                            join(
                                dir,
                                &template.page_file(&format!("{year:04}/{month:02}/index")),
                            ),
                            PageKey::Month { year, month },
                            entries,
                        )
                    })
                    .collect()
            }
            PageCategory::Daily => {
                let mut groups: BTreeMap<(i32, u32, u32), Vec<&Entry>> = BTreeMap::new();
                for entry in scoped {
                    let created = entry.created;
                    groups
                        .entry((created.year(), created.month(), created.day()))
                        .or_default()
                        .push(entry);
                }
                groups
                    .into_iter()
                    .map(|((year, month, day), entries)| {
                        page(
                            join(
                                dir,
                                &template.page_file(&format!("{year:04}/{month:02}/{day:02}/index")),
                            ),
                            PageKey::Day { year, month, day },
                            entries,
                        )
                    })
                    .collect()
            }
        };
        pages.sort_by(|a, b| a.page_id.cmp(&b.page_id));
        pages
    }
}

/// Narrow a full page list to the pages `scope` affects.
#[must_use]
pub fn select<'a>(
    pages: Vec<PageDescriptor<'a>>,
    scope: &ChangeScope,
    previous: Option<&Manifest>,
) -> Vec<PageDescriptor<'a>> {
    let ChangeScope::Update(id) = scope else {
        return pages;
    };
    pages
        .into_iter()
        .filter(|page| {
            page.contains(id)
                || match previous {
                    Some(manifest) => {
                        manifest.contained(&page.page_id, id.as_str())
                            || !manifest.has_page(&page.page_id)
                    }
                    None => page.category().is_aggregate() && id.is_within(&page.template.dir),
                }
        })
        .collect()
}
