//! Entry model.
//!
//! An [`Entry`] is one unit of weblog content (a post or a link list). Entries are
//! keyed by an [`EntryId`], a slash-delimited path whose leading segments are
//! categorization directories:
//!
//! - `"hello"` - top-level entry
//! - `"blog/weddings/another"` - entry in section `blog/weddings`

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, StorageErrorKind};

/// Hierarchical entry identifier.
///
/// Ids are case-sensitive. Validation rejects empty ids, leading or trailing
/// slashes, empty segments, and segments starting with `.` (which also rules out
/// `.` and `..`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    /// Parse and validate an entry id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::InvalidId`] if the id is malformed.
    pub fn new(id: impl Into<String>) -> Result<Self, StorageError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .split('/')
                .all(|segment| !segment.is_empty() && !segment.starts_with('.'));
        if valid {
            Ok(Self(id))
        } else {
            Err(StorageError::new(StorageErrorKind::InvalidId).with_id(id))
        }
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Categorization path containing this entry (`""` for top-level entries).
    #[must_use]
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// Last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Whether the entry lives at or below `prefix`.
    ///
    /// The empty prefix contains every entry. Matching is segment-wise, so
    /// `"blog"` contains `"blog/one"` but not `"blogroll/two"`.
    #[must_use]
    pub fn is_within(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_matches('/');
        prefix.is_empty()
            || self
                .0
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Every categorization directory above this entry, outermost first.
    ///
    /// `"a/b/c"` yields `["a", "a/b"]`; a top-level entry yields nothing.
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        self.0
            .match_indices('/')
            .map(|(idx, _)| &self.0[..idx])
            .collect()
    }

    /// Human-readable title derived from the last segment.
    ///
    /// Splits on `_`, `-` and lower-to-upper camel case boundaries:
    /// `"anotherPatheticWedding"` becomes `"Another Pathetic Wedding"`.
    #[must_use]
    pub fn default_title(&self) -> String {
        let mut words: Vec<String> = Vec::new();
        for part in self.name().split(['_', '-', ' ']).filter(|p| !p.is_empty()) {
            let mut word = String::new();
            for ch in part.chars() {
                if ch.is_uppercase() && !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
                word.push(ch);
            }
            if !word.is_empty() {
                words.push(word);
            }
        }
        let mut title = String::new();
        for word in words {
            if !title.is_empty() {
                title.push(' ');
            }
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                title.extend(first.to_uppercase());
                title.push_str(chars.as_str());
            }
        }
        title
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntryId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntryId {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Entry type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Prose entry.
    #[default]
    Post,
    /// Link list entry.
    Link,
}

/// A single link carried by a link entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLink {
    pub title: String,
    pub url: String,
}

/// One unit of weblog content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Hierarchical identifier.
    pub id: EntryId,
    pub title: String,
    pub author: String,
    /// Creation time; drives every ordering in the engine.
    pub created: DateTime<Utc>,
    pub summary: Option<String>,
    /// Body text (Markdown).
    pub content: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Links of a link entry. Empty for posts.
    pub links: Vec<EntryLink>,
}

impl Entry {
    /// Create an empty post.
    #[must_use]
    pub fn new(id: EntryId, created: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            author: String::new(),
            created,
            summary: None,
            content: String::new(),
            tags: Vec::new(),
            entry_type: EntryType::Post,
            links: Vec::new(),
        }
    }

    /// Engine ordering: newest first, ties broken by ascending id.
    #[must_use]
    pub fn newest_first(&self, other: &Self) -> Ordering {
        other
            .created
            .cmp(&self.created)
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Split off everything but the id, e.g. for serialization to a file.
    #[must_use]
    pub fn to_fields(&self) -> EntryFields {
        EntryFields {
            title: self.title.clone(),
            author: self.author.clone(),
            created: Some(self.created),
            summary: self.summary.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            entry_type: self.entry_type,
            links: self.links.clone(),
        }
    }
}

/// Entry attributes without the id, as stored on disk or edited by hand.
///
/// `created` is optional here; backends supply a fallback (e.g. file mtime).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFields {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<EntryLink>,
}

impl EntryFields {
    /// Attach an id, using `fallback_created` when no timestamp was stored.
    #[must_use]
    pub fn into_entry(self, id: EntryId, fallback_created: DateTime<Utc>) -> Entry {
        Entry {
            id,
            title: self.title,
            author: self.author,
            created: self.created.unwrap_or(fallback_created),
            summary: self.summary,
            content: self.content,
            tags: self.tags,
            entry_type: self.entry_type,
            links: self.links,
        }
    }
}

/// Sort entries newest first, ties broken by ascending id.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(Entry::newest_first);
}
