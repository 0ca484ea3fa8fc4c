//! Page categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of page a template produces.
///
/// The category is the first dot-separated part of a template file name
/// (`index.html.jinja` is an [`Index`](Self::Index) template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCategory {
    /// Newest entries in scope, windowed.
    Index,
    /// Newest entries in scope as a syndication feed, windowed.
    Feed,
    /// One page per entry.
    Entry,
    /// One page per categorization directory.
    Section,
    /// One page per tag.
    Tag,
    /// One page per year.
    Yearly,
    /// One page per month.
    Monthly,
    /// One page per day.
    Daily,
}

impl PageCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Index,
        Self::Feed,
        Self::Entry,
        Self::Section,
        Self::Tag,
        Self::Yearly,
        Self::Monthly,
        Self::Daily,
    ];

    /// Category name as used in template file names and watch sets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Feed => "feed",
            Self::Entry => "entry",
            Self::Section => "section",
            Self::Tag => "tag",
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
            Self::Daily => "daily",
        }
    }

    /// Look up a category by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Whether pages of this category aggregate several entries.
    #[must_use]
    pub fn is_aggregate(self) -> bool {
        self != Self::Entry
    }

    /// Whether the entry subset is capped by a window size.
    #[must_use]
    pub fn is_windowed(self) -> bool {
        matches!(self, Self::Index | Self::Feed)
    }
}

impl fmt::Display for PageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
