//! Publish plugin contract and watch sets.

use std::sync::Arc;

use serde::Serialize;

use crate::category::PageCategory;
use crate::context::WeblogInfo;
use crate::registry::PluginError;

/// Notification that a page was written during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PublishEvent {
    pub category: PageCategory,
    /// Output path of the written page.
    pub page_id: String,
}

/// One watch-set key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchKey {
    /// `*`: every page.
    All,
    /// A category name: every page of that category.
    Category(PageCategory),
    /// A path prefix ending in `/`: every page below it.
    Prefix(String),
}

impl WatchKey {
    /// Parse a key as written in configuration.
    ///
    /// # Errors
    ///
    /// Returns the offending key if it is neither `*`, a prefix ending in `/`,
    /// nor a category name.
    pub fn parse(key: &str) -> Result<Self, String> {
        if key == "*" {
            Ok(Self::All)
        } else if key.ends_with('/') {
            Ok(Self::Prefix(key.trim_start_matches('/').to_owned()))
        } else {
            PageCategory::from_name(key)
                .map(Self::Category)
                .ok_or_else(|| key.to_owned())
        }
    }

    fn matches(&self, event: &PublishEvent) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => *category == event.category,
            Self::Prefix(prefix) => event.page_id.starts_with(prefix.as_str()),
        }
    }
}

/// Pages a publish plugin wants to hear about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    keys: Vec<WatchKey>,
}

impl WatchSet {
    /// Build a watch set from keys.
    #[must_use]
    pub fn new(keys: Vec<WatchKey>) -> Self {
        Self { keys }
    }

    /// Parse configuration keys on behalf of `plugin`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidConfig`] naming the first bad key.
    pub fn parse<S: AsRef<str>>(plugin: &str, keys: &[S]) -> Result<Self, PluginError> {
        keys.iter()
            .map(|key| {
                WatchKey::parse(key.as_ref()).map_err(|bad| PluginError::InvalidConfig {
                    plugin: plugin.to_owned(),
                    message: format!("unknown watch key '{bad}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Whether any key matches the event.
    #[must_use]
    pub fn matches(&self, event: &PublishEvent) -> bool {
        self.keys.iter().any(|key| key.matches(event))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Error raised by a publish plugin.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Network failure talking to a remote endpoint.
    #[error("request to {url} failed: {message}")]
    Http {
        url: String,
        message: String,
    },
    /// Remote endpoint answered but refused the notification.
    #[error("{url} rejected notification: {message}")]
    Rejected {
        url: String,
        message: String,
    },
    /// External command could not run or exited unsuccessfully.
    #[error("command `{command}` failed: {message}")]
    Command {
        command: String,
        message: String,
    },
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reacts to written pages (pinging directories, uploading files, ...).
///
/// The dispatcher never calls one plugin from two threads at once, hence
/// `&mut self` and no `Sync` bound.
pub trait PublishPlugin: Send {
    /// Registered plugin name.
    fn name(&self) -> &str;

    /// Pages this plugin is notified about.
    fn watch(&self) -> &WatchSet;

    /// Handle one written page.
    fn publish(&mut self, event: &PublishEvent) -> Result<(), PublishError>;
}

/// Constructor signature for publish plugins.
pub type PublishConstructor =
    fn(Arc<WeblogInfo>, &serde_json::Value) -> Result<Box<dyn PublishPlugin>, PluginError>;

/// Explicit registration record for a publish plugin.
#[derive(Debug, Clone, Copy)]
pub struct PublishDescriptor {
    /// Plugin name used in configuration.
    pub name: &'static str,
    /// Constructor taking the shared weblog description and the plugin's own
    /// configuration table.
    pub construct: PublishConstructor,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(category: PageCategory, page_id: &str) -> PublishEvent {
        PublishEvent {
            category,
            page_id: page_id.to_owned(),
        }
    }

    #[test]
    fn test_watch_key_parse() {
        assert_eq!(WatchKey::parse("*"), Ok(WatchKey::All));
        assert_eq!(
            WatchKey::parse("index"),
            Ok(WatchKey::Category(PageCategory::Index))
        );
        assert_eq!(WatchKey::parse("a/"), Ok(WatchKey::Prefix("a/".to_owned())));
        assert_eq!(WatchKey::parse("bogus"), Err("bogus".to_owned()));
    }

    #[test]
    fn test_watch_set_matches() {
        let watch = WatchSet::parse("test", &["index", "blog/"]).unwrap();

        assert!(watch.matches(&event(PageCategory::Index, "index.html")));
        assert!(watch.matches(&event(PageCategory::Entry, "blog/one.html")));
        assert!(!watch.matches(&event(PageCategory::Entry, "blogroll/x.html")));
        assert!(!watch.matches(&event(PageCategory::Tag, "tags/x/index.html")));
    }

    #[test]
    fn test_watch_set_all() {
        let watch = WatchSet::new(vec![WatchKey::All]);
        assert!(watch.matches(&event(PageCategory::Daily, "2004/05/07/index.html")));
    }

    #[test]
    fn test_empty_watch_set_matches_nothing() {
        let watch = WatchSet::default();
        assert!(watch.is_empty());
        assert!(!watch.matches(&event(PageCategory::Index, "index.html")));
    }

    #[test]
    fn test_watch_set_parse_error_names_plugin() {
        let err = WatchSet::parse("ping", &["index", "weekly"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ping"));
        assert!(msg.contains("weekly"));
    }
}
