//! Helpers shared by the RSS and Atom renderers.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use hobix_plugin::WeblogInfo;
use hobix_storage::{Entry, EntryType};

use crate::markdown;

/// Extension of entry pages that feed items link to.
pub(crate) const ENTRY_PAGE_EXT: &str = "html";

/// Public URL of an entry's page.
pub(crate) fn entry_url(weblog: &WeblogInfo, entry: &Entry) -> String {
    weblog.page_url(&format!("{}.{ENTRY_PAGE_EXT}", entry.id))
}

/// Feed build date: the newest entry's creation time.
///
/// Never the wall clock, so unchanged entries always produce identical feeds.
pub(crate) fn build_date(entries: &[&Entry]) -> DateTime<Utc> {
    entries
        .iter()
        .map(|entry| entry.created)
        .max()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// HTML summary of an entry: its summary if set, otherwise the full body.
///
/// Link entries append their links as a list.
pub(crate) fn entry_html(entry: &Entry) -> String {
    let mut html = markdown::to_html(entry.summary.as_deref().unwrap_or(&entry.content));
    if entry.entry_type == EntryType::Link && !entry.links.is_empty() {
        html.push_str("<ul>\n");
        for link in &entry.links {
            let _ = writeln!(
                html,
                "<li><a href=\"{}\">{}</a></li>",
                escape(&link.url),
                escape(&link.title)
            );
        }
        html.push_str("</ul>\n");
    }
    html
}

/// Minimal HTML escaping for attribute and text content.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
