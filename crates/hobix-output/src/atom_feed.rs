//! Atom 1.0 feeds.
//!
//! The template body is ignored; the feed is built from the weblog description
//! and the page's entries.

use atom_syndication::{Category, Content, Entry as AtomEntry, Feed, Link, Person, Text};
use hobix_plugin::{OutputPlugin, PageContext, RenderError, WeblogInfo};
use hobix_storage::Entry;

use crate::feed::{build_date, entry_html, entry_url};
use crate::markdown;

/// Plugin name.
pub const NAME: &str = "atom";

/// Template extensions bound to this plugin.
pub const EXTENSIONS: &[&str] = &["atom"];

/// Atom output plugin.
#[derive(Debug, Default)]
pub struct AtomOutput;

fn link(href: String, rel: &str, mime_type: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link.set_mime_type(Some(mime_type.to_owned()));
    link
}

fn person(name: &str) -> Person {
    let mut person = Person::default();
    person.set_name(name);
    person
}

fn atom_entry(weblog: &WeblogInfo, entry: &Entry) -> AtomEntry {
    let url = entry_url(weblog, entry);
    let mut atom = AtomEntry::default();
    atom.set_title(entry.title.as_str());
    atom.set_id(url.clone());
    atom.set_links(vec![link(url, "alternate", "text/html")]);
    atom.set_published(Some(entry.created.fixed_offset()));
    atom.set_updated(entry.created.fixed_offset());

    let author = weblog.author_name(&entry.author);
    if !author.is_empty() {
        atom.set_authors(vec![person(author)]);
    }
    if let Some(summary) = &entry.summary {
        atom.set_summary(Some(Text::html(markdown::to_html(summary))));
    }

    let mut content = Content::default();
    content.set_content_type(Some("html".to_owned()));
    content.set_value(Some(if entry.summary.is_some() {
        markdown::to_html(&entry.content)
    } else {
        entry_html(entry)
    }));
    atom.set_content(Some(content));

    atom.set_categories(
        entry
            .tags
            .iter()
            .map(|tag| {
                let mut category = Category::default();
                category.set_term(tag.as_str());
                category
            })
            .collect::<Vec<_>>(),
    );
    atom
}

impl OutputPlugin for AtomOutput {
    fn name(&self) -> &str {
        NAME
    }

    fn matches(&self, extension: &str) -> bool {
        EXTENSIONS.contains(&extension)
    }

    fn render(&self, ctx: &PageContext<'_>) -> Result<Vec<u8>, RenderError> {
        let weblog = ctx.weblog;
        let mut feed = Feed::default();
        feed.set_title(weblog.title.as_str());
        if !weblog.tagline.is_empty() {
            feed.set_subtitle(Some(Text::plain(weblog.tagline.as_str())));
        }
        feed.set_id(weblog.page_url(ctx.page_id));
        feed.set_updated(build_date(ctx.entries).fixed_offset());
        feed.set_links(vec![
            link(
                weblog.page_url(ctx.page_id),
                "self",
                "application/atom+xml",
            ),
            link(weblog.link.clone(), "alternate", "text/html"),
        ]);
        feed.set_entries(
            ctx.entries
                .iter()
                .map(|entry| atom_entry(weblog, entry))
                .collect::<Vec<_>>(),
        );

        feed.write_to(Vec::new())
            .map_err(|e| RenderError::Feed(e.to_string()))
    }
}
