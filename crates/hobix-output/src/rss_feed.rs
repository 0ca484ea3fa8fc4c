//! RSS 2.0 feeds.
//!
//! The template body is ignored; the channel is built from the weblog
//! description and the page's entries.

use hobix_plugin::{OutputPlugin, PageContext, RenderError, WeblogInfo};
use hobix_storage::Entry;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::feed::{build_date, entry_html, entry_url};

/// Plugin name.
pub const NAME: &str = "rss";

/// Template extensions bound to this plugin.
pub const EXTENSIONS: &[&str] = &["rss"];

/// RSS output plugin.
#[derive(Debug, Default)]
pub struct RssOutput;

fn item(weblog: &WeblogInfo, entry: &Entry) -> Item {
    let url = entry_url(weblog, entry);
    let author = weblog.author_name(&entry.author);
    let categories = entry
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
        .collect::<Vec<_>>();

    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(url.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(url).build()))
        .description(Some(entry_html(entry)))
        .pub_date(Some(entry.created.to_rfc2822()))
        .author((!author.is_empty()).then(|| author.to_owned()))
        .categories(categories)
        .build()
}

impl OutputPlugin for RssOutput {
    fn name(&self) -> &str {
        NAME
    }

    fn matches(&self, extension: &str) -> bool {
        EXTENSIONS.contains(&extension)
    }

    fn render(&self, ctx: &PageContext<'_>) -> Result<Vec<u8>, RenderError> {
        let items: Vec<Item> = ctx
            .entries
            .iter()
            .map(|entry| item(ctx.weblog, entry))
            .collect();

        let channel = ChannelBuilder::default()
            .title(ctx.weblog.title.clone())
            .link(ctx.weblog.link.clone())
            .description(ctx.weblog.tagline.clone())
            .generator(Some(format!("Hobix {}", env!("CARGO_PKG_VERSION"))))
            .last_build_date(Some(build_date(ctx.entries).to_rfc2822()))
            .items(items)
            .build();

        channel
            .write_to(Vec::new())
            .map_err(|e| RenderError::Feed(e.to_string()))
    }
}
