//! Jinja-compatible templated markup.
//!
//! Templates see four variables:
//!
//! - `weblog`: title, link, tagline, authors
//! - `page`: id (output path), category, key, title, url
//! - `entries`: entries on the page, newest first
//! - `entry`: the entry of an entry page (undefined elsewhere)
//!
//! Every entry carries its stored fields plus `url` and `author_name`.
//!
//! Filters: `markdown` renders Markdown to HTML, `date(format)` formats an
//! entry timestamp with `strftime` syntax (default `%Y-%m-%d`).

use std::fmt::Write;

use chrono::DateTime;
use hobix_plugin::{OutputPlugin, PageCategory, PageContext, PageKey, RenderError, Template};
use hobix_storage::Entry;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Value, context};
use serde::Serialize;

use crate::feed::entry_url;
use crate::markdown;

/// Plugin name.
pub const NAME: &str = "jinja";

/// Template extensions bound to this plugin.
pub const EXTENSIONS: &[&str] = &["jinja", "j2"];

/// Jinja output plugin.
pub struct JinjaOutput {
    env: Environment<'static>,
}

impl JinjaOutput {
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(auto_escape_for);
        env.add_filter("markdown", markdown_filter);
        env.add_filter("date", date_filter);
        Self { env }
    }
}

impl Default for JinjaOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML escaping for `.html`, `.htm` and `.xml` outputs, none otherwise.
fn auto_escape_for(name: &str) -> AutoEscape {
    let name = EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(&format!(".{ext}")))
        .unwrap_or(name);
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html" | "htm" | "xml") => AutoEscape::Html,
        _ => AutoEscape::None,
    }
}

fn markdown_filter(value: &str) -> Value {
    Value::from_safe_string(markdown::to_html(value))
}

fn date_filter(value: &str, format: Option<&str>) -> Result<String, Error> {
    let format = format.unwrap_or("%Y-%m-%d");
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("'{value}' is not a timestamp"),
        )
        .with_source(e)
    })?;
    let mut out = String::new();
    write!(out, "{}", parsed.format(format)).map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid date format '{format}'"),
        )
    })?;
    Ok(out)
}

#[derive(Serialize)]
struct EntryView<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    url: String,
    author_name: &'a str,
}

impl<'a> EntryView<'a> {
    fn new(ctx: &PageContext<'a>, entry: &'a Entry) -> Self {
        Self {
            entry,
            url: entry_url(ctx.weblog, entry),
            author_name: ctx.weblog.author_name(&entry.author),
        }
    }
}

#[derive(Serialize)]
struct PageView<'a> {
    id: &'a str,
    category: PageCategory,
    key: &'a PageKey,
    title: String,
    url: String,
    template: &'a Template,
}

impl OutputPlugin for JinjaOutput {
    fn name(&self) -> &str {
        NAME
    }

    fn matches(&self, extension: &str) -> bool {
        EXTENSIONS.contains(&extension)
    }

    fn render(&self, ctx: &PageContext<'_>) -> Result<Vec<u8>, RenderError> {
        let entries: Vec<EntryView<'_>> = ctx
            .entries
            .iter()
            .map(|&entry| EntryView::new(ctx, entry))
            .collect();
        let entry = ctx.entry().map(|entry| EntryView::new(ctx, entry));
        let page = PageView {
            id: ctx.page_id,
            category: ctx.template.category,
            key: ctx.key,
            title: ctx.title(),
            url: ctx.weblog.page_url(ctx.page_id),
            template: ctx.template,
        };

        let html = self
            .env
            .render_named_str(
                &ctx.template.path,
                &ctx.template.source,
                context! {
                    weblog => ctx.weblog,
                    page => page,
                    entries => entries,
                    entry => entry,
                },
            )
            .map_err(|e| {
                tracing::debug!(template = %ctx.template.path, line = ?e.line(), "Template error");
                RenderError::Template(format!("{e:#}"))
            })?;
        Ok(html.into_bytes())
    }
}
