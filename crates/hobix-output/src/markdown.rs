//! Markdown to HTML conversion for entry bodies.

use pulldown_cmark::{Options, Parser, html};

/// Render Markdown to an HTML fragment.
///
/// GFM tables, strikethrough and task lists are enabled.
pub(crate) fn to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!(to_html("Hello *world*."), "<p>Hello <em>world</em>.</p>\n");
    }

    #[test]
    fn test_strikethrough_enabled() {
        assert_eq!(to_html("~~gone~~"), "<p><del>gone</del></p>\n");
    }

    #[test]
    fn test_table_enabled() {
        let out = to_html("| a |\n|---|\n| 1 |\n");
        assert!(out.contains("<table>"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(to_html(""), "");
    }
}
