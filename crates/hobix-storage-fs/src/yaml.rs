//! YAML encoding of entry files.

use hobix_storage::EntryFields;

/// Parse the fields of one entry file.
///
/// An empty file is a valid, empty entry.
pub(crate) fn parse_fields(content: &str) -> Result<EntryFields, serde_yaml::Error> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(EntryFields::default());
    }
    serde_yaml::from_str(trimmed)
}

/// Serialize entry fields for writing to disk.
pub(crate) fn render_fields(fields: &EntryFields) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(fields)
}

#[cfg(test)]
mod tests {
    use hobix_storage::EntryType;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_fields_full() {
        let yaml = "\
title: Another Pathetic Wedding
author: why
created: 2004-05-17T10:00:00Z
summary: short
content: |
  Hello *world*.
tags: [life, weddings]
";
        let fields = parse_fields(yaml).unwrap();
        assert_eq!(fields.title, "Another Pathetic Wedding");
        assert_eq!(fields.author, "why");
        assert_eq!(fields.created.unwrap().to_rfc3339(), "2004-05-17T10:00:00+00:00");
        assert_eq!(fields.summary.as_deref(), Some("short"));
        assert_eq!(fields.content, "Hello *world*.\n");
        assert_eq!(fields.tags, vec!["life", "weddings"]);
        assert_eq!(fields.entry_type, EntryType::Post);
    }

    #[test]
    fn test_parse_fields_link_entry() {
        let yaml = "\
type: link
links:
  - title: Rust
    url: https://www.rust-lang.org
";
        let fields = parse_fields(yaml).unwrap();
        assert_eq!(fields.entry_type, EntryType::Link);
        assert_eq!(fields.links.len(), 1);
        assert_eq!(fields.links[0].url, "https://www.rust-lang.org");
    }

    #[test]
    fn test_parse_fields_empty() {
        assert_eq!(parse_fields("  \n").unwrap(), EntryFields::default());
    }

    #[test]
    fn test_parse_fields_malformed() {
        assert!(parse_fields("title: [unclosed").is_err());
    }

    #[test]
    fn test_render_skips_empty_optionals() {
        let fields = EntryFields {
            title: "T".to_owned(),
            ..EntryFields::default()
        };
        let yaml = render_fields(&fields).unwrap();
        assert!(yaml.contains("title: T"));
        assert!(!yaml.contains("tags"));
        assert!(!yaml.contains("created"));
    }
}
