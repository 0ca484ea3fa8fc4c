//! Pass results.

use std::fmt;

use hobix_plugin::{PageCategory, PluginLookupError, PublishError, RenderError};
use hobix_storage::StorageError;

use crate::mapper::ChangeScope;
use crate::sink::SinkError;
use crate::template::TemplateError;

/// A page rendered and written during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    pub page_id: String,
    pub category: PageCategory,
    pub template: String,
    pub bytes: usize,
}

/// Why a single page was not written.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Write(#[from] SinkError),
}

/// A page that failed to render or write.
#[derive(Debug)]
pub struct PageFailure {
    pub page_id: String,
    pub template: String,
    pub error: PageError,
}

/// A template no output plugin handles. None of its pages were rendered.
#[derive(Debug)]
pub struct TemplateFailure {
    pub template: String,
    /// Pages selected for this pass that the template would have produced.
    pub pages: Vec<String>,
    pub error: PluginLookupError,
}

/// A publish plugin that failed on one page.
#[derive(Debug)]
pub struct PublishFailure {
    pub plugin: String,
    pub page_id: String,
    pub error: PublishError,
}

/// Summary of one regeneration pass.
#[derive(Debug)]
pub struct PassReport {
    pub scope: ChangeScope,
    /// Pages the templates produce for the current entries.
    pub pages_mapped: usize,
    /// Pages written, in mapper order.
    pub written: Vec<WrittenPage>,
    /// One record per template without an output plugin.
    pub template_failures: Vec<TemplateFailure>,
    pub page_failures: Vec<PageFailure>,
    /// Successful publish calls.
    pub notified: usize,
    pub publish_failures: Vec<PublishFailure>,
    /// Pages dropped from the manifest because no template produces them.
    pub pruned: Vec<String>,
}

impl PassReport {
    pub(crate) fn new(scope: ChangeScope, pages_mapped: usize) -> Self {
        Self {
            scope,
            pages_mapped,
            written: Vec::new(),
            template_failures: Vec::new(),
            page_failures: Vec::new(),
            notified: 0,
            publish_failures: Vec::new(),
            pruned: Vec::new(),
        }
    }

    /// Whether every template, page and notification succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.template_failures.is_empty()
            && self.page_failures.is_empty()
            && self.publish_failures.is_empty()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pass: {} of {} pages written, {} notification(s)",
            self.scope,
            self.written.len(),
            self.pages_mapped,
            self.notified
        )?;
        if !self.template_failures.is_empty() {
            let templates: Vec<&str> = self
                .template_failures
                .iter()
                .map(|failure| failure.template.as_str())
                .collect();
            write!(f, "; no output plugin for: {}", templates.join(", "))?;
        }
        if !self.page_failures.is_empty() {
            let pages: Vec<&str> = self
                .page_failures
                .iter()
                .map(|failure| failure.page_id.as_str())
                .collect();
            write!(f, "; failed pages: {}", pages.join(", "))?;
        }
        if !self.publish_failures.is_empty() {
            let calls: Vec<String> = self
                .publish_failures
                .iter()
                .map(|failure| format!("{} ({})", failure.page_id, failure.plugin))
                .collect();
            write!(f, "; failed notifications: {}", calls.join(", "))?;
        }
        Ok(())
    }
}

/// Error returned by a regeneration pass.
#[derive(Debug, thiserror::Error)]
pub enum RegenError {
    /// The template tree could not be read; nothing was rendered.
    #[error(transparent)]
    Templates(#[from] TemplateError),
    /// Entries could not be listed; nothing was rendered.
    #[error("failed to list entries: {0}")]
    Storage(#[source] StorageError),
    /// Some pages or notifications failed; the rest were written and sent.
    #[error("{0}")]
    Incomplete(Box<PassReport>),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_display_summary() {
        let mut report = PassReport::new(ChangeScope::Full, 3);
        report.written.push(WrittenPage {
            page_id: "index.html".to_owned(),
            category: PageCategory::Index,
            template: "index.html.jinja".to_owned(),
            bytes: 10,
        });
        report.notified = 1;
        assert!(report.is_complete());
        assert_eq!(report.to_string(), "full pass: 1 of 3 pages written, 1 notification(s)");

        report.page_failures.push(PageFailure {
            page_id: "a.html".to_owned(),
            template: "entry.html.jinja".to_owned(),
            error: PageError::Render(RenderError::Template("boom".to_owned())),
        });
        assert!(!report.is_complete());
        assert!(report.to_string().ends_with("; failed pages: a.html"));

        report.template_failures.push(TemplateFailure {
            template: "tag.html.haml".to_owned(),
            pages: Vec::new(),
            error: PluginLookupError {
                extension: "haml".to_owned(),
                template: "tag.html.haml".to_owned(),
            },
        });
        assert_eq!(
            report.to_string(),
            "full pass: 1 of 3 pages written, 1 notification(s); \
             no output plugin for: tag.html.haml; failed pages: a.html"
        );
    }
}
