//! Output plugin contract.

use crate::context::PageContext;

/// Error raised while rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template failed to compile or evaluate.
    #[error("template error: {0}")]
    Template(String),
    /// Feed document could not be built.
    #[error("feed error: {0}")]
    Feed(String),
    /// Anything else a plugin reports.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Renders pages of one or more template types.
///
/// Output plugins are shared across render workers, so implementations must be
/// `Send + Sync` and keep `render` free of observable side effects.
pub trait OutputPlugin: Send + Sync {
    /// Registered plugin name (e.g., "jinja", "rss").
    fn name(&self) -> &str;

    /// Whether this plugin renders templates with the given extension.
    ///
    /// Consulted only when no plugin declared `extension` explicitly.
    fn matches(&self, extension: &str) -> bool;

    /// Render one page to bytes.
    fn render(&self, ctx: &PageContext<'_>) -> Result<Vec<u8>, RenderError>;
}

/// Explicit registration record for an output plugin.
#[derive(Debug, Clone, Copy)]
pub struct OutputDescriptor {
    /// Plugin name used in configuration.
    pub name: &'static str,
    /// Template extensions bound to this plugin at registration.
    pub extensions: &'static [&'static str],
    /// Constructor.
    pub construct: fn() -> Box<dyn OutputPlugin>,
}
