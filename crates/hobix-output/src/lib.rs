//! Built-in output plugins for the Hobix weblog engine.
//!
//! - [`JinjaOutput`] (`jinja`): templated markup with Markdown entry bodies
//! - [`RssOutput`] (`rss`): RSS 2.0 feed
//! - [`AtomOutput`] (`atom`): Atom 1.0 feed
//!
//! Feed renderers ignore the template body and stamp the feed with the newest
//! entry's timestamp, so rendering is a pure function of the page's entries.

mod atom_feed;
mod feed;
mod jinja;
mod markdown;
mod rss_feed;

use hobix_plugin::OutputDescriptor;

pub use atom_feed::AtomOutput;
pub use jinja::JinjaOutput;
pub use rss_feed::RssOutput;

/// Descriptors for every built-in output plugin, in default registration order.
#[must_use]
pub fn descriptors() -> Vec<OutputDescriptor> {
    vec![
        OutputDescriptor {
            name: jinja::NAME,
            extensions: jinja::EXTENSIONS,
            construct: || Box::new(JinjaOutput::new()),
        },
        OutputDescriptor {
            name: rss_feed::NAME,
            extensions: rss_feed::EXTENSIONS,
            construct: || Box::new(RssOutput),
        },
        OutputDescriptor {
            name: atom_feed::NAME,
            extensions: atom_feed::EXTENSIONS,
            construct: || Box::new(AtomOutput),
        },
    ]
}
