//! Plugin contracts and registry for the Hobix weblog engine.
//!
//! Hobix delegates every variable concern to plugins with a fixed capability
//! contract:
//!
//! - **Storage** plugins persist entries ([`hobix_storage::Storage`])
//! - **Output** plugins render a page from a template ([`OutputPlugin`])
//! - **Publish** plugins react to written pages ([`PublishPlugin`])
//!
//! Plugins are described by explicit descriptors ([`OutputDescriptor`],
//! [`PublishDescriptor`], [`StorageDescriptor`]) collected into a
//! [`PluginCatalog`]. Nothing registers itself by side effect.

mod category;
mod context;
mod output;
mod publish;
mod registry;

pub use category::PageCategory;
pub use context::{Author, PageContext, PageKey, Template, WeblogInfo};
pub use output::{OutputDescriptor, OutputPlugin, RenderError};
pub use publish::{
    PublishConstructor, PublishDescriptor, PublishError, PublishEvent, PublishPlugin, WatchKey,
    WatchSet,
};
pub use registry::{
    PluginCatalog, PluginError, PluginLookupError, PluginRegistry, PublishSpec, StorageDescriptor,
};
