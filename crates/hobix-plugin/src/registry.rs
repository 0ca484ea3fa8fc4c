//! Plugin registry.
//!
//! Plugins are registered explicitly at startup through descriptors and stay
//! registered for the lifetime of the process. The [`PluginCatalog`] lists what
//! is available; [`PluginCatalog::build`] turns configuration into a populated
//! [`PluginRegistry`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use hobix_storage::Storage;

use crate::context::WeblogInfo;
use crate::output::{OutputDescriptor, OutputPlugin};
use crate::publish::{PublishDescriptor, PublishPlugin};

/// No output plugin handles a template extension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no output plugin handles '.{extension}' templates ({template})")]
pub struct PluginLookupError {
    /// Template extension looked up.
    pub extension: String,
    /// Template path that needed it.
    pub template: String,
}

/// Plugin configuration error, raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Configuration names a plugin nobody registered.
    #[error("unknown {role} plugin '{name}'")]
    Unknown {
        /// Plugin role ("output", "publish", "storage").
        role: &'static str,
        name: String,
    },
    /// Plugin rejected its configuration.
    #[error("invalid configuration for '{plugin}' plugin: {message}")]
    InvalidConfig { plugin: String, message: String },
}

/// Explicit registration record for a storage plugin.
#[derive(Debug, Clone, Copy)]
pub struct StorageDescriptor {
    /// Plugin name used in configuration.
    pub name: &'static str,
    /// Constructor taking the entries directory.
    pub construct: fn(&Path) -> Box<dyn Storage>,
}

/// Loaded plugins, by capability.
#[derive(Default)]
pub struct PluginRegistry {
    /// Output plugins in registration order.
    outputs: Vec<Box<dyn OutputPlugin>>,
    output_names: HashMap<String, usize>,
    output_extensions: HashMap<String, usize>,
    /// Publish plugins in notification order, each carrying its watch set.
    publishers: Vec<Box<dyn PublishPlugin>>,
    storages: HashMap<&'static str, StorageDescriptor>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output plugin and bind its declared extensions.
    ///
    /// An extension already bound to an earlier plugin keeps that binding.
    pub fn register_output(&mut self, descriptor: &OutputDescriptor) {
        self.add_output((descriptor.construct)(), descriptor.extensions);
    }

    /// Register an already constructed output plugin.
    pub fn add_output(&mut self, plugin: Box<dyn OutputPlugin>, extensions: &[&str]) {
        let idx = self.outputs.len();
        self.output_names.insert(plugin.name().to_owned(), idx);
        for ext in extensions {
            if let Some(&existing) = self.output_extensions.get(*ext) {
                tracing::warn!(
                    extension = ext,
                    bound = self.outputs[existing].name(),
                    ignored = plugin.name(),
                    "Template extension already bound"
                );
                continue;
            }
            self.output_extensions.insert((*ext).to_owned(), idx);
        }
        tracing::debug!(plugin = plugin.name(), "Registered output plugin");
        self.outputs.push(plugin);
    }

    /// Register a publish plugin. Notification order is registration order.
    pub fn add_publisher(&mut self, plugin: Box<dyn PublishPlugin>) {
        tracing::debug!(plugin = plugin.name(), "Registered publish plugin");
        self.publishers.push(plugin);
    }

    /// Register a storage plugin descriptor.
    pub fn register_storage(&mut self, descriptor: StorageDescriptor) {
        self.storages.insert(descriptor.name, descriptor);
    }

    /// Output plugin registered under `name`.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&dyn OutputPlugin> {
        self.output_names
            .get(name)
            .map(|&idx| self.outputs[idx].as_ref())
    }

    /// Output plugin for a template extension.
    ///
    /// Declared extensions win; otherwise each plugin's `matches` is asked in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`PluginLookupError`] if no plugin handles `extension`.
    pub fn output_for(
        &self,
        extension: &str,
        template: &str,
    ) -> Result<&dyn OutputPlugin, PluginLookupError> {
        if let Some(&idx) = self.output_extensions.get(extension) {
            return Ok(self.outputs[idx].as_ref());
        }
        self.outputs
            .iter()
            .find(|plugin| plugin.matches(extension))
            .map(|plugin| plugin.as_ref())
            .ok_or_else(|| PluginLookupError {
                extension: extension.to_owned(),
                template: template.to_owned(),
            })
    }

    /// Registered publish plugins in notification order.
    pub fn publishers_mut(&mut self) -> &mut [Box<dyn PublishPlugin>] {
        &mut self.publishers
    }

    /// Number of registered publish plugins.
    #[must_use]
    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    /// Open the storage plugin registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Unknown`] if no such storage plugin exists.
    pub fn open_storage(
        &self,
        name: &str,
        entries_dir: &Path,
    ) -> Result<Box<dyn Storage>, PluginError> {
        let descriptor = self.storages.get(name).ok_or_else(|| PluginError::Unknown {
            role: "storage",
            name: name.to_owned(),
        })?;
        Ok((descriptor.construct)(entries_dir))
    }
}

/// A publish plugin requested by configuration.
#[derive(Debug, Clone)]
pub struct PublishSpec {
    /// Registered plugin name.
    pub plugin: String,
    /// The plugin's own configuration table.
    pub settings: serde_json::Value,
}

/// Every plugin descriptor available to the process.
#[derive(Debug, Default, Clone)]
pub struct PluginCatalog {
    pub outputs: Vec<OutputDescriptor>,
    pub publishers: Vec<PublishDescriptor>,
    pub storages: Vec<StorageDescriptor>,
}

impl PluginCatalog {
    /// Build a registry from configured plugin names.
    ///
    /// Output plugins are registered in the order `outputs` lists them;
    /// publish plugins are constructed in `publish` order. Every storage
    /// descriptor is registered.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Unknown`] for a name missing from the catalog, or
    /// the error a publish plugin raised while reading its configuration.
    pub fn build<S: AsRef<str>>(
        &self,
        outputs: &[S],
        publish: &[PublishSpec],
        weblog: &Arc<WeblogInfo>,
    ) -> Result<PluginRegistry, PluginError> {
        let mut registry = PluginRegistry::new();

        for name in outputs {
            let name = name.as_ref();
            let descriptor = self
                .outputs
                .iter()
                .find(|d| d.name == name)
                .ok_or_else(|| PluginError::Unknown {
                    role: "output",
                    name: name.to_owned(),
                })?;
            registry.register_output(descriptor);
        }

        for spec in publish {
            let descriptor = self
                .publishers
                .iter()
                .find(|d| d.name == spec.plugin)
                .ok_or_else(|| PluginError::Unknown {
                    role: "publish",
                    name: spec.plugin.clone(),
                })?;
            let plugin = (descriptor.construct)(Arc::clone(weblog), &spec.settings)?;
            registry.add_publisher(plugin);
        }

        for descriptor in &self.storages {
            registry.register_storage(*descriptor);
        }

        Ok(registry)
    }
}
