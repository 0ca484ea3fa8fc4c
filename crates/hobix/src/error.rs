//! CLI error types.

use hobix_config::ConfigError;
use hobix_plugin::PluginError;
use hobix_site::RegenError;
use hobix_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Plugin(#[from] PluginError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Regen(#[from] RegenError),

    #[error("invalid entry: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Editor(String),
}
