//! Wiring configuration and plugins into an engine.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use hobix_config::{CliSettings, Config};
use hobix_plugin::{Author, PluginRegistry, PublishSpec, WeblogInfo};
use hobix_site::{OutputMapper, Regenerator, SiteSink, SkelDir};
use hobix_storage::{EntryId, Storage};

use crate::error::CliError;
use crate::plugins;

/// Arguments shared by every command that opens a weblog.
#[derive(Args, Debug, Default)]
pub(crate) struct ProjectArgs {
    /// Path to configuration file (default: auto-discover hobix.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Entries directory (overrides config).
    #[arg(long)]
    entries_dir: Option<PathBuf>,

    /// Template skeleton directory (overrides config).
    #[arg(long)]
    skel_dir: Option<PathBuf>,

    /// Site output directory (overrides config).
    #[arg(long)]
    htdocs_dir: Option<PathBuf>,
}

impl ProjectArgs {
    /// Load configuration with command-line overrides applied.
    pub(crate) fn load(&self, parallel: Option<bool>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            entries_dir: self.entries_dir.clone(),
            skel_dir: self.skel_dir.clone(),
            htdocs_dir: self.htdocs_dir.clone(),
            parallel,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// An opened weblog: configuration, plugins and entry store.
pub(crate) struct Project {
    config: Config,
    weblog: Arc<WeblogInfo>,
    registry: PluginRegistry,
    storage: Arc<dyn Storage>,
    dry_run: bool,
}

impl Project {
    /// Open a weblog with every configured plugin.
    pub(crate) fn open(config: Config) -> Result<Self, CliError> {
        Self::build(config, false)
    }

    /// Open a weblog without publish plugins or a page manifest.
    pub(crate) fn open_dry_run(config: Config) -> Result<Self, CliError> {
        Self::build(config, true)
    }

    fn build(config: Config, dry_run: bool) -> Result<Self, CliError> {
        let weblog = Arc::new(weblog_info(&config));
        let publish: Vec<PublishSpec> = if dry_run {
            Vec::new()
        } else {
            config
                .publish
                .iter()
                .map(|entry| PublishSpec {
                    plugin: entry.plugin.clone(),
                    settings: entry.settings_json(),
                })
                .collect()
        };

        let registry = plugins::catalog().build(&config.output.plugins, &publish, &weblog)?;
        let storage: Arc<dyn Storage> = Arc::from(
            registry.open_storage(&config.storage.plugin, &config.paths_resolved.entries_dir)?,
        );

        tracing::debug!(
            storage = %config.storage.plugin,
            publishers = registry.publisher_count(),
            dry_run,
            "Opened weblog"
        );

        Ok(Self {
            config,
            weblog,
            registry,
            storage,
            dry_run,
        })
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Login recorded on entries created by `hobix post`.
    ///
    /// The first configured author, then `$USER`.
    pub(crate) fn default_author(&self) -> String {
        self.config
            .authors
            .keys()
            .next()
            .cloned()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default()
    }

    /// Hand the plugins to a regeneration engine writing into `sink`.
    pub(crate) fn into_regenerator(self, sink: Arc<dyn SiteSink>) -> Regenerator {
        let paths = &self.config.paths_resolved;
        let templates = SkelDir::new(paths.skel_dir.clone())
            .with_windows(self.config.pages.windows.clone());
        let mapper = OutputMapper::new(self.config.pages.index_size, self.config.pages.feed_size);

        let regenerator = Regenerator::new(
            self.storage,
            Box::new(templates),
            self.registry,
            sink,
            self.weblog,
        )
        .with_mapper(mapper)
        .with_parallel(self.config.editor.parallel);

        if self.dry_run {
            regenerator
        } else {
            regenerator.with_manifest_path(paths.manifest_path())
        }
    }
}

/// Weblog description handed to plugins.
pub(crate) fn weblog_info(config: &Config) -> WeblogInfo {
    WeblogInfo {
        title: config.weblog.title.clone(),
        link: config.weblog.link.clone(),
        tagline: config.weblog.tagline.clone(),
        authors: config
            .authors
            .iter()
            .map(|(login, author)| {
                let name = if author.name.is_empty() {
                    login.clone()
                } else {
                    author.name.clone()
                };
                let author = Author {
                    name,
                    email: author.email.clone(),
                    url: author.url.clone(),
                };
                (login.clone(), author)
            })
            .collect(),
    }
}

/// Parse an entry id given on the command line.
pub(crate) fn parse_id(raw: &str) -> Result<EntryId, CliError> {
    Ok(EntryId::new(raw.trim_matches('/'))?)
}
