//! Configuration management for Hobix.
//!
//! Parses `hobix.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `weblog.link`
//! - every string inside a `[[publish]]` table

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override entries directory.
    pub entries_dir: Option<PathBuf>,
    /// Override template skeleton directory.
    pub skel_dir: Option<PathBuf>,
    /// Override site output directory.
    pub htdocs_dir: Option<PathBuf>,
    /// Override parallel rendering flag.
    pub parallel: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "hobix.toml";

/// Default number of entries on an index page.
pub const DEFAULT_INDEX_SIZE: usize = 10;

/// Default number of entries in a feed.
pub const DEFAULT_FEED_SIZE: usize = 15;

/// Output plugins enabled when `[output]` does not list any.
const DEFAULT_OUTPUT_PLUGINS: [&str; 3] = ["jinja", "rss", "atom"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Weblog description.
    pub weblog: WeblogConfig,
    /// Directory layout (paths are relative strings from TOML).
    paths: PathsConfigRaw,
    /// Page window sizes.
    pub pages: PagesConfig,
    /// Entry store selection.
    pub storage: StorageConfig,
    /// Enabled output plugins.
    pub output: OutputConfig,
    /// Publish plugin instances, in notification order.
    pub publish: Vec<PublishConfig>,
    /// Known authors keyed by login.
    pub authors: BTreeMap<String, AuthorConfig>,
    /// Editing workflow.
    pub editor: EditorConfig,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths_resolved: PathsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Weblog description shared with every plugin.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WeblogConfig {
    /// Weblog title.
    pub title: String,
    /// Public base URL of the site.
    pub link: String,
    /// Short description.
    pub tagline: String,
}

impl Default for WeblogConfig {
    fn default() -> Self {
        Self {
            title: "Hobix Weblog".to_owned(),
            link: "http://localhost/".to_owned(),
            tagline: String::new(),
        }
    }
}

/// Raw path configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PathsConfigRaw {
    entries: Option<String>,
    skel: Option<String>,
    htdocs: Option<String>,
}

/// Resolved directory layout with absolute paths.
#[derive(Debug, Default)]
pub struct PathsConfig {
    /// Entry store root.
    pub entries_dir: PathBuf,
    /// Template tree root.
    pub skel_dir: PathBuf,
    /// Rendered site root.
    pub htdocs_dir: PathBuf,
    /// Project directory for hobix data (.hobix/).
    pub project_dir: PathBuf,
}

impl PathsConfig {
    /// Page manifest path (.hobix/pages.json).
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join("pages.json")
    }
}

/// Page window configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Entries on an index page.
    pub index_size: usize,
    /// Entries in a feed.
    pub feed_size: usize,
    /// Per-template window overrides keyed by template path relative to the
    /// skeleton directory (e.g. `"a/index.html.jinja" = 5`).
    pub windows: BTreeMap<String, usize>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            index_size: DEFAULT_INDEX_SIZE,
            feed_size: DEFAULT_FEED_SIZE,
            windows: BTreeMap::new(),
        }
    }
}

/// Entry store selection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Registered storage plugin name.
    pub plugin: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            plugin: "filesys".to_owned(),
        }
    }
}

/// Enabled output plugins.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output plugin names, in registration order.
    pub plugins: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plugins: DEFAULT_OUTPUT_PLUGINS.map(str::to_owned).to_vec(),
        }
    }
}

/// One publish plugin instance.
#[derive(Debug, Deserialize)]
pub struct PublishConfig {
    /// Registered publish plugin name.
    pub plugin: String,
    /// Remaining keys, handed to the plugin untouched.
    #[serde(flatten)]
    pub settings: toml::Table,
}

impl PublishConfig {
    /// Plugin settings as a JSON value.
    #[must_use]
    pub fn settings_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.settings).unwrap_or(serde_json::Value::Null)
    }
}

/// Author details.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AuthorConfig {
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: Option<String>,
    /// Home page.
    pub url: Option<String>,
}

/// Editing workflow configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Run an update pass after `hobix post` saves an entry.
    pub post_upgen: bool,
    /// Render pages on a thread pool.
    pub parallel: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            post_upgen: true,
            parallel: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`weblog.link`").
        field: String,
        /// Error message (e.g., "${`BLOG_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a window size to be positive.
fn require_positive(value: usize, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `hobix.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(entries_dir) = &settings.entries_dir {
            self.paths_resolved.entries_dir.clone_from(entries_dir);
        }
        if let Some(skel_dir) = &settings.skel_dir {
            self.paths_resolved.skel_dir.clone_from(skel_dir);
        }
        if let Some(htdocs_dir) = &settings.htdocs_dir {
            self.paths_resolved.htdocs_dir.clone_from(htdocs_dir);
        }
        if let Some(parallel) = settings.parallel {
            self.editor.parallel = parallel;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            weblog: WeblogConfig::default(),
            paths: PathsConfigRaw::default(),
            pages: PagesConfig::default(),
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
            publish: Vec::new(),
            authors: BTreeMap::new(),
            editor: EditorConfig::default(),
            paths_resolved: PathsConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before validation
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.weblog.title, "weblog.title")?;
        require_http_url(&self.weblog.link, "weblog.link")?;

        require_positive(self.pages.index_size, "pages.index_size")?;
        require_positive(self.pages.feed_size, "pages.feed_size")?;
        for (template, size) in &self.pages.windows {
            require_positive(*size, &format!("pages.windows.\"{template}\""))?;
        }

        require_non_empty(&self.storage.plugin, "storage.plugin")?;
        for (idx, publish) in self.publish.iter().enumerate() {
            require_non_empty(&publish.plugin, &format!("publish[{idx}].plugin"))?;
        }

        Ok(())
    }

    /// Author display name for a login, falling back to the login itself.
    #[must_use]
    pub fn author_name<'a>(&'a self, login: &'a str) -> &'a str {
        self.authors
            .get(login)
            .map_or(login, |author| author.name.as_str())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.weblog.link = expand::expand_env(&self.weblog.link, "weblog.link")?;

        for (idx, publish) in self.publish.iter_mut().enumerate() {
            let field = format!("publish[{idx}]");
            let mut settings = toml::Value::Table(std::mem::take(&mut publish.settings));
            expand::expand_toml(&mut settings, &field)?;
            if let toml::Value::Table(table) = settings {
                publish.settings = table;
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths_resolved = PathsConfig {
            entries_dir: resolve(self.paths.entries.as_deref(), "entries"),
            skel_dir: resolve(self.paths.skel.as_deref(), "skel"),
            htdocs_dir: resolve(self.paths.htdocs.as_deref(), "htdocs"),
            project_dir: config_dir.join(".hobix"),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/blog"));
        assert_eq!(config.weblog.title, "Hobix Weblog");
        assert_eq!(config.pages.index_size, 10);
        assert_eq!(config.pages.feed_size, 15);
        assert_eq!(config.storage.plugin, "filesys");
        assert_eq!(config.output.plugins, vec!["jinja", "rss", "atom"]);
        assert!(config.publish.is_empty());
        assert!(config.editor.post_upgen);
        assert!(config.editor.parallel);
        assert_eq!(
            config.paths_resolved.entries_dir,
            PathBuf::from("/blog/entries")
        );
        assert_eq!(config.paths_resolved.skel_dir, PathBuf::from("/blog/skel"));
        assert_eq!(
            config.paths_resolved.htdocs_dir,
            PathBuf::from("/blog/htdocs")
        );
        assert_eq!(
            config.paths_resolved.manifest_path(),
            PathBuf::from("/blog/.hobix/pages.json")
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pages.index_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[weblog]
title = "Why's Weblog"
link = "https://example.org/"
tagline = "pathetic weddings"

[paths]
entries = "data/entries"

[pages]
index_size = 5
windows = { "a/index.html.jinja" = 2 }

[output]
plugins = ["jinja"]

[[publish]]
plugin = "ping"
urls = ["http://rpc.example.com/RPC2"]

[[publish]]
plugin = "command"
command = "rsync"
args = ["-a"]
watch = ["*"]

[authors.why]
name = "why the lucky stiff"
email = "why@example.org"

[editor]
post_upgen = false
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/site"));

        assert_eq!(config.weblog.title, "Why's Weblog");
        assert_eq!(config.weblog.tagline, "pathetic weddings");
        assert_eq!(
            config.paths_resolved.entries_dir,
            PathBuf::from("/site/data/entries")
        );
        assert_eq!(config.paths_resolved.skel_dir, PathBuf::from("/site/skel"));
        assert_eq!(config.pages.index_size, 5);
        assert_eq!(config.pages.feed_size, 15);
        assert_eq!(config.pages.windows.get("a/index.html.jinja"), Some(&2));
        assert_eq!(config.output.plugins, vec!["jinja"]);
        assert_eq!(config.publish.len(), 2);
        assert_eq!(config.publish[0].plugin, "ping");
        assert_eq!(
            config.publish[1].settings_json(),
            serde_json::json!({"command": "rsync", "args": ["-a"], "watch": ["*"]})
        );
        assert_eq!(config.author_name("why"), "why the lucky stiff");
        assert_eq!(config.author_name("unknown"), "unknown");
        assert!(!config.editor.post_upgen);
        assert!(config.editor.parallel);
    }

    #[test]
    fn test_publish_settings_exclude_plugin_key() {
        let toml = r#"
[[publish]]
plugin = "ping"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.publish[0].settings_json(), serde_json::json!({}));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.apply_cli_settings(&CliSettings {
            htdocs_dir: Some(PathBuf::from("/srv/www")),
            parallel: Some(false),
            ..CliSettings::default()
        });

        assert_eq!(config.paths_resolved.htdocs_dir, PathBuf::from("/srv/www"));
        assert_eq!(
            config.paths_resolved.entries_dir,
            PathBuf::from("/blog/entries")
        );
        assert!(!config.editor.parallel);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.paths_resolved.skel_dir, PathBuf::from("/blog/skel"));
        assert!(config.editor.parallel);
    }

    #[test]
    fn test_expand_env_vars_link_and_publish() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("HOBIX_TEST_CFG_HOST", "blog.example.net");
            std::env::set_var("HOBIX_TEST_CFG_TOKEN", "s3cret");
        }

        let toml = r#"
[weblog]
link = "https://${HOBIX_TEST_CFG_HOST}/"

[[publish]]
plugin = "command"
command = "upload"
args = ["--token", "${HOBIX_TEST_CFG_TOKEN}", "${HOBIX_TEST_CFG_MODE:-fast}"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.weblog.link, "https://blog.example.net/");
        assert_eq!(
            config.publish[0].settings_json()["args"],
            serde_json::json!(["--token", "s3cret", "fast"])
        );

        unsafe {
            std::env::remove_var("HOBIX_TEST_CFG_HOST");
            std::env::remove_var("HOBIX_TEST_CFG_TOKEN");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("HOBIX_TEST_CFG_MISSING");
        }

        let toml = r#"
[[publish]]
plugin = "ping"
urls = ["${HOBIX_TEST_CFG_MISSING}"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("HOBIX_TEST_CFG_MISSING"));
        assert!(err.to_string().contains("publish[0].urls[0]"));
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/blog"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_title() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.weblog.title = "  ".to_owned();
        assert_validation_error(&config, &["weblog.title", "empty"]);
    }

    #[test]
    fn test_validate_link_scheme() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.weblog.link = "ftp://example.org".to_owned();
        assert_validation_error(&config, &["weblog.link", "http://"]);
    }

    #[test]
    fn test_validate_zero_windows() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.pages.feed_size = 0;
        assert_validation_error(&config, &["pages.feed_size"]);

        let mut config = Config::default_with_base(Path::new("/blog"));
        config.pages.windows.insert("index.html.jinja".to_owned(), 0);
        assert_validation_error(&config, &["index.html.jinja"]);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/hobix.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hobix.toml");
        std::fs::write(
            &path,
            "[weblog]\ntitle = \"T\"\nlink = \"http://t.example/\"\n[paths]\nhtdocs = \"public\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.paths_resolved.htdocs_dir, dir.path().join("public"));
        assert_eq!(config.paths_resolved.project_dir, dir.path().join(".hobix"));
    }

    #[test]
    fn test_load_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hobix.toml");
        std::fs::write(&path, "[pages]\nindex_size = 0\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
