//! Run an external command for each written page.
//!
//! The page path is appended to the configured arguments, and the command
//! sees `HOBIX_PAGE`, `HOBIX_CATEGORY` and `HOBIX_URL` in its environment.
//! Useful for upload scripts:
//!
//! ```toml
//! [[publish]]
//! plugin = "command"
//! command = "scp"
//! args = ["-q"]
//! watch = ["*"]
//! ```

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use hobix_plugin::{
    PluginError, PublishError, PublishEvent, PublishPlugin, WatchSet, WeblogInfo,
};
use serde::Deserialize;

/// Plugin name.
pub const NAME: &str = "command";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandSettings {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    cwd: Option<PathBuf>,
    #[serde(default = "default_watch")]
    watch: Vec<String>,
}

fn default_watch() -> Vec<String> {
    vec!["*".to_owned()]
}

/// Runs a command per written page.
#[derive(Debug)]
pub struct CommandPublisher {
    weblog: Arc<WeblogInfo>,
    command: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    watch: WatchSet,
}

impl CommandPublisher {
    /// Construct from the plugin's configuration table.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidConfig`] if `command` is missing or empty,
    /// a field is unknown, or a watch key is invalid.
    pub fn from_settings(
        weblog: Arc<WeblogInfo>,
        settings: &serde_json::Value,
    ) -> Result<Self, PluginError> {
        let invalid = |message: String| PluginError::InvalidConfig {
            plugin: NAME.to_owned(),
            message,
        };
        let settings: CommandSettings =
            serde_json::from_value(settings.clone()).map_err(|e| invalid(e.to_string()))?;
        if settings.command.trim().is_empty() {
            return Err(invalid("command must not be empty".to_owned()));
        }

        Ok(Self {
            weblog,
            command: settings.command,
            args: settings.args,
            cwd: settings.cwd,
            watch: WatchSet::parse(NAME, &settings.watch)?,
        })
    }
}

pub(crate) fn construct(
    weblog: Arc<WeblogInfo>,
    settings: &serde_json::Value,
) -> Result<Box<dyn PublishPlugin>, PluginError> {
    Ok(Box::new(CommandPublisher::from_settings(weblog, settings)?))
}

impl PublishPlugin for CommandPublisher {
    fn name(&self) -> &str {
        NAME
    }

    fn watch(&self) -> &WatchSet {
        &self.watch
    }

    fn publish(&mut self, event: &PublishEvent) -> Result<(), PublishError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(&event.page_id)
            .env("HOBIX_PAGE", &event.page_id)
            .env("HOBIX_CATEGORY", event.category.as_str())
            .env("HOBIX_URL", self.weblog.page_url(&event.page_id))
            .stdin(Stdio::null());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(command = %self.command, page = %event.page_id, "Running publish command");
        let output = cmd.output().map_err(|e| PublishError::Command {
            command: self.command.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => output.status.to_string(),
                stderr => format!("{}: {stderr}", output.status),
            };
            return Err(PublishError::Command {
                command: self.command.clone(),
                message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hobix_plugin::PageCategory;
    use pretty_assertions::assert_eq;

    use super::*;

    fn weblog() -> Arc<WeblogInfo> {
        Arc::new(WeblogInfo {
            link: "https://example.org/".to_owned(),
            ..WeblogInfo::default()
        })
    }

    fn event() -> PublishEvent {
        PublishEvent {
            category: PageCategory::Entry,
            page_id: "a/1.html".to_owned(),
        }
    }

    fn publisher(settings: serde_json::Value) -> CommandPublisher {
        CommandPublisher::from_settings(weblog(), &settings).unwrap()
    }

    #[test]
    fn test_settings_defaults() {
        let plugin = publisher(serde_json::json!({ "command": "true" }));
        assert_eq!(plugin.args, Vec::<String>::new());
        assert_eq!(plugin.cwd, None);
        assert!(plugin.watch().matches(&event()));
    }

    #[test]
    fn test_settings_errors() {
        let err = CommandPublisher::from_settings(weblog(), &serde_json::json!({}))
            .err()
            .unwrap();
        assert!(matches!(err, PluginError::InvalidConfig { .. }));

        let err = CommandPublisher::from_settings(weblog(), &serde_json::json!({ "command": " " }))
            .err()
            .unwrap();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_success() {
        let mut plugin = publisher(serde_json::json!({ "command": "true" }));
        plugin.publish(&event()).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_failure_reports_stderr() {
        let mut plugin = publisher(serde_json::json!({
            "command": "sh",
            "args": ["-c", "echo \"cannot upload $1\" >&2; exit 3", "upload"],
        }));
        let err = plugin.publish(&event()).unwrap_err();
        let PublishError::Command { command, message } = err else {
            panic!("expected command error");
        };
        assert_eq!(command, "sh");
        assert!(message.contains("cannot upload a/1.html"), "{message}");
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_environment() {
        let mut plugin = publisher(serde_json::json!({
            "command": "sh",
            "args": [
                "-c",
                "test \"$HOBIX_PAGE\" = a/1.html && test \"$HOBIX_CATEGORY\" = entry && test \"$HOBIX_URL\" = https://example.org/a/1.html",
            ],
        }));
        plugin.publish(&event()).unwrap();
    }

    #[test]
    fn test_missing_program() {
        let mut plugin = publisher(serde_json::json!({ "command": "hobix-no-such-program" }));
        let err = plugin.publish(&event()).unwrap_err();
        assert!(matches!(err, PublishError::Command { .. }));
    }
}
