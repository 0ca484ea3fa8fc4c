//! Editing entries in an external editor.

use std::io::Write;
use std::process::Command;

use hobix_storage::{Entry, EntryFields};

use crate::error::CliError;

/// Editor used when `$EDITOR` is unset.
const DEFAULT_EDITOR: &str = "vi";

/// Result of an editing session.
#[derive(Debug)]
pub(crate) enum EditOutcome {
    /// The file was saved; holds the parsed entry.
    Changed(Entry),
    /// The editor exited without touching the file.
    Unchanged,
}

/// Editor command line from `$EDITOR`, split on whitespace.
pub(crate) fn editor_from_env() -> Vec<String> {
    let raw = std::env::var("EDITOR").unwrap_or_default();
    let words: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
    if words.is_empty() {
        vec![DEFAULT_EDITOR.to_owned()]
    } else {
        words
    }
}

/// Open `entry` as YAML in `editor` and read it back.
///
/// The entry keeps its id. A file whose modification time did not change is
/// treated as a cancelled edit.
pub(crate) fn edit(entry: &Entry, editor: &[String]) -> Result<EditOutcome, CliError> {
    let (program, args) = editor
        .split_first()
        .ok_or_else(|| CliError::Editor("no editor configured".to_owned()))?;

    let mut file = tempfile::Builder::new()
        .prefix("hobix-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(serde_yaml::to_string(&entry.to_fields())?.as_bytes())?;
    file.as_file().sync_all()?;
    let before = file.as_file().metadata()?.modified()?;

    tracing::debug!(editor = %program, path = %file.path().display(), "Launching editor");
    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .map_err(|e| CliError::Editor(format!("failed to launch '{program}': {e}")))?;
    if !status.success() {
        return Err(CliError::Editor(format!("'{program}' exited with {status}")));
    }

    // Editors often replace the file, so stat the path rather than the handle
    let after = std::fs::metadata(file.path())?.modified()?;
    if after == before {
        return Ok(EditOutcome::Unchanged);
    }

    let content = std::fs::read_to_string(file.path())?;
    let fields: EntryFields = serde_yaml::from_str(&content)?;
    Ok(EditOutcome::Changed(
        fields.into_entry(entry.id.clone(), entry.created),
    ))
}
