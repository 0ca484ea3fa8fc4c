//! `hobix list` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::project::{Project, ProjectArgs};

/// Arguments for the list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Only list entries under this category (e.g. `notes`).
    #[arg(default_value = "")]
    prefix: String,

    /// Skip entries in nested categories.
    #[arg(long)]
    flat: bool,
}

impl ListArgs {
    /// Execute the list command.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry store cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let project = Project::open(self.project.load(None)?)?;
        let prefix = self.prefix.trim_matches('/');

        let entries = project.storage().list(prefix, !self.flat)?;
        if entries.is_empty() {
            output.warning("No entries.");
            return Ok(());
        }
        for entry in &entries {
            output.line(
                &entry.created.format("%Y-%m-%d %H:%M").to_string(),
                &format!("{}  {}", entry.id, entry.title),
            );
        }
        Ok(())
    }
}
