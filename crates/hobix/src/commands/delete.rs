//! `hobix delete` command implementation.

use clap::Args;
use hobix_site::ChangeScope;

use super::upgen::update_pass;
use crate::error::CliError;
use crate::output::Output;
use crate::project::{Project, ProjectArgs, parse_id};

/// Arguments for the delete command.
#[derive(Args)]
pub(crate) struct DeleteArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Id of the entry to delete.
    id: String,

    /// Do not regenerate affected pages afterwards.
    #[arg(long)]
    no_upgen: bool,
}

impl DeleteArgs {
    /// Execute the delete command.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be removed or the pass fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let id = parse_id(&self.id)?;
        let project = Project::open(self.project.load(None)?)?;

        project.storage().delete(&id)?;
        output.success(&format!("Deleted {id}"));

        if self.no_upgen {
            return Ok(());
        }
        update_pass(&output, project, &ChangeScope::Update(id))
    }
}
