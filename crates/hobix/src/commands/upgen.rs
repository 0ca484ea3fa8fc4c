//! `hobix upgen` command implementation.

use std::sync::Arc;

use clap::Args;
use hobix_site::{ChangeScope, FsSink};

use super::report_pass;
use crate::error::CliError;
use crate::output::Output;
use crate::project::{Project, ProjectArgs, parse_id};

/// Arguments for the upgen command.
#[derive(Args)]
pub(crate) struct UpgenArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Id of the entry that changed (e.g. `notes/first-post`).
    id: String,
}

impl UpgenArgs {
    /// Execute the upgen command.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the pass fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let id = parse_id(&self.id)?;
        let project = Project::open(self.project.load(None)?)?;
        update_pass(&output, project, &ChangeScope::Update(id))
    }
}

/// Run a pass into the configured htdocs directory.
pub(crate) fn update_pass(
    output: &Output,
    project: Project,
    scope: &ChangeScope,
) -> Result<(), CliError> {
    let sink = FsSink::new(project.config().paths_resolved.htdocs_dir.clone());
    let mut regenerator = project.into_regenerator(Arc::new(sink));
    report_pass(output, regenerator.regenerate(scope))
}
