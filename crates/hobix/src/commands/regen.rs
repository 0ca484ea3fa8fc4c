//! `hobix regen` command implementation.

use std::sync::Arc;

use clap::Args;
use hobix_site::{ChangeScope, FsSink, MemorySink, PassReport, RegenError};

use super::report_pass;
use crate::error::CliError;
use crate::output::Output;
use crate::project::{Project, ProjectArgs};

/// Arguments for the regen command.
#[derive(Args)]
pub(crate) struct RegenArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Render in memory and list the pages without writing or publishing.
    #[arg(long)]
    dry_run: bool,

    /// Render pages one at a time.
    #[arg(long)]
    no_parallel: bool,
}

impl RegenArgs {
    /// Execute the regen command.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass fails or is incomplete.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.project.load(self.no_parallel.then_some(false))?;

        if self.dry_run {
            output.highlight("[DRY RUN] Nothing is written or published.");
            let (sink, result) = dry_run(Project::open_dry_run(config)?);
            for (path, bytes) in sink.snapshot() {
                output.line(&format!("{:>8}", bytes.len()), &path);
            }
            return report_pass(&output, result);
        }

        let htdocs = config.paths_resolved.htdocs_dir.clone();
        output.info(&format!("Output: {}", htdocs.display()));
        let project = Project::open(config)?;
        let mut regenerator = project.into_regenerator(Arc::new(FsSink::new(htdocs)));
        report_pass(&output, regenerator.regenerate(&ChangeScope::Full))
    }
}

/// Run a full pass into memory.
fn dry_run(project: Project) -> (MemorySink, Result<PassReport, RegenError>) {
    let sink = MemorySink::new();
    let mut regenerator = project.into_regenerator(Arc::new(sink.clone()));
    let result = regenerator.regenerate(&ChangeScope::Full);
    (sink, result)
}
