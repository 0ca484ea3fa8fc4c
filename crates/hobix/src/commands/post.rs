//! `hobix post` command implementation.

use chrono::Utc;
use clap::Args;
use hobix_site::ChangeScope;
use hobix_storage::Entry;

use super::upgen::update_pass;
use crate::editor::{self, EditOutcome};
use crate::error::CliError;
use crate::output::Output;
use crate::project::{Project, ProjectArgs, parse_id};

/// Arguments for the post command.
#[derive(Args)]
pub(crate) struct PostArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Id of the entry to create or edit (e.g. `notes/first-post`).
    id: String,

    /// Do not regenerate affected pages after saving.
    #[arg(long)]
    no_upgen: bool,
}

impl PostArgs {
    /// Execute the post command.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails, the edited entry does not parse,
    /// or the entry cannot be saved.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let id = parse_id(&self.id)?;
        let project = Project::open(self.project.load(None)?)?;

        let entry = match project.storage().load(&id) {
            Ok(entry) => entry,
            Err(err) if err.is_not_found() => {
                output.info(&format!("New entry {id}"));
                let mut entry = Entry::new(id.clone(), Utc::now());
                entry.title = id.default_title();
                entry.author = project.default_author();
                entry
            }
            Err(err) => return Err(err.into()),
        };

        let entry = match editor::edit(&entry, &editor::editor_from_env())? {
            EditOutcome::Changed(entry) => entry,
            EditOutcome::Unchanged => {
                output.warning("Entry unchanged, nothing saved.");
                return Ok(());
            }
        };

        project.storage().save(&id, &entry)?;
        output.success(&format!("Saved {id}"));

        if self.no_upgen || !project.config().editor.post_upgen {
            return Ok(());
        }
        update_pass(&output, project, &ChangeScope::Update(id))
    }
}
