//! CLI command implementations.

pub(crate) mod delete;
pub(crate) mod list;
pub(crate) mod post;
pub(crate) mod regen;
pub(crate) mod upgen;

pub(crate) use delete::DeleteArgs;
pub(crate) use list::ListArgs;
pub(crate) use post::PostArgs;
pub(crate) use regen::RegenArgs;
pub(crate) use upgen::UpgenArgs;

use hobix_site::{PassReport, RegenError};

use crate::error::CliError;
use crate::output::Output;

/// Print the outcome of a pass, listing every failure.
///
/// An incomplete pass is still an error once it has been reported.
pub(crate) fn report_pass(
    output: &Output,
    result: Result<PassReport, RegenError>,
) -> Result<(), CliError> {
    match result {
        Ok(report) => {
            output.success(&format!(
                "Regenerated {} of {} pages ({} notification(s))",
                report.written.len(),
                report.pages_mapped,
                report.notified
            ));
            print_pruned(output, &report);
            Ok(())
        }
        Err(RegenError::Incomplete(report)) => {
            output.warning(&format!(
                "Regenerated {} of {} pages",
                report.written.len(),
                report.pages_mapped
            ));
            for failure in &report.template_failures {
                output.error(&format!("  {}: {}", failure.template, failure.error));
                for page in &failure.pages {
                    output.error(&format!("    skipped {page}"));
                }
            }
            for failure in &report.page_failures {
                output.error(&format!(
                    "  {} ({}): {}",
                    failure.page_id, failure.template, failure.error
                ));
            }
            for failure in &report.publish_failures {
                output.error(&format!(
                    "  {} -> {}: {}",
                    failure.page_id, failure.plugin, failure.error
                ));
            }
            print_pruned(output, &report);
            Err(RegenError::Incomplete(report).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_pruned(output: &Output, report: &PassReport) {
    if !report.pruned.is_empty() {
        output.info(&format!(
            "No longer generated (left on disk): {}",
            report.pruned.join(", ")
        ));
    }
}
