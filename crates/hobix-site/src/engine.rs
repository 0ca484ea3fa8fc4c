//! Regeneration passes.
//!
//! A pass resolves templates, lists entries, maps them to pages, renders the
//! affected pages and, once every render has finished, notifies publish
//! plugins of the pages that were written.
//!
//! A template without an output plugin is reported once and its pages are
//! skipped. Render and write errors, including a panicking plugin, are
//! collected per page. In both cases the pass carries on. Failing to read the
//! template tree or list entries aborts the pass before anything is written.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use hobix_plugin::{
    OutputPlugin, PageContext, PluginRegistry, PublishEvent, RenderError, WeblogInfo,
};
use hobix_storage::Storage;
use rayon::prelude::*;

use crate::dispatch::dispatch;
use crate::manifest::{Manifest, PageRecord};
use crate::mapper::{ChangeScope, OutputMapper, PageDescriptor, select};
use crate::report::{PageError, PageFailure, PassReport, RegenError, TemplateFailure, WrittenPage};
use crate::sink::SiteSink;
use crate::template::TemplateSource;

/// Regenerates a site from a store, a template tree and registered plugins.
///
/// `regenerate` takes `&mut self`, so passes over one engine never overlap.
pub struct Regenerator {
    storage: Arc<dyn Storage>,
    templates: Box<dyn TemplateSource>,
    registry: PluginRegistry,
    sink: Arc<dyn SiteSink>,
    weblog: Arc<WeblogInfo>,
    mapper: OutputMapper,
    manifest: Option<Manifest>,
    manifest_path: Option<PathBuf>,
    parallel: bool,
}

impl Regenerator {
    pub fn new(
        storage: Arc<dyn Storage>,
        templates: Box<dyn TemplateSource>,
        registry: PluginRegistry,
        sink: Arc<dyn SiteSink>,
        weblog: Arc<WeblogInfo>,
    ) -> Self {
        Self {
            storage,
            templates,
            registry,
            sink,
            weblog,
            mapper: OutputMapper::default(),
            manifest: None,
            manifest_path: None,
            parallel: true,
        }
    }

    /// Persist the page manifest at `path`, loading the previous one if present.
    #[must_use]
    pub fn with_manifest_path(mut self, path: PathBuf) -> Self {
        self.manifest = Manifest::load(&path);
        self.manifest_path = Some(path);
        self
    }

    #[must_use]
    pub fn with_mapper(mut self, mapper: OutputMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Render pages and dispatch notifications on the rayon pool (default on).
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Manifest of the last pass, if any.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Run one pass.
    ///
    /// # Errors
    ///
    /// - [`RegenError::Templates`] / [`RegenError::Storage`]: nothing rendered
    /// - [`RegenError::Incomplete`]: a template had no output plugin, or some
    ///   pages or notifications failed; the report lists them, and everything
    ///   else was written and dispatched
    pub fn regenerate(&mut self, scope: &ChangeScope) -> Result<PassReport, RegenError> {
        let templates = self.templates.templates()?;
        let entries = self.storage.list("", true).map_err(RegenError::Storage)?;

        let all = self.mapper.pages(&templates, &entries);
        let mapped: Vec<String> = all.iter().map(|page| page.page_id.clone()).collect();
        let pages = select(all, scope, self.manifest.as_ref());
        tracing::debug!(%scope, mapped = mapped.len(), selected = pages.len(), "Mapped pages");

        // Plugins are resolved once per template, up front: the registry also
        // owns publish plugins, which are not shareable across render workers.
        let mut resolved: HashMap<&str, &dyn OutputPlugin> = HashMap::new();
        let mut template_failures = Vec::new();
        for template in &templates {
            if resolved.contains_key(template.path.as_str())
                || template_failures
                    .iter()
                    .any(|failure: &TemplateFailure| failure.template == template.path)
            {
                continue;
            }
            match self.registry.output_for(&template.extension, &template.path) {
                Ok(plugin) => {
                    resolved.insert(&template.path, plugin);
                }
                Err(error) => {
                    let skipped: Vec<String> = pages
                        .iter()
                        .filter(|page| page.template.path == template.path)
                        .map(|page| page.page_id.clone())
                        .collect();
                    tracing::warn!(template = %template.path, pages = skipped.len(), %error, "No output plugin");
                    template_failures.push(TemplateFailure {
                        template: template.path.clone(),
                        pages: skipped,
                        error,
                    });
                }
            }
        }
        let jobs: Vec<RenderJob<'_>> = pages
            .iter()
            .filter_map(|page| {
                let plugin = *resolved.get(page.template.path.as_str())?;
                Some(RenderJob { page, plugin })
            })
            .collect();

        let weblog = self.weblog.as_ref();
        let sink = self.sink.as_ref();
        let results: Vec<Result<usize, PageError>> = if self.parallel {
            jobs.par_iter()
                .map(|job| render_page(weblog, sink, job))
                .collect()
        } else {
            jobs.iter()
                .map(|job| render_page(weblog, sink, job))
                .collect()
        };

        let mut report = PassReport::new(scope.clone(), mapped.len());
        report.template_failures = template_failures;
        let manifest = self.manifest.get_or_insert_with(Manifest::default);
        for (job, result) in jobs.iter().zip(results) {
            let page = job.page;
            match result {
                Ok(bytes) => {
                    manifest.record(
                        page.page_id.clone(),
                        PageRecord {
                            template: page.template.path.clone(),
                            category: page.category(),
                            entries: page.entry_ids(),
                        },
                    );
                    report.written.push(WrittenPage {
                        page_id: page.page_id.clone(),
                        category: page.category(),
                        template: page.template.path.clone(),
                        bytes,
                    });
                }
                Err(error) => {
                    tracing::warn!(page = %page.page_id, template = %page.template.path, %error, "Page failed");
                    report.page_failures.push(PageFailure {
                        page_id: page.page_id.clone(),
                        template: page.template.path.clone(),
                        error,
                    });
                }
            }
        }
        drop(jobs);
        report.pruned = manifest.prune(mapped.iter().map(String::as_str));
        if let Some(path) = &self.manifest_path
            && let Err(e) = manifest.save(path)
        {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save page manifest");
        }

        let events: Vec<PublishEvent> = report
            .written
            .iter()
            .map(|page| PublishEvent {
                category: page.category,
                page_id: page.page_id.clone(),
            })
            .collect();
        let outcome = dispatch(self.registry.publishers_mut(), &events, self.parallel);
        report.notified = outcome.notified;
        report.publish_failures = outcome.failures;

        tracing::info!("{report}");
        if report.is_complete() {
            Ok(report)
        } else {
            Err(RegenError::Incomplete(Box::new(report)))
        }
    }
}

/// A page paired with the output plugin its template resolved to.
struct RenderJob<'a> {
    page: &'a PageDescriptor<'a>,
    plugin: &'a dyn OutputPlugin,
}

/// Render and write one page. A panicking plugin fails only this page.
fn render_page(
    weblog: &WeblogInfo,
    sink: &dyn SiteSink,
    job: &RenderJob<'_>,
) -> Result<usize, PageError> {
    let page = job.page;
    let ctx = PageContext {
        weblog,
        template: page.template,
        page_id: &page.page_id,
        key: &page.key,
        entries: &page.entries,
    };
    let bytes = panic::catch_unwind(AssertUnwindSafe(|| job.plugin.render(&ctx)))
        .unwrap_or_else(|payload| Err(panicked(job.plugin.name(), payload.as_ref())))?;
    sink.write(&page.page_id, &bytes)?;
    tracing::debug!(page = %page.page_id, plugin = job.plugin.name(), bytes = bytes.len(), "Rendered page");
    Ok(bytes.len())
}

fn panicked(plugin: &str, payload: &(dyn Any + Send)) -> RenderError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    RenderError::Other(format!("'{plugin}' plugin panicked: {message}").into())
}
