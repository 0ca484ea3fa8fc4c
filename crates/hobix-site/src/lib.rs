//! Regeneration engine for the Hobix weblog engine.
//!
//! This crate provides:
//! - [`OutputMapper`]: templates and entries to pages, and the pages a change affects
//! - [`Regenerator`]: runs a regeneration pass and reports per-page outcomes
//! - [`dispatch`]: notifies publish plugins once per written page
//! - [`SkelDir`]: template tree loader
//! - [`FsSink`] and [`MemorySink`]: where rendered pages go
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hobix_site::{ChangeScope, FsSink, Regenerator, SkelDir};
//!
//! let mut engine = Regenerator::new(
//!     storage,
//!     Box::new(SkelDir::new("skel".into())),
//!     registry,
//!     Arc::new(FsSink::new("htdocs".into())),
//!     weblog,
//! );
//! let report = engine.regenerate(&ChangeScope::Full)?;
//! ```

mod dispatch;
mod engine;
mod manifest;
mod mapper;
mod report;
mod sink;
mod template;

pub use dispatch::{DispatchOutcome, dispatch};
pub use engine::Regenerator;
pub use manifest::{Manifest, PageRecord};
pub use mapper::{ChangeScope, OutputMapper, PageDescriptor, select};
pub use report::{
    PageError, PageFailure, PassReport, PublishFailure, RegenError, TemplateFailure, WrittenPage,
};
pub use sink::{FsSink, MemorySink, SinkError, SiteSink};
pub use template::{SkelDir, TemplateError, TemplateSource};
