//! Compilation driver
//!
//! Runs one source buffer through the whole frontend: scan, parse (binding top-level declarations), then one
//! checker job per declaration on the [`JobSystem`]. Diagnostics go to the caller's sink as they are produced.
//!
//! ## Notes
//!
//! - A declaration that redeclares an earlier name is never checked: it already carries the duplicate
//!   error, so its entity is failed up front and anything that refers to the name sees an invalid declaration.
//! - Top-level items that did not parse as declarations are not scheduled.

use thiserror::Error;

use crate::frontend::ast::Program;
use crate::frontend::diagnostics::{Diagnostic, DiagnosticSink};
use crate::frontend::symbols::{EntityId, SymbolTable};
use crate::frontend::{parser, scanner};
use crate::jobs::{JobConfig, JobError, JobReport, JobSystem};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("invalid job configuration: {0}")]
    Jobs(#[from] JobError),
}

/// Compilation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    pub jobs: JobConfig,
    /// Forward warnings to the sink; errors are always forwarded.
    pub report_warnings: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            jobs: JobConfig::default(),
            report_warnings: true,
        }
    }
}

impl CompileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the job system configuration
    pub fn with_jobs(mut self, jobs: JobConfig) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable or disable warnings
    pub fn with_report_warnings(mut self, report_warnings: bool) -> Self {
        self.report_warnings = report_warnings;
        self
    }
}

/// Everything the frontend produced for one source buffer.
///
/// A redeclaration takes over the global binding, so after `x :: 1` and `x :: 2` the first `x` is emitted but
/// no longer reachable by lookup: `y :: x` sees the failed redeclaration. Emitted names are therefore not
/// necessarily resolvable names.
#[derive(Debug)]
pub struct Compilation {
    pub program: Program,
    pub symbols: SymbolTable,
    pub report: JobReport,
}

impl Compilation {
    /// Names of emitted entities, dependencies first.
    pub fn emitted_names(&self) -> Vec<String> {
        self.names(&self.report.emitted)
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.names(&self.report.failed)
    }

    /// The `main :: fn(...) { ... }` entity, if it was emitted.
    pub fn entry_point(&self) -> Option<EntityId> {
        self.report.entry_point
    }

    fn names(&self, ids: &[EntityId]) -> Vec<String> {
        ids.iter().map(|&id| self.symbols.entity(id).name.clone()).collect()
    }
}

/// Sink adapter that drops warnings when they are disabled.
struct WarningFilter<'a> {
    inner: &'a dyn DiagnosticSink,
    report_warnings: bool,
}

impl DiagnosticSink for WarningFilter<'_> {
    fn report(&self, diagnostic: Diagnostic) {
        if self.report_warnings || diagnostic.is_error() {
            self.inner.report(diagnostic);
        }
    }
}

/// Compile one source buffer.
///
/// ## Errors
///
/// Only configuration problems are errors; problems in the source are reported to `sink`.
#[tracing::instrument(skip_all, fields(source_len = source.len(), workers = config.jobs.workers))]
pub fn compile(source: &[u8], config: &CompileConfig, sink: &dyn DiagnosticSink) -> Result<Compilation, DriverError> {
    config.jobs.validate()?;
    let sink = WarningFilter {
        inner: sink,
        report_warnings: config.report_warnings,
    };

    let symbols = SymbolTable::new();
    let tokens = scanner::scan_all(source, &sink);
    let program = parser::parse(source, &tokens, &symbols, &sink);

    let report = {
        let system = JobSystem::new(&symbols, &program, &sink, config.jobs.clone())?;
        for (id, decl) in program.decls() {
            if decl.redeclares.is_some() {
                system.reject(decl.entity);
            } else {
                system.submit_decl(id)?;
            }
        }
        system.run()
    };

    tracing::info!(
        items = program.items.len(),
        emitted = report.emitted.len(),
        failed = report.failed.len(),
        "compiled"
    );
    Ok(Compilation {
        program,
        symbols,
        report,
    })
}
