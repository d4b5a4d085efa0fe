//! Job system for Kestrel
//!
//! Top-level declarations may refer to each other in any order. Each declaration gets a [`CheckerJob`]; a job
//! whose check depends on an entity that has not settled is suspended and retried later, and a resolved check
//! is followed by a [`CodeGenJob`] that emits the entity and wakes whoever was waiting on it.
//!
//! ## Notes
//!
//! - **Claims**: a checker job first claims its entity (`Unchecked → Checking(executor)`); retries of the same
//!   job re-enter with the same executor. Any other state means the job has nothing left to do.
//! - **Suspension**: see [`Suspension`]. Either way the wait-for edge is recorded, so cycles are reported once
//!   (`cyclic dependency: a -> b -> a`) and every member fails.
//! - **Failure**: an entity fails at most once, and only the job that failed it reports diagnostics for it.
//! - **Forward progress**: every checker job has at most `max_attempts` runs. Jobs still parked when the queue
//!   drains wait on something that will never settle; they are reported and failed.
//! - **Scheduling**: with one worker everything runs on the caller's thread; otherwise `workers` scoped threads
//!   share one [`WorkQueue`](queue::WorkQueue).
//!
//! ## Examples
//!
//! ```rust
//! use kestrel::frontend::diagnostics::Diagnostics;
//! use kestrel::frontend::symbols::SymbolTable;
//! use kestrel::frontend::{parser, scanner};
//! use kestrel::jobs::{JobConfig, JobSystem};
//!
//! let source = b"a :: b * 2\nb :: 21\n";
//! let sink = Diagnostics::new();
//! let symbols = SymbolTable::new();
//! let tokens = scanner::scan_all(source, &sink);
//! let program = parser::parse(source, &tokens, &symbols, &sink);
//!
//! let system = JobSystem::new(&symbols, &program, &sink, JobConfig::default()).unwrap();
//! for (id, _) in program.decls() {
//!     system.submit_decl(id).unwrap();
//! }
//! let report = system.run();
//! assert_eq!(report.emitted.len(), 2);
//! assert!(sink.is_empty());
//! ```

mod codegen;
mod config;
mod deps;
mod queue;

#[cfg(test)]
mod tests;

pub use codegen::{Emitter, StubEmitter};
pub use config::{DEFAULT_MAX_ATTEMPTS, JobConfig, Suspension};

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::frontend::ast::{Decl, DeclId, Program, TopLevel};
use crate::frontend::checker::{Checker, Outcome};
use crate::frontend::diagnostics::{Diagnostic, DiagnosticSink, errors};
use crate::frontend::symbols::{Claim, EntityId, EntityState, ExecutorId, SymbolTable};
use deps::{DependencyRegistry, Suspend};
use queue::WorkQueue;

/// Errors raised while setting up the job system
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("the job system needs at least one worker")]
    NoWorkers,

    #[error("max attempts must be at least 1")]
    NoAttempts,

    #[error("no top-level declaration with id {0:?}")]
    UnknownDecl(DeclId),
}

// ============================================================================
// Work units
// ============================================================================

/// Runs the checker over one top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerJob {
    pub decl: DeclId,
    pub entity: EntityId,
    /// Claims the entity; the same across retries.
    pub executor: ExecutorId,
    /// Checker runs so far.
    pub attempts: u32,
}

impl CheckerJob {
    pub fn new(decl: DeclId, entity: EntityId, executor: ExecutorId) -> Self {
        Self {
            decl,
            entity,
            executor,
            attempts: 0,
        }
    }
}

/// Emits a checked declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenJob {
    pub decl: DeclId,
    pub entity: EntityId,
    /// The declaration is the program entry point.
    pub entry_point: bool,
}

impl CodeGenJob {
    pub fn new(decl: DeclId, entity: EntityId) -> Self {
        Self {
            decl,
            entity,
            entry_point: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkUnit {
    Check(CheckerJob),
    CodeGen(CodeGenJob),
}

/// Summary of one [`JobSystem::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub checks_run: usize,
    pub suspensions: usize,
    /// Parked jobs re-enqueued because their dependency settled.
    pub wakeups: usize,
    /// Emitted entities; a dependency always comes before its dependents.
    pub emitted: Vec<EntityId>,
    pub failed: Vec<EntityId>,
    pub entry_point: Option<EntityId>,
}

#[derive(Debug, Default)]
struct Results {
    emitted: Vec<EntityId>,
    failed: Vec<EntityId>,
    entry_point: Option<EntityId>,
}

static STUB_EMITTER: StubEmitter = StubEmitter;

// ============================================================================
// Job system
// ============================================================================

/// Scheduler for checker and code generation jobs over one parsed program.
pub struct JobSystem<'a> {
    symbols: &'a SymbolTable,
    program: &'a Program,
    sink: &'a dyn DiagnosticSink,
    emitter: &'a dyn Emitter,
    config: JobConfig,
    queue: WorkQueue,
    deps: DependencyRegistry,
    next_executor: AtomicU32,
    checks_run: AtomicUsize,
    suspensions: AtomicUsize,
    wakeups: AtomicUsize,
    results: Mutex<Results>,
}

impl<'a> JobSystem<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        program: &'a Program,
        sink: &'a dyn DiagnosticSink,
        config: JobConfig,
    ) -> Result<Self, JobError> {
        config.validate()?;
        Ok(Self {
            symbols,
            program,
            sink,
            emitter: &STUB_EMITTER,
            config,
            queue: WorkQueue::new(),
            deps: DependencyRegistry::new(),
            next_executor: AtomicU32::new(0),
            checks_run: AtomicUsize::new(0),
            suspensions: AtomicUsize::new(0),
            wakeups: AtomicUsize::new(0),
            results: Mutex::new(Results::default()),
        })
    }

    /// Replace the default [`StubEmitter`].
    pub fn with_emitter(mut self, emitter: &'a dyn Emitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Enqueue a unit of work.
    pub fn submit(&self, unit: WorkUnit) -> Result<(), JobError> {
        let decl = match unit {
            WorkUnit::Check(job) => job.decl,
            WorkUnit::CodeGen(job) => job.decl,
        };
        self.decl(decl).ok_or(JobError::UnknownDecl(decl))?;
        self.queue.push(unit);
        Ok(())
    }

    /// Enqueue a checker job for the declaration `id` under a fresh executor.
    pub fn submit_decl(&self, id: DeclId) -> Result<(), JobError> {
        let decl = self.decl(id).ok_or(JobError::UnknownDecl(id))?;
        let executor = ExecutorId(self.next_executor.fetch_add(1, Ordering::Relaxed));
        self.queue.push(WorkUnit::Check(CheckerJob::new(id, decl.entity, executor)));
        Ok(())
    }

    /// Mark `entity` as failed without checking it (e.g. a redeclared name).
    pub fn reject(&self, entity: EntityId) {
        self.fail(entity);
    }

    /// Run until no work is left.
    #[tracing::instrument(skip_all, fields(workers = self.config.workers, queued = self.queue.len()))]
    pub fn run(self) -> JobReport {
        if self.config.workers == 1 {
            self.work(0);
        } else {
            let this = &self;
            std::thread::scope(|scope| {
                for worker in 0..this.config.workers {
                    scope.spawn(move || this.work(worker));
                }
            });
        }
        self.fail_parked();

        let results = self.results.into_inner();
        let report = JobReport {
            checks_run: self.checks_run.into_inner(),
            suspensions: self.suspensions.into_inner(),
            wakeups: self.wakeups.into_inner(),
            emitted: results.emitted,
            failed: results.failed,
            entry_point: results.entry_point,
        };
        tracing::info!(
            checks = report.checks_run,
            suspensions = report.suspensions,
            emitted = report.emitted.len(),
            failed = report.failed.len(),
            "job system finished"
        );
        report
    }

    fn decl(&self, id: DeclId) -> Option<&'a Decl> {
        match &self.program.decl(id)?.node {
            TopLevel::Decl(decl) => Some(decl),
            TopLevel::Invalid(_) => None,
        }
    }

    fn work(&self, worker: usize) {
        let _span = tracing::debug_span!("worker", worker).entered();
        while let Some(unit) = self.queue.pop() {
            match unit {
                WorkUnit::Check(job) => self.run_check(job),
                WorkUnit::CodeGen(job) => self.run_codegen(job),
            }
            self.queue.finish();
        }
    }

    // ========================================================================
    // Checking
    // ========================================================================

    fn run_check(&self, mut job: CheckerJob) {
        let Some(decl) = self.decl(job.decl) else {
            return;
        };
        let name = &decl.name.node;

        match self.symbols.claim(job.entity, job.executor) {
            Claim::Claimed => tracing::debug!(%name, executor = %job.executor, "claimed"),
            Claim::AlreadyMine => {}
            Claim::Busy(state) => {
                tracing::debug!(%name, %state, "entity not available, dropping job");
                return;
            }
        }

        if job.attempts >= self.config.max_attempts {
            tracing::warn!(%name, attempts = job.attempts, "declaration did not resolve, giving up");
            let diagnostic = errors::attempts_exhausted(name, job.attempts, decl.name.span);
            self.fail_with(job.entity, vec![diagnostic]);
            return;
        }
        job.attempts += 1;
        self.checks_run.fetch_add(1, Ordering::Relaxed);

        let (result, diagnostics) = Checker::new(self.symbols, self.sink).check_decl_collect(decl, job.executor);
        match result.outcome {
            Outcome::Resolved => {
                for diagnostic in diagnostics {
                    self.sink.report(diagnostic);
                }
                self.deps.clear(job.entity);
                self.queue.push(WorkUnit::CodeGen(CodeGenJob {
                    decl: job.decl,
                    entity: job.entity,
                    entry_point: result.entry_point == Some(job.entity),
                }));
            }
            Outcome::Invalid => self.fail_with(job.entity, diagnostics),
            Outcome::Unresolved { waiting_on } => self.suspend(job, waiting_on, decl),
        }
    }

    fn suspend(&self, job: CheckerJob, dep: EntityId, decl: &Decl) {
        self.suspensions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            name = %decl.name.node,
            waiting_on = %self.symbols.entity(dep).name,
            attempts = job.attempts,
            "suspended"
        );

        match self.deps.suspend(self.symbols, job, dep, self.config.suspension) {
            Suspend::Parked => {}
            Suspend::Retry(job) => self.queue.push(WorkUnit::Check(job)),
            Suspend::Cycle(members) => {
                let mut path: Vec<String> = members
                    .iter()
                    .map(|&member| self.symbols.entity(member).name.clone())
                    .collect();
                path.push(decl.name.node.clone());
                self.sink.report(errors::dependency_cycle(&path, decl.name.span));
                for member in members {
                    self.record_failure(member);
                }
            }
            Suspend::Dropped => tracing::debug!(name = %decl.name.node, "entity already settled, dropping job"),
        }
    }

    // ========================================================================
    // Settling
    // ========================================================================

    fn run_codegen(&self, job: CodeGenJob) {
        let Some(decl) = self.decl(job.decl) else {
            return;
        };
        if !self.symbols.advance(job.entity, EntityState::Emitting) {
            tracing::debug!(name = %decl.name.node, "entity settled before emission, dropping job");
            return;
        }
        self.emitter.emit(&self.symbols.entity(job.entity), decl);

        {
            // The lock spans the state change: `emitted` must list dependencies before dependents.
            let mut results = self.results.lock();
            if self.symbols.advance(job.entity, EntityState::Emitted) {
                results.emitted.push(job.entity);
                if job.entry_point {
                    results.entry_point = Some(job.entity);
                }
            }
        }
        tracing::debug!(name = %decl.name.node, "emitted");
        self.wake(job.entity);
    }

    fn fail(&self, entity: EntityId) {
        self.fail_with(entity, Vec::new());
    }

    /// Fail `entity`, reporting `diagnostics` only if this call is what failed it.
    fn fail_with(&self, entity: EntityId, diagnostics: Vec<Diagnostic>) {
        if !self.deps.fail(self.symbols, entity) {
            tracing::debug!(
                name = %self.symbols.entity(entity).name,
                dropped = diagnostics.len(),
                "already settled, dropping diagnostics"
            );
            return;
        }
        for diagnostic in diagnostics {
            self.sink.report(diagnostic);
        }
        self.record_failure(entity);
    }

    /// Bookkeeping for an entity that just moved to `Failed`.
    fn record_failure(&self, entity: EntityId) {
        self.results.lock().failed.push(entity);
        self.wake(entity);
    }

    /// Re-enqueue every job parked on the settled `entity`.
    fn wake(&self, entity: EntityId) {
        let woken = self.deps.settle(entity);
        if woken.is_empty() {
            return;
        }
        tracing::debug!(name = %self.symbols.entity(entity).name, count = woken.len(), "waking waiters");
        self.wakeups.fetch_add(woken.len(), Ordering::Relaxed);
        for job in woken {
            self.queue.push(WorkUnit::Check(job));
        }
    }

    fn fail_parked(&self) {
        for (job, waiting_on) in self.deps.drain_parked() {
            if self.symbols.state(job.entity).is_settled() {
                continue;
            }
            let entity = self.symbols.entity(job.entity);
            let dep = self.symbols.entity(waiting_on);
            tracing::warn!(name = %entity.name, waiting_on = %dep.name, "declaration never resolved");
            self.fail_with(job.entity, vec![errors::never_resolved(&entity.name, &dep.name, entity.span)]);
        }
    }
}
