//! Name resolution and constant propagation for Kestrel.
//!
//! The checker runs once per top-level declaration per invocation, bottom-up, threading a [`Context`] that
//! carries the invalid flag, the first pending dependency, the current scope and the executor running the
//! check. Nested blocks and function bodies reuse the same context with a child scope, so their flags
//! propagate to the enclosing statement.
//!
//! ## Notes
//!
//! - **Outcome**: each run ends [`Outcome::Resolved`], [`Outcome::Unresolved`] (waiting on a top-level entity that
//!   has not settled) or [`Outcome::Invalid`]. An error wins over a pending dependency.
//! - **Error accumulation**: every reachable error in a statement is reported in the same run. Diagnostics of an
//!   unresolved run are discarded; the retry reports them once the statement can be decided.
//! - **Isolation**: one statement never affects another; local scopes are created fresh for every run. The scope
//!   arena is append-only, so every run of a declaration, retries included, adds the scopes of its function bodies
//!   and blocks.
//! - **Mutable top-level entities** are run-time values in every state. Reading one never waits and never forms a
//!   cycle, so `a := b` and `b := a` both resolve.
//!
//! ## What is validated
//!
//! - Every identifier names a declared entity
//! - `::` declarations have constant values, folded with overflow and division checks
//! - Assignments never target constants
//! - Function bodies end with `return`
//! - References to top-level entities respect their resolution state (waiting, cycles, failed dependencies)
//!
//! ## Examples
//!
//! ```rust
//! use kestrel::frontend::checker::{Checker, Outcome};
//! use kestrel::frontend::diagnostics::Diagnostics;
//! use kestrel::frontend::symbols::{ExecutorId, SymbolTable};
//! use kestrel::frontend::{parser, scanner};
//!
//! let source = b"a :: b + 1\nb :: 2\n";
//! let sink = Diagnostics::new();
//! let symbols = SymbolTable::new();
//! let tokens = scanner::scan_all(source, &sink);
//! let program = parser::parse(source, &tokens, &symbols, &sink);
//! let (_, a) = program.decls().next().unwrap();
//!
//! let checker = Checker::new(&symbols, &sink);
//! let result = checker.check_decl(a, ExecutorId(0));
//! assert!(matches!(result.outcome, Outcome::Unresolved { .. }));
//! ```

mod check_expr;
mod check_stmt;
mod const_eval;

pub use const_eval::parse_int_literal;

#[cfg(test)]
mod tests;

use crate::frontend::ast::Decl;
use crate::frontend::diagnostics::{Diagnostic, DiagnosticSink};
use crate::frontend::symbols::{ConstValue, EntityId, ExecutorId, ScopeId, SymbolTable};

/// Result classification of one checker run over a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Valid, and every reference is settled: ready for code generation.
    Resolved,
    /// Valid so far, but depends on an entity that has not settled yet.
    Unresolved { waiting_on: EntityId },
    /// At least one error was reported.
    Invalid,
}

/// Everything a run learned about a top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub outcome: Outcome,
    /// Folded value when the declaration is a resolved constant.
    pub value: Option<ConstValue>,
    /// Set when the declaration is the program entry point (`main :: fn(...) { ... }`).
    pub entry_point: Option<EntityId>,
}

/// Per-run checking state shared by every nested construct of one top-level statement.
struct Context {
    scope: ScopeId,
    executor: ExecutorId,
    invalid: bool,
    waiting_on: Option<EntityId>,
    /// Nesting depth of function literals; `0` at the top level.
    function_depth: usize,
    entry_point: Option<EntityId>,
    diagnostics: Vec<Diagnostic>,
}

impl Context {
    fn new(executor: ExecutorId) -> Self {
        Self {
            scope: ScopeId::GLOBAL,
            executor,
            invalid: false,
            waiting_on: None,
            function_depth: 0,
            entry_point: None,
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, diagnostic: Diagnostic) {
        self.invalid = true;
        self.diagnostics.push(diagnostic);
    }

    fn warn(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Remember the first dependency that has not settled.
    fn wait_on(&mut self, entity: EntityId) {
        self.waiting_on.get_or_insert(entity);
    }

    fn outcome(&self) -> Outcome {
        if self.invalid {
            Outcome::Invalid
        } else if let Some(waiting_on) = self.waiting_on {
            Outcome::Unresolved { waiting_on }
        } else {
            Outcome::Resolved
        }
    }
}

/// Checker over a shared symbol table.
///
/// Stateless between runs, so one instance can serve every worker thread.
pub struct Checker<'a> {
    symbols: &'a SymbolTable,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> Checker<'a> {
    pub fn new(symbols: &'a SymbolTable, sink: &'a dyn DiagnosticSink) -> Self {
        Self { symbols, sink }
    }

    /// Check one top-level declaration on behalf of `executor`.
    ///
    /// The caller is expected to have claimed `decl.entity` for `executor`, so self references are recognized as
    /// cycles. Diagnostics reach the sink only when the run is decided (resolved or invalid).
    pub fn check_decl(&self, decl: &Decl, executor: ExecutorId) -> CheckResult {
        let (result, diagnostics) = self.check_decl_collect(decl, executor);
        for diagnostic in diagnostics {
            self.sink.report(diagnostic);
        }
        result
    }

    /// Like [`Checker::check_decl`], but hands the diagnostics of a decided run back instead of reporting them.
    ///
    /// The diagnostics of an unresolved run are discarded, so the returned list is empty in that case.
    pub fn check_decl_collect(&self, decl: &Decl, executor: ExecutorId) -> (CheckResult, Vec<Diagnostic>) {
        let mut ctx = Context::new(executor);
        let value = self.check_top_level_decl(decl, &mut ctx);
        let outcome = ctx.outcome();

        let mut diagnostics = std::mem::take(&mut ctx.diagnostics);
        if matches!(outcome, Outcome::Unresolved { .. }) {
            tracing::trace!(name = %decl.name.node, dropped = diagnostics.len(), "unresolved, deferring diagnostics");
            diagnostics.clear();
        }

        let value = match outcome {
            Outcome::Resolved => value,
            _ => None,
        };
        if let Some(value) = value {
            if decl.constant {
                self.symbols.set_value(decl.entity, value);
            }
        }

        let result = CheckResult {
            outcome,
            value,
            entry_point: if outcome == Outcome::Resolved { ctx.entry_point } else { None },
        };
        (result, diagnostics)
    }
}
