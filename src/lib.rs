#![forbid(unsafe_code)]
//! Kestrel compiler frontend
//!
//! Kestrel is a small language whose top-level declarations may refer to each other in any order. This crate
//! provides the frontend: scanner, parser, checker (name resolution and constant folding), and a job system
//! that resolves forward references by suspending and retrying checks, on one thread or several.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. Problems in the source are
//!   [`Diagnostic`](frontend::diagnostics::Diagnostic) values, never panics. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: handles (`EntityId`, `ScopeId`) come from the table that resolves them; looking one
//!   up in a different table is a bug and panics.

pub mod cli;
pub mod driver;
pub mod frontend;
pub mod jobs;

pub use frontend::ast;
pub use frontend::checker;
pub use frontend::diagnostics;
pub use frontend::parser;
pub use frontend::scanner;
pub use frontend::symbols;

pub use driver::{Compilation, CompileConfig, compile};
pub use jobs::{JobConfig, JobReport, JobSystem, Suspension};
